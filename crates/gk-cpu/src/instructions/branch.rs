//! Branch and condition register logic instructions
//!
//! Targets are computed from the pre-instruction LR/CTR, so `blrl` and
//! `bcctrl` branch to the old value before the link overwrites it.

use crate::decoder::Instruction;
use crate::instructions::{ExecResult, Flow};
use crate::registers::RegisterFile;

/// BO bit: ignore the condition
const BO_IGNORE_CR: u8 = 0x10;
/// BO bit: the value the condition bit must have
const BO_CR_VALUE: u8 = 0x08;
/// BO bit: do not decrement CTR
const BO_IGNORE_CTR: u8 = 0x04;
/// BO bit: branch when CTR reaches zero (rather than when it is non-zero)
const BO_CTR_ZERO: u8 = 0x02;

/// Evaluate BO/BI, decrementing CTR when BO asks for it
///
/// CTR is decremented exactly once per call, whether or not the branch is taken.
fn condition_holds(regs: &mut RegisterFile, bo: u8, bi: usize) -> bool {
    let ctr_ok = if bo & BO_IGNORE_CTR != 0 {
        true
    } else {
        regs.ctr = regs.ctr.wrapping_sub(1);
        (regs.ctr != 0) != (bo & BO_CTR_ZERO != 0)
    };

    let cond_ok = bo & BO_IGNORE_CR != 0 || regs.cr_bit(bi) == (bo & BO_CR_VALUE != 0);

    ctr_ok && cond_ok
}

#[inline]
fn link(regs: &mut RegisterFile, inst: Instruction) {
    if inst.lk() {
        regs.lr = regs.pc.wrapping_add(4);
    }
}

/// `b`, `ba`, `bl`, `bla`
pub fn b(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let target = if inst.aa() {
        inst.li() as u32
    } else {
        regs.pc.wrapping_add(inst.li() as u32)
    };
    link(regs, inst);
    Ok(Flow::Jump(target))
}

/// `bc`, `bca`, `bcl`, `bcla`
pub fn bc(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let target = if inst.aa() {
        inst.bd() as u32
    } else {
        regs.pc.wrapping_add(inst.bd() as u32)
    };
    let taken = condition_holds(regs, inst.bo(), inst.bi());
    link(regs, inst);
    Ok(if taken { Flow::Jump(target) } else { Flow::Next })
}

/// `bclr`, `bclrl`
pub fn bclr(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let target = regs.lr & !3;
    let taken = condition_holds(regs, inst.bo(), inst.bi());
    link(regs, inst);
    Ok(if taken { Flow::Jump(target) } else { Flow::Next })
}

/// `bcctr`, `bcctrl`; decrementing CTR while branching to it is an invalid form
pub fn bcctr(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    if inst.bo() & BO_IGNORE_CTR == 0 {
        return Ok(Flow::Invalid);
    }
    let target = regs.ctr & !3;
    let taken = condition_holds(regs, inst.bo(), inst.bi());
    link(regs, inst);
    Ok(if taken { Flow::Jump(target) } else { Flow::Next })
}

/// Condition register logical operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrLogic {
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Andc,
    Orc,
    Eqv,
}

impl CrLogic {
    #[inline]
    fn apply(self, a: bool, b: bool) -> bool {
        match self {
            CrLogic::And => a & b,
            CrLogic::Or => a | b,
            CrLogic::Xor => a ^ b,
            CrLogic::Nand => !(a & b),
            CrLogic::Nor => !(a | b),
            CrLogic::Andc => a & !b,
            CrLogic::Orc => a | !b,
            CrLogic::Eqv => a == b,
        }
    }
}

/// `crand`, `cror`, `crxor`, `crnand`, `crnor`, `crandc`, `crorc`, `creqv`
pub fn cr_logic(regs: &mut RegisterFile, inst: Instruction, op: CrLogic) -> ExecResult {
    let value = op.apply(regs.cr_bit(inst.crba()), regs.cr_bit(inst.crbb()));
    regs.set_cr_bit(inst.crbd(), value);
    Ok(Flow::Next)
}

pub fn mcrf(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let value = regs.cr_field(inst.crfs());
    regs.set_cr_field(inst.crfd(), value);
    Ok(Flow::Next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bc_form(bo: u32, bi: u32, bd: i16, aa: bool, lk: bool) -> Instruction {
        Instruction((16 << 26) | (bo << 21) | (bi << 16) | (bd as u16 as u32 & 0xFFFC) | ((aa as u32) << 1) | lk as u32)
    }

    fn xl_form(bo: u32, bi: u32, xo: u32, lk: bool) -> Instruction {
        Instruction((19 << 26) | (bo << 21) | (bi << 16) | (xo << 1) | lk as u32)
    }

    #[test]
    fn test_bl_links_and_jumps() {
        let mut regs = RegisterFile::new(0x1000);
        // bl +0x20
        let flow = b(&mut regs, Instruction(0x48000021)).unwrap();
        assert_eq!(flow, Flow::Jump(0x1020));
        assert_eq!(regs.lr, 0x1004);
    }

    #[test]
    fn test_branch_absolute_and_backward() {
        let mut regs = RegisterFile::new(0x8000_1000);
        // ba 0x100
        assert_eq!(b(&mut regs, Instruction(0x48000102)).unwrap(), Flow::Jump(0x100));
        // b -4
        assert_eq!(b(&mut regs, Instruction(0x4BFFFFFC)).unwrap(), Flow::Jump(0x8000_0FFC));
        assert_eq!(regs.lr, 0);
    }

    #[test]
    fn test_bdnz_decrements_once_taken_and_not_taken() {
        // bdnz -8: BO = 16
        let inst = bc_form(16, 0, -8, false, false);

        let mut regs = RegisterFile::new(0x8000_0100);
        regs.ctr = 2;
        assert_eq!(bc(&mut regs, inst).unwrap(), Flow::Jump(0x8000_00F8));
        assert_eq!(regs.ctr, 1);

        assert_eq!(bc(&mut regs, inst).unwrap(), Flow::Next);
        assert_eq!(regs.ctr, 0);
    }

    #[test]
    fn test_bdz_wraps_ctr() {
        // bdz +8: BO = 18
        let inst = bc_form(18, 0, 8, false, false);
        let mut regs = RegisterFile::new(0x100);
        regs.ctr = 0;
        assert_eq!(bc(&mut regs, inst).unwrap(), Flow::Next);
        assert_eq!(regs.ctr, 0xFFFF_FFFF);
    }

    #[test]
    fn test_bc_condition() {
        let mut regs = RegisterFile::new(0x200);
        regs.set_cr_field(0, 0b0010);

        // beq +0x10 (BO = 12, BI = 2)
        assert_eq!(bc(&mut regs, bc_form(12, 2, 0x10, false, false)).unwrap(), Flow::Jump(0x210));
        // bne +0x10 (BO = 4, BI = 2)
        assert_eq!(bc(&mut regs, bc_form(4, 2, 0x10, false, false)).unwrap(), Flow::Next);
        // CTR untouched by either
        assert_eq!(regs.ctr, 0);
    }

    #[test]
    fn test_bcl_links_when_not_taken() {
        let mut regs = RegisterFile::new(0x300);
        // bnel +0x40 with EQ set: not taken, LR still written
        regs.set_cr_field(0, 0b0010);
        assert_eq!(bc(&mut regs, bc_form(4, 2, 0x40, false, true)).unwrap(), Flow::Next);
        assert_eq!(regs.lr, 0x304);
    }

    #[test]
    fn test_blrl_uses_old_lr() {
        let mut regs = RegisterFile::new(0x8000_2000);
        regs.lr = 0x8000_3001;
        // blrl
        let flow = bclr(&mut regs, xl_form(20, 0, 16, true)).unwrap();
        assert_eq!(flow, Flow::Jump(0x8000_3000));
        assert_eq!(regs.lr, 0x8000_2004);
    }

    #[test]
    fn test_bcctr() {
        let mut regs = RegisterFile::new(0x8000_2000);
        regs.ctr = 0x8000_4000;
        // bctrl
        assert_eq!(bcctr(&mut regs, xl_form(20, 0, 528, true)).unwrap(), Flow::Jump(0x8000_4000));
        assert_eq!(regs.lr, 0x8000_2004);
        assert_eq!(regs.ctr, 0x8000_4000);
    }

    #[test]
    fn test_bcctr_with_decrement_is_invalid() {
        let mut regs = RegisterFile::new(0x8000_2000);
        regs.ctr = 5;
        let before = regs.clone();
        // BO = 16 asks to decrement CTR
        assert_eq!(bcctr(&mut regs, xl_form(16, 0, 528, true)).unwrap(), Flow::Invalid);
        assert_eq!(regs, before);
    }

    #[test]
    fn test_cr_logic() {
        let mut regs = RegisterFile::default();
        regs.set_cr_bit(0, true);
        regs.set_cr_bit(1, false);

        let form = |d: u32, a: u32, b: u32| Instruction((19 << 26) | (d << 21) | (a << 16) | (b << 11));

        cr_logic(&mut regs, form(4, 0, 1), CrLogic::Or).unwrap();
        assert!(regs.cr_bit(4));
        cr_logic(&mut regs, form(5, 0, 1), CrLogic::And).unwrap();
        assert!(!regs.cr_bit(5));
        cr_logic(&mut regs, form(6, 0, 1), CrLogic::Xor).unwrap();
        assert!(regs.cr_bit(6));
        cr_logic(&mut regs, form(7, 0, 0), CrLogic::Nand).unwrap();
        assert!(!regs.cr_bit(7));
        cr_logic(&mut regs, form(8, 1, 1), CrLogic::Nor).unwrap();
        assert!(regs.cr_bit(8));
        cr_logic(&mut regs, form(9, 0, 1), CrLogic::Andc).unwrap();
        assert!(regs.cr_bit(9));
        cr_logic(&mut regs, form(10, 1, 0), CrLogic::Orc).unwrap();
        assert!(!regs.cr_bit(10));
        // crset: creqv b, b, b
        cr_logic(&mut regs, form(11, 11, 11), CrLogic::Eqv).unwrap();
        assert!(regs.cr_bit(11));
    }

    #[test]
    fn test_mcrf() {
        let mut regs = RegisterFile::default();
        regs.set_cr_field(6, 0b1010);
        // mcrf cr2, cr6
        mcrf(&mut regs, Instruction((19 << 26) | (2 << 23) | (6 << 18))).unwrap();
        assert_eq!(regs.cr_field(2), 0b1010);
    }
}
