//! Fixed-point arithmetic, logic, compare, rotate and register moves
//!
//! All arithmetic is modulo 2^32. Carry and overflow are derived from the
//! infinite-precision result of [`add3`], which every add/subtract form uses.

use crate::decoder::Instruction;
use crate::instructions::{system, ExecResult, Flow};
use crate::registers::{spr, RegisterFile};

/// Three-input adder: `a + b + carry_in`
///
/// Returns the 32-bit result, the carry out of bit 0 and the signed overflow.
#[inline]
pub fn add3(a: u32, b: u32, carry_in: bool) -> (u32, bool, bool) {
    let wide = a as u64 + b as u64 + carry_in as u64;
    let signed = a as i32 as i64 + b as i32 as i64 + carry_in as i64;
    let result = wide as u32;
    (result, wide > u32::MAX as u64, signed != result as i32 as i64)
}

/// Generate 32-bit mask for rotate instructions
#[inline]
pub fn generate_mask_32(mb: u32, me: u32) -> u32 {
    if mb <= me {
        (u32::MAX >> mb) & (u32::MAX << (31 - me))
    } else {
        (u32::MAX >> mb) | (u32::MAX << (31 - me))
    }
}

/// CR field value for an ordered comparison
#[inline]
fn compare_field<T: Ord>(a: T, b: T, so: bool) -> u32 {
    let c = match a.cmp(&b) {
        std::cmp::Ordering::Less => 0b1000,
        std::cmp::Ordering::Greater => 0b0100,
        std::cmp::Ordering::Equal => 0b0010,
    };
    c | so as u32
}

/// Write an XO-form result, then OV/SO (when OE) and CR0 (when Rc)
#[inline]
fn finish_xo(regs: &mut RegisterFile, inst: Instruction, result: u32, overflow: bool) -> ExecResult {
    regs.set_gpr(inst.rd(), result);
    if inst.oe() {
        regs.set_xer_ov(overflow);
    }
    if inst.rc() {
        regs.update_cr0(result);
    }
    Ok(Flow::Next)
}

/// Same as [`finish_xo`] for forms that also produce a carry
#[inline]
fn finish_xo_carry(
    regs: &mut RegisterFile,
    inst: Instruction,
    (result, carry, overflow): (u32, bool, bool),
) -> ExecResult {
    regs.set_xer_ca(carry);
    finish_xo(regs, inst, result, overflow)
}

/// Write a logical result to rA, recording CR0 when Rc is set
#[inline]
fn finish_logical(regs: &mut RegisterFile, inst: Instruction, result: u32) -> ExecResult {
    regs.set_gpr(inst.ra(), result);
    if inst.rc() {
        regs.update_cr0(result);
    }
    Ok(Flow::Next)
}

// ===== Add / subtract =====

pub fn add(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let (result, _, overflow) = add3(regs.gpr(inst.ra()), regs.gpr(inst.rb()), false);
    finish_xo(regs, inst, result, overflow)
}

pub fn addc(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let sum = add3(regs.gpr(inst.ra()), regs.gpr(inst.rb()), false);
    finish_xo_carry(regs, inst, sum)
}

pub fn adde(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let sum = add3(regs.gpr(inst.ra()), regs.gpr(inst.rb()), regs.xer_ca());
    finish_xo_carry(regs, inst, sum)
}

pub fn addme(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let sum = add3(regs.gpr(inst.ra()), u32::MAX, regs.xer_ca());
    finish_xo_carry(regs, inst, sum)
}

pub fn addze(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let sum = add3(regs.gpr(inst.ra()), 0, regs.xer_ca());
    finish_xo_carry(regs, inst, sum)
}

pub fn subf(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let (result, _, overflow) = add3(!regs.gpr(inst.ra()), regs.gpr(inst.rb()), true);
    finish_xo(regs, inst, result, overflow)
}

pub fn subfc(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let sum = add3(!regs.gpr(inst.ra()), regs.gpr(inst.rb()), true);
    finish_xo_carry(regs, inst, sum)
}

pub fn subfe(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let sum = add3(!regs.gpr(inst.ra()), regs.gpr(inst.rb()), regs.xer_ca());
    finish_xo_carry(regs, inst, sum)
}

pub fn subfme(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let sum = add3(!regs.gpr(inst.ra()), u32::MAX, regs.xer_ca());
    finish_xo_carry(regs, inst, sum)
}

pub fn subfze(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let sum = add3(!regs.gpr(inst.ra()), 0, regs.xer_ca());
    finish_xo_carry(regs, inst, sum)
}

pub fn neg(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let (result, _, overflow) = add3(!regs.gpr(inst.ra()), 0, true);
    finish_xo(regs, inst, result, overflow)
}

pub fn addi(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let value = regs.gpr_or_zero(inst.ra()).wrapping_add(inst.d() as u32);
    regs.set_gpr(inst.rd(), value);
    Ok(Flow::Next)
}

pub fn addis(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let value = regs.gpr_or_zero(inst.ra()).wrapping_add(inst.uimm() << 16);
    regs.set_gpr(inst.rd(), value);
    Ok(Flow::Next)
}

/// `addic` and `addic.`
pub fn addic(regs: &mut RegisterFile, inst: Instruction, record: bool) -> ExecResult {
    let (result, carry, _) = add3(regs.gpr(inst.ra()), inst.d() as u32, false);
    regs.set_gpr(inst.rd(), result);
    regs.set_xer_ca(carry);
    if record {
        regs.update_cr0(result);
    }
    Ok(Flow::Next)
}

pub fn subfic(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let (result, carry, _) = add3(!regs.gpr(inst.ra()), inst.d() as u32, true);
    regs.set_gpr(inst.rd(), result);
    regs.set_xer_ca(carry);
    Ok(Flow::Next)
}

// ===== Multiply / divide =====

pub fn mulli(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let value = (regs.gpr(inst.ra()) as i32).wrapping_mul(inst.d());
    regs.set_gpr(inst.rd(), value as u32);
    Ok(Flow::Next)
}

pub fn mullw(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let product = regs.gpr(inst.ra()) as i32 as i64 * regs.gpr(inst.rb()) as i32 as i64;
    let result = product as u32;
    finish_xo(regs, inst, result, product != result as i32 as i64)
}

pub fn mulhw(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let product = regs.gpr(inst.ra()) as i32 as i64 * regs.gpr(inst.rb()) as i32 as i64;
    let result = (product >> 32) as u32;
    regs.set_gpr(inst.rd(), result);
    if inst.rc() {
        regs.update_cr0(result);
    }
    Ok(Flow::Next)
}

pub fn mulhwu(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let product = regs.gpr(inst.ra()) as u64 * regs.gpr(inst.rb()) as u64;
    let result = (product >> 32) as u32;
    regs.set_gpr(inst.rd(), result);
    if inst.rc() {
        regs.update_cr0(result);
    }
    Ok(Flow::Next)
}

/// Signed divide; division by zero and `i32::MIN / -1` yield 0 with overflow
pub fn divw(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let a = regs.gpr(inst.ra()) as i32;
    let b = regs.gpr(inst.rb()) as i32;
    match a.checked_div(b) {
        Some(quotient) => finish_xo(regs, inst, quotient as u32, false),
        None => finish_xo(regs, inst, 0, true),
    }
}

/// Unsigned divide; division by zero yields 0 with overflow
pub fn divwu(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let a = regs.gpr(inst.ra());
    let b = regs.gpr(inst.rb());
    match a.checked_div(b) {
        Some(quotient) => finish_xo(regs, inst, quotient, false),
        None => finish_xo(regs, inst, 0, true),
    }
}

// ===== Logical =====

pub fn and(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let result = regs.gpr(inst.rs()) & regs.gpr(inst.rb());
    finish_logical(regs, inst, result)
}

pub fn andc(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let result = regs.gpr(inst.rs()) & !regs.gpr(inst.rb());
    finish_logical(regs, inst, result)
}

pub fn or(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let result = regs.gpr(inst.rs()) | regs.gpr(inst.rb());
    finish_logical(regs, inst, result)
}

pub fn orc(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let result = regs.gpr(inst.rs()) | !regs.gpr(inst.rb());
    finish_logical(regs, inst, result)
}

pub fn xor(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let result = regs.gpr(inst.rs()) ^ regs.gpr(inst.rb());
    finish_logical(regs, inst, result)
}

pub fn nand(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let result = !(regs.gpr(inst.rs()) & regs.gpr(inst.rb()));
    finish_logical(regs, inst, result)
}

pub fn nor(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let result = !(regs.gpr(inst.rs()) | regs.gpr(inst.rb()));
    finish_logical(regs, inst, result)
}

pub fn eqv(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let result = !(regs.gpr(inst.rs()) ^ regs.gpr(inst.rb()));
    finish_logical(regs, inst, result)
}

pub fn andi_rc(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let result = regs.gpr(inst.rs()) & inst.uimm();
    regs.set_gpr(inst.ra(), result);
    regs.update_cr0(result);
    Ok(Flow::Next)
}

pub fn andis_rc(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let result = regs.gpr(inst.rs()) & (inst.uimm() << 16);
    regs.set_gpr(inst.ra(), result);
    regs.update_cr0(result);
    Ok(Flow::Next)
}

pub fn ori(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    regs.set_gpr(inst.ra(), regs.gpr(inst.rs()) | inst.uimm());
    Ok(Flow::Next)
}

pub fn oris(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    regs.set_gpr(inst.ra(), regs.gpr(inst.rs()) | (inst.uimm() << 16));
    Ok(Flow::Next)
}

pub fn xori(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    regs.set_gpr(inst.ra(), regs.gpr(inst.rs()) ^ inst.uimm());
    Ok(Flow::Next)
}

pub fn xoris(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    regs.set_gpr(inst.ra(), regs.gpr(inst.rs()) ^ (inst.uimm() << 16));
    Ok(Flow::Next)
}

pub fn cntlzw(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let result = regs.gpr(inst.rs()).leading_zeros();
    finish_logical(regs, inst, result)
}

pub fn extsb(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let result = regs.gpr(inst.rs()) as i8 as i32 as u32;
    finish_logical(regs, inst, result)
}

pub fn extsh(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let result = regs.gpr(inst.rs()) as i16 as i32 as u32;
    finish_logical(regs, inst, result)
}

// ===== Compare =====
// The L bit selects 64-bit comparisons, which a 32-bit core does not have;
// it is ignored.

pub fn cmp(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let a = regs.gpr(inst.ra()) as i32;
    let b = regs.gpr(inst.rb()) as i32;
    regs.set_cr_field(inst.crfd(), compare_field(a, b, regs.xer_so()));
    Ok(Flow::Next)
}

pub fn cmpi(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let a = regs.gpr(inst.ra()) as i32;
    regs.set_cr_field(inst.crfd(), compare_field(a, inst.d(), regs.xer_so()));
    Ok(Flow::Next)
}

pub fn cmpl(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let a = regs.gpr(inst.ra());
    let b = regs.gpr(inst.rb());
    regs.set_cr_field(inst.crfd(), compare_field(a, b, regs.xer_so()));
    Ok(Flow::Next)
}

pub fn cmpli(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let a = regs.gpr(inst.ra());
    regs.set_cr_field(inst.crfd(), compare_field(a, inst.uimm(), regs.xer_so()));
    Ok(Flow::Next)
}

// ===== Shift / rotate =====

pub fn slw(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let n = regs.gpr(inst.rb()) & 0x3F;
    let result = if n & 0x20 != 0 { 0 } else { regs.gpr(inst.rs()) << n };
    finish_logical(regs, inst, result)
}

pub fn srw(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let n = regs.gpr(inst.rb()) & 0x3F;
    let result = if n & 0x20 != 0 { 0 } else { regs.gpr(inst.rs()) >> n };
    finish_logical(regs, inst, result)
}

/// Arithmetic right shift; CA is set when a negative value loses 1 bits
#[inline]
fn shift_right_algebraic(value: u32, n: u32) -> (u32, bool) {
    let negative = (value as i32) < 0;
    if n >= 32 {
        (if negative { u32::MAX } else { 0 }, negative)
    } else {
        let result = ((value as i32) >> n) as u32;
        let lost = n != 0 && value & (u32::MAX >> (32 - n)) != 0;
        (result, negative && lost)
    }
}

pub fn sraw(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let n = regs.gpr(inst.rb()) & 0x3F;
    let (result, carry) = shift_right_algebraic(regs.gpr(inst.rs()), n);
    regs.set_xer_ca(carry);
    finish_logical(regs, inst, result)
}

pub fn srawi(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let (result, carry) = shift_right_algebraic(regs.gpr(inst.rs()), inst.sh());
    regs.set_xer_ca(carry);
    finish_logical(regs, inst, result)
}

pub fn rlwinm(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let rotated = regs.gpr(inst.rs()).rotate_left(inst.sh());
    let result = rotated & generate_mask_32(inst.mb(), inst.me());
    finish_logical(regs, inst, result)
}

pub fn rlwnm(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let rotated = regs.gpr(inst.rs()).rotate_left(regs.gpr(inst.rb()) & 0x1F);
    let result = rotated & generate_mask_32(inst.mb(), inst.me());
    finish_logical(regs, inst, result)
}

pub fn rlwimi(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let mask = generate_mask_32(inst.mb(), inst.me());
    let rotated = regs.gpr(inst.rs()).rotate_left(inst.sh());
    let result = (rotated & mask) | (regs.gpr(inst.ra()) & !mask);
    finish_logical(regs, inst, result)
}

// ===== Condition register / SPR moves =====

pub fn mfcr(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    regs.set_gpr(inst.rd(), regs.cr);
    Ok(Flow::Next)
}

pub fn mtcrf(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let crm = inst.crm();
    let mut mask = 0u32;
    for field in 0..8u32 {
        if crm & (0x80 >> field) != 0 {
            mask |= 0xF << (28 - field * 4);
        }
    }
    regs.cr = (regs.cr & !mask) | (regs.gpr(inst.rs()) & mask);
    Ok(Flow::Next)
}

pub fn mcrxr(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    regs.set_cr_field(inst.crfd(), regs.xer >> 28);
    regs.xer &= 0x0FFF_FFFF;
    Ok(Flow::Next)
}

pub fn mfspr(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let value = regs.read_spr(inst.spr());
    regs.set_gpr(inst.rd(), value);
    Ok(Flow::Next)
}

/// Move to SPR; writes to the time base and PVR are not supported
pub fn mtspr(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let id = inst.spr();
    if spr::is_read_only(id) {
        return Ok(Flow::Invalid);
    }
    regs.write_spr(id, regs.gpr(inst.rs()));
    Ok(Flow::Next)
}

pub fn mftb(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    match inst.tbr() {
        spr::TBL | spr::TBU => {
            let value = regs.read_spr(inst.tbr());
            regs.set_gpr(inst.rd(), value);
            Ok(Flow::Next)
        }
        _ => Ok(Flow::Invalid),
    }
}

// ===== Trap =====

/// True when any condition selected by `to` holds between `a` and `b`
#[inline]
fn trap_condition(to: u32, a: u32, b: u32) -> bool {
    let (sa, sb) = (a as i32, b as i32);
    (to & 0x10 != 0 && sa < sb)
        || (to & 0x08 != 0 && sa > sb)
        || (to & 0x04 != 0 && a == b)
        || (to & 0x02 != 0 && a < b)
        || (to & 0x01 != 0 && a > b)
}

pub fn tw(regs: &mut RegisterFile, inst: Instruction, exception_base: u32) -> ExecResult {
    if trap_condition(inst.to(), regs.gpr(inst.ra()), regs.gpr(inst.rb())) {
        return Ok(system::trap(regs, exception_base));
    }
    Ok(Flow::Next)
}

pub fn twi(regs: &mut RegisterFile, inst: Instruction, exception_base: u32) -> ExecResult {
    if trap_condition(inst.to(), regs.gpr(inst.ra()), inst.d() as u32) {
        return Ok(system::trap(regs, exception_base));
    }
    Ok(Flow::Next)
}
