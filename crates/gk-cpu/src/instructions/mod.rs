//! Gekko instruction implementations
//!
//! Every operation is a free function over the register file (and a [`Bus`]
//! when it touches memory) returning an [`ExecResult`]. An operation that
//! fails or reports [`Flow::Invalid`] has not mutated the register file.
//!
//! [`Bus`]: crate::bus::Bus

pub mod branch;
pub mod float;
pub mod integer;
pub mod load_store;
pub mod system;

use gk_core::error::CpuError;

use crate::decoder::Instruction;
use crate::registers::RegisterFile;

/// How the program counter moves after an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Fall through to the next instruction
    Next,
    /// Continue at an explicit target
    Jump(u32),
    /// Recognized encoding that cannot be executed; nothing was changed
    Invalid,
}

/// Result of one operation
pub type ExecResult = Result<Flow, CpuError>;

/// Effective address computation of a load or store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// `(rA|0) + d`
    Displacement,
    /// `rA + d`, EA written back to rA
    DisplacementUpdate,
    /// `(rA|0) + rB`
    Indexed,
    /// `rA + rB`, EA written back to rA
    IndexedUpdate,
}

impl Addressing {
    #[inline]
    pub fn is_update(self) -> bool {
        matches!(self, Addressing::DisplacementUpdate | Addressing::IndexedUpdate)
    }

    /// Effective address of `inst` under this mode
    #[inline]
    pub fn effective_address(self, regs: &RegisterFile, inst: Instruction) -> u32 {
        match self {
            Addressing::Displacement => regs.gpr_or_zero(inst.ra()).wrapping_add(inst.d() as u32),
            Addressing::DisplacementUpdate => regs.gpr(inst.ra()).wrapping_add(inst.d() as u32),
            Addressing::Indexed => regs.gpr_or_zero(inst.ra()).wrapping_add(regs.gpr(inst.rb())),
            Addressing::IndexedUpdate => regs.gpr(inst.ra()).wrapping_add(regs.gpr(inst.rb())),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Encoders for the unit tests of the execution units

    pub fn d_form(op: u32, rt: u32, ra: u32, d: i16) -> u32 {
        (op << 26) | (rt << 21) | (ra << 16) | (d as u16 as u32)
    }

    pub fn x_form(op: u32, rt: u32, ra: u32, rb: u32, xo: u32, rc: bool) -> u32 {
        (op << 26) | (rt << 21) | (ra << 16) | (rb << 11) | (xo << 1) | rc as u32
    }

    pub fn xo_form(rt: u32, ra: u32, rb: u32, oe: bool, xo: u32, rc: bool) -> u32 {
        (31 << 26) | (rt << 21) | (ra << 16) | (rb << 11) | ((oe as u32) << 10) | (xo << 1) | rc as u32
    }

    pub fn a_form(op: u32, frt: u32, fra: u32, frb: u32, frc: u32, xo: u32, rc: bool) -> u32 {
        (op << 26) | (frt << 21) | (fra << 16) | (frb << 11) | (frc << 6) | (xo << 1) | rc as u32
    }
}
