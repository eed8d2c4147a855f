//! Floating-point arithmetic, conversion, compare and FPSCR instructions
//!
//! NaN operands propagate in frA, frB, frC order and come out quieted;
//! invalid operations without a NaN operand produce the default QNaN. The
//! FPSCR exception bits are sticky, FX is set on every 0 -> 1 transition of
//! an exception bit, and VX/FEX are recomputed after every change.

use crate::decoder::Instruction;
use crate::instructions::{ExecResult, Flow};
use crate::registers::{Fpscr, RegisterFile};

/// Default quiet NaN
const DEFAULT_QNAN: u64 = 0x7FF8_0000_0000_0000;
/// Quiet bit of a double NaN
const QUIET_BIT: u64 = 0x0008_0000_0000_0000;
/// High word written by `fctiw[z]` and `mffs`
const INTEGER_RESULT_HIGH: u64 = 0xFFF8_0000_0000_0000;

/// Result precision of an arithmetic instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Double,
    Single,
}

/// Rounding mode selected by FPSCR[RN]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingMode {
    Nearest,
    TowardZero,
    TowardPositive,
    TowardNegative,
}

impl RoundingMode {
    pub fn from_fpscr(fpscr: u32) -> Self {
        match fpscr & Fpscr::RN.bits() {
            0 => RoundingMode::Nearest,
            1 => RoundingMode::TowardZero,
            2 => RoundingMode::TowardPositive,
            _ => RoundingMode::TowardNegative,
        }
    }

    fn round(self, value: f64) -> f64 {
        match self {
            RoundingMode::Nearest => value.round_ties_even(),
            RoundingMode::TowardZero => value.trunc(),
            RoundingMode::TowardPositive => value.ceil(),
            RoundingMode::TowardNegative => value.floor(),
        }
    }
}

#[inline]
pub fn is_snan(value: f64) -> bool {
    value.is_nan() && value.to_bits() & QUIET_BIT == 0
}

/// Round a double to single precision, keeping NaN payloads
pub fn round_to_single(value: f64) -> f64 {
    if value.is_nan() {
        f64::from_bits(value.to_bits() & 0xFFFF_FFFF_E000_0000)
    } else {
        value as f32 as f64
    }
}

/// Expand single-precision bits to double-precision bits (`lfs`)
///
/// Exact for every input; NaNs keep their payload and stay signaling.
pub fn single_to_double(bits: u32) -> u64 {
    let value = f32::from_bits(bits);
    if value.is_nan() {
        let sign = (bits as u64 & 0x8000_0000) << 32;
        let mantissa = (bits as u64 & 0x007F_FFFF) << 29;
        sign | 0x7FF0_0000_0000_0000 | mantissa
    } else {
        (value as f64).to_bits()
    }
}

/// Narrow double-precision bits to single-precision bits (`stfs`)
pub fn double_to_single(bits: u64) -> u32 {
    let value = f64::from_bits(bits);
    if value.is_nan() {
        let sign = ((bits >> 32) & 0x8000_0000) as u32;
        let mantissa = ((bits >> 29) & 0x007F_FFFF) as u32;
        sign | 0x7F80_0000 | mantissa
    } else {
        (value as f32).to_bits()
    }
}

/// FPRF class bits (C, FL, FG, FE, FU) of a result
pub fn result_class(value: f64, precision: Precision) -> u32 {
    use std::num::FpCategory;

    let category = match precision {
        Precision::Double => value.classify(),
        Precision::Single => (value as f32).classify(),
    };
    let negative = value.is_sign_negative();
    match (category, negative) {
        (FpCategory::Nan, _) => 0b10001,
        (FpCategory::Infinite, true) => 0b01001,
        (FpCategory::Infinite, false) => 0b00101,
        (FpCategory::Normal, true) => 0b01000,
        (FpCategory::Normal, false) => 0b00100,
        (FpCategory::Subnormal, true) => 0b11000,
        (FpCategory::Subnormal, false) => 0b10100,
        (FpCategory::Zero, true) => 0b10010,
        (FpCategory::Zero, false) => 0b00010,
    }
}

/// Recompute the VX and FEX summary bits
fn refresh_summaries(regs: &mut RegisterFile) {
    let mut flags = regs.fpscr_flags();
    flags.set(Fpscr::VX, flags.intersects(Fpscr::VX_ANY));
    let enabled = (flags.contains(Fpscr::VX) && flags.contains(Fpscr::VE))
        || (flags.contains(Fpscr::OX) && flags.contains(Fpscr::OE))
        || (flags.contains(Fpscr::UX) && flags.contains(Fpscr::UE))
        || (flags.contains(Fpscr::ZX) && flags.contains(Fpscr::ZE))
        || (flags.contains(Fpscr::XX) && flags.contains(Fpscr::XE));
    flags.set(Fpscr::FEX, enabled);
    regs.set_fpscr_flags(flags);
}

/// Set FPSCR bits, raising FX for newly set exception bits
pub fn raise(regs: &mut RegisterFile, flags: Fpscr) {
    let old = regs.fpscr_flags();
    let mut new = old | flags;
    if !(flags & Fpscr::EXCEPTIONS).difference(old).is_empty() {
        new |= Fpscr::FX;
    }
    regs.set_fpscr_flags(new);
    refresh_summaries(regs);
}

fn set_fprf(regs: &mut RegisterFile, value: f64, precision: Precision) {
    let mut flags = regs.fpscr_flags();
    flags.remove(Fpscr::FPRF);
    flags |= Fpscr::from_bits_retain(result_class(value, precision) << 12);
    regs.set_fpscr_flags(flags);
}

/// Apply the NaN and invalid-operation rules around `op`
///
/// `op` returns the computed value and the exception bits it detected.
fn evaluate(regs: &mut RegisterFile, operands: &[f64], op: impl FnOnce() -> (f64, Fpscr)) -> f64 {
    if operands.iter().any(|&x| is_snan(x)) {
        raise(regs, Fpscr::VXSNAN);
    }
    if let Some(nan) = operands.iter().find(|x| x.is_nan()) {
        return f64::from_bits(nan.to_bits() | QUIET_BIT);
    }

    let (value, exceptions) = op();
    if !exceptions.is_empty() {
        raise(regs, exceptions);
    }
    if exceptions.intersects(Fpscr::VX_ANY) {
        f64::from_bits(DEFAULT_QNAN)
    } else {
        value
    }
}

/// Write an arithmetic result to frD with FPRF and the CR1 record
fn write_result(regs: &mut RegisterFile, inst: Instruction, value: f64, precision: Precision) -> ExecResult {
    let value = match precision {
        Precision::Double => value,
        Precision::Single => round_to_single(value),
    };
    regs.set_fpr(inst.fd(), value);
    set_fprf(regs, value, precision);
    if inst.rc() {
        regs.update_cr1();
    }
    Ok(Flow::Next)
}

/// Write a bit-level move result to frD; FPSCR is untouched
fn write_bits(regs: &mut RegisterFile, inst: Instruction, bits: u64) -> ExecResult {
    regs.set_fpr_bits(inst.fd(), bits);
    if inst.rc() {
        regs.update_cr1();
    }
    Ok(Flow::Next)
}

#[inline]
fn opposite_infinities(a: f64, b: f64) -> bool {
    a.is_infinite() && b.is_infinite() && a.is_sign_negative() != b.is_sign_negative()
}

#[inline]
fn zero_times_infinity(a: f64, c: f64) -> bool {
    (a == 0.0 && c.is_infinite()) || (a.is_infinite() && c == 0.0)
}

// ===== Arithmetic =====

pub fn fadd(regs: &mut RegisterFile, inst: Instruction, precision: Precision) -> ExecResult {
    let (a, b) = (regs.fpr(inst.fa()), regs.fpr(inst.fb()));
    let value = evaluate(regs, &[a, b], || {
        let invalid = if opposite_infinities(a, b) { Fpscr::VXISI } else { Fpscr::empty() };
        (a + b, invalid)
    });
    write_result(regs, inst, value, precision)
}

pub fn fsub(regs: &mut RegisterFile, inst: Instruction, precision: Precision) -> ExecResult {
    let (a, b) = (regs.fpr(inst.fa()), regs.fpr(inst.fb()));
    let value = evaluate(regs, &[a, b], || {
        let invalid = if opposite_infinities(a, -b) { Fpscr::VXISI } else { Fpscr::empty() };
        (a - b, invalid)
    });
    write_result(regs, inst, value, precision)
}

pub fn fmul(regs: &mut RegisterFile, inst: Instruction, precision: Precision) -> ExecResult {
    let (a, c) = (regs.fpr(inst.fa()), regs.fpr(inst.fc()));
    let value = evaluate(regs, &[a, c], || {
        let invalid = if zero_times_infinity(a, c) { Fpscr::VXIMZ } else { Fpscr::empty() };
        (a * c, invalid)
    });
    write_result(regs, inst, value, precision)
}

pub fn fdiv(regs: &mut RegisterFile, inst: Instruction, precision: Precision) -> ExecResult {
    let (a, b) = (regs.fpr(inst.fa()), regs.fpr(inst.fb()));
    let value = evaluate(regs, &[a, b], || {
        let exceptions = if a == 0.0 && b == 0.0 {
            Fpscr::VXZDZ
        } else if a.is_infinite() && b.is_infinite() {
            Fpscr::VXIDI
        } else if b == 0.0 && a.is_finite() {
            Fpscr::ZX
        } else {
            Fpscr::empty()
        };
        (a / b, exceptions)
    });
    write_result(regs, inst, value, precision)
}

/// Variant of a fused multiply-add
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusedOp {
    /// `frA * frC + frB`
    MultiplyAdd,
    /// `frA * frC - frB`
    MultiplySubtract,
    /// `-(frA * frC + frB)`
    NegativeMultiplyAdd,
    /// `-(frA * frC - frB)`
    NegativeMultiplySubtract,
}

/// `fmadd`, `fmsub`, `fnmadd`, `fnmsub` and their single forms
///
/// The product is not rounded before the addition.
pub fn fused(regs: &mut RegisterFile, inst: Instruction, op: FusedOp, precision: Precision) -> ExecResult {
    let (a, b, c) = (regs.fpr(inst.fa()), regs.fpr(inst.fb()), regs.fpr(inst.fc()));
    let addend = match op {
        FusedOp::MultiplyAdd | FusedOp::NegativeMultiplyAdd => b,
        FusedOp::MultiplySubtract | FusedOp::NegativeMultiplySubtract => -b,
    };
    let value = evaluate(regs, &[a, b, c], || {
        let invalid = if zero_times_infinity(a, c) {
            Fpscr::VXIMZ
        } else if opposite_infinities(a * c, addend) {
            Fpscr::VXISI
        } else {
            Fpscr::empty()
        };
        let value = a.mul_add(c, addend);
        let value = match precision {
            Precision::Double => value,
            Precision::Single => settle_single_tie(value, fused_residual(a, c, addend, value)),
        };
        (value, invalid)
    });
    let negate = matches!(op, FusedOp::NegativeMultiplyAdd | FusedOp::NegativeMultiplySubtract);
    let value = if negate && !value.is_nan() { -value } else { value };
    write_result(regs, inst, value, precision)
}

/// Error-free sum: `s + t == a + b` exactly
#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let t = (a - (s - bb)) + (b - bb);
    (s, t)
}

/// `a * c + b - value`, where `value` is the rounded fused result
///
/// Only the sign and whether it is zero matter to the caller.
fn fused_residual(a: f64, c: f64, b: f64, value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let p = a * c;
    let p_err = a.mul_add(c, -p);
    let (s, t) = two_sum(p, b);
    let (d, d_err) = two_sum(s, -value);
    d + (d_err + (t + p_err))
}

/// Undo a double rounding before narrowing to single
///
/// A double result that sits exactly halfway between two singles while the
/// exact result does not would round to even; move it one double ulp toward
/// the exact result so the narrowing rounds the right way.
fn settle_single_tie(value: f64, residual: f64) -> f64 {
    if residual == 0.0 || !residual.is_finite() || !value.is_finite() || value == 0.0 {
        return value;
    }
    let magnitude = value.abs();
    let near = magnitude as f32;
    if near as f64 == magnitude || near.is_infinite() {
        return value;
    }
    let far = if (near as f64) < magnitude {
        f32::from_bits(near.to_bits() + 1)
    } else {
        f32::from_bits(near.to_bits() - 1)
    };
    if (magnitude - near as f64).abs() != (far as f64 - magnitude).abs() {
        return value;
    }
    let bits = if (residual > 0.0) == (value > 0.0) {
        value.to_bits() + 1
    } else {
        value.to_bits() - 1
    };
    f64::from_bits(bits)
}

/// Reciprocal estimate (single precision), computed exactly
pub fn fres(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let b = regs.fpr(inst.fb());
    let value = evaluate(regs, &[b], || {
        let exceptions = if b == 0.0 { Fpscr::ZX } else { Fpscr::empty() };
        (1.0 / b, exceptions)
    });
    write_result(regs, inst, value, Precision::Single)
}

/// Reciprocal square root estimate, computed exactly
pub fn frsqrte(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let b = regs.fpr(inst.fb());
    let value = evaluate(regs, &[b], || {
        let exceptions = if b == 0.0 {
            Fpscr::ZX
        } else if b < 0.0 {
            Fpscr::VXSQRT
        } else {
            Fpscr::empty()
        };
        (1.0 / b.sqrt(), exceptions)
    });
    write_result(regs, inst, value, Precision::Double)
}

/// `fsel`: frC when frA >= 0 (including -0), otherwise frB; NaN selects frB
pub fn fsel(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let a = regs.fpr(inst.fa());
    let source = if a >= 0.0 { inst.fc() } else { inst.fb() };
    let bits = regs.fpr_bits(source);
    write_bits(regs, inst, bits)
}

/// Round to single precision
pub fn frsp(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let b = regs.fpr(inst.fb());
    let value = evaluate(regs, &[b], || (b, Fpscr::empty()));
    write_result(regs, inst, value, Precision::Single)
}

/// `fctiw` (FPSCR rounding mode) and `fctiwz` (toward zero)
pub fn fctiw(regs: &mut RegisterFile, inst: Instruction, toward_zero: bool) -> ExecResult {
    let b = regs.fpr(inst.fb());
    let mode = if toward_zero {
        RoundingMode::TowardZero
    } else {
        RoundingMode::from_fpscr(regs.fpscr)
    };

    let (value, exceptions) = if b.is_nan() {
        let snan = if is_snan(b) { Fpscr::VXSNAN } else { Fpscr::empty() };
        (0x8000_0000u32, Fpscr::VXCVI | snan)
    } else {
        let rounded = mode.round(b);
        if rounded > i32::MAX as f64 {
            (0x7FFF_FFFF, Fpscr::VXCVI)
        } else if rounded < i32::MIN as f64 {
            (0x8000_0000, Fpscr::VXCVI)
        } else {
            (rounded as i32 as u32, Fpscr::empty())
        }
    };

    if !exceptions.is_empty() {
        raise(regs, exceptions);
    }
    write_bits(regs, inst, INTEGER_RESULT_HIGH | value as u64)
}

// ===== Compare =====

/// `fcmpu` (unordered) and `fcmpo` (ordered)
pub fn fcmp(regs: &mut RegisterFile, inst: Instruction, ordered: bool) -> ExecResult {
    let (a, b) = (regs.fpr(inst.fa()), regs.fpr(inst.fb()));
    let c = if a.is_nan() || b.is_nan() {
        0b0001
    } else if a < b {
        0b1000
    } else if a > b {
        0b0100
    } else {
        0b0010
    };

    regs.set_cr_field(inst.crfd(), c);
    let mut flags = regs.fpscr_flags();
    flags.remove(Fpscr::FPCC);
    flags |= Fpscr::from_bits_retain(c << 12);
    regs.set_fpscr_flags(flags);

    if is_snan(a) || is_snan(b) {
        raise(regs, Fpscr::VXSNAN);
        if ordered && !regs.fpscr_flags().contains(Fpscr::VE) {
            raise(regs, Fpscr::VXVC);
        }
    } else if ordered && (a.is_nan() || b.is_nan()) {
        raise(regs, Fpscr::VXVC);
    }
    Ok(Flow::Next)
}

// ===== Moves =====

pub fn fmr(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let bits = regs.fpr_bits(inst.fb());
    write_bits(regs, inst, bits)
}

pub fn fneg(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let bits = regs.fpr_bits(inst.fb()) ^ (1 << 63);
    write_bits(regs, inst, bits)
}

pub fn fabs(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let bits = regs.fpr_bits(inst.fb()) & !(1 << 63);
    write_bits(regs, inst, bits)
}

pub fn fnabs(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let bits = regs.fpr_bits(inst.fb()) | (1 << 63);
    write_bits(regs, inst, bits)
}

// ===== FPSCR =====

/// Summary bits that cannot be written directly
const FPSCR_SUMMARY: u32 = Fpscr::FEX.bits() | Fpscr::VX.bits();

pub fn mffs(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let bits = INTEGER_RESULT_HIGH | regs.fpscr as u64;
    write_bits(regs, inst, bits)
}

fn finish_fpscr(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    refresh_summaries(regs);
    if inst.rc() {
        regs.update_cr1();
    }
    Ok(Flow::Next)
}

pub fn mtfsb0(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let mask = (0x8000_0000u32 >> inst.crbd()) & !FPSCR_SUMMARY;
    regs.fpscr &= !mask;
    finish_fpscr(regs, inst)
}

pub fn mtfsb1(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let mask = (0x8000_0000u32 >> inst.crbd()) & !FPSCR_SUMMARY;
    raise(regs, Fpscr::from_bits_retain(mask));
    finish_fpscr(regs, inst)
}

pub fn mtfsfi(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let shift = 28 - 4 * inst.crfd() as u32;
    let mask = (0xF << shift) & !FPSCR_SUMMARY;
    regs.fpscr = (regs.fpscr & !mask) | ((inst.imm() << shift) & mask);
    finish_fpscr(regs, inst)
}

pub fn mtfsf(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let fm = inst.fm();
    let mut mask = 0u32;
    for field in 0..8u32 {
        if fm & (0x80 >> field) != 0 {
            mask |= 0xF << (28 - field * 4);
        }
    }
    mask &= !FPSCR_SUMMARY;
    let source = regs.fpr_bits(inst.fb()) as u32;
    regs.fpscr = (regs.fpscr & !mask) | (source & mask);
    finish_fpscr(regs, inst)
}

/// Copy an FPSCR field to a CR field, clearing the exception bits copied
pub fn mcrfs(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    let shift = 28 - 4 * inst.crfs() as u32;
    regs.set_cr_field(inst.crfd(), (regs.fpscr >> shift) & 0xF);
    let clear = (0xF << shift) & (Fpscr::FX.bits() | Fpscr::EXCEPTIONS.bits());
    regs.fpscr &= !clear;
    refresh_summaries(regs);
    Ok(Flow::Next)
}
