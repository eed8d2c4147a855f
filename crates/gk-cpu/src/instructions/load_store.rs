//! Load and store instructions
//!
//! Register writes happen only after every memory access of the instruction
//! succeeded, so a faulting load or store leaves the register file untouched.
//! Multi-access stores (`stmw`, `stswi`, `stswx`) read every target first, so
//! unmapped targets fault before anything is written. The port has no write
//! probe: a store into a read-only page part way through still leaves the
//! accesses that completed before it in memory.

use gk_core::error::CpuError;
use gk_memory::Width;

use crate::bus::Bus;
use crate::decoder::Instruction;
use crate::instructions::float::{double_to_single, single_to_double, Precision};
use crate::instructions::{Addressing, ExecResult, Flow};
use crate::registers::RegisterFile;

/// True when `reg` is one of the `count` registers starting at `start` (wrapping r31 -> r0)
#[inline]
fn in_register_range(start: usize, count: usize, reg: usize) -> bool {
    (reg + 32 - start) % 32 < count
}

// ===== Integer loads and stores =====

/// `lbz`, `lhz`, `lha`, `lwz` and their update/indexed forms
///
/// `algebraic` sign-extends a halfword (`lha*`).
pub fn load(
    regs: &mut RegisterFile,
    bus: &Bus<'_>,
    inst: Instruction,
    mode: Addressing,
    width: Width,
    algebraic: bool,
) -> ExecResult {
    let (rd, ra) = (inst.rd(), inst.ra());
    if mode.is_update() && (ra == 0 || ra == rd) {
        return Ok(Flow::Invalid);
    }

    let ea = mode.effective_address(regs, inst);
    let raw = bus.load(ea, width)?;
    let value = match width {
        Width::Half if algebraic => raw as u16 as i16 as i32 as u32,
        _ => raw as u32,
    };

    regs.set_gpr(rd, value);
    if mode.is_update() {
        regs.set_gpr(ra, ea);
    }
    Ok(Flow::Next)
}

/// `stb`, `sth`, `stw` and their update/indexed forms
pub fn store(regs: &mut RegisterFile, bus: &Bus<'_>, inst: Instruction, mode: Addressing, width: Width) -> ExecResult {
    let ra = inst.ra();
    if mode.is_update() && ra == 0 {
        return Ok(Flow::Invalid);
    }

    let ea = mode.effective_address(regs, inst);
    let value = regs.gpr(inst.rs()) as u64 & width.mask();
    bus.store(ea, width, value)?;

    if mode.is_update() {
        regs.set_gpr(ra, ea);
    }
    Ok(Flow::Next)
}

/// `lhbrx`, `lwbrx`
pub fn load_reversed(regs: &mut RegisterFile, bus: &Bus<'_>, inst: Instruction, width: Width) -> ExecResult {
    let ea = Addressing::Indexed.effective_address(regs, inst);
    let value = match width {
        Width::Half => bus.load_u16(ea)?.swap_bytes() as u32,
        _ => bus.load_u32(ea)?.swap_bytes(),
    };
    regs.set_gpr(inst.rd(), value);
    Ok(Flow::Next)
}

/// `sthbrx`, `stwbrx`
pub fn store_reversed(regs: &mut RegisterFile, bus: &Bus<'_>, inst: Instruction, width: Width) -> ExecResult {
    let ea = Addressing::Indexed.effective_address(regs, inst);
    let value = regs.gpr(inst.rs());
    match width {
        Width::Half => bus.store_u16(ea, (value as u16).swap_bytes())?,
        _ => bus.store_u32(ea, value.swap_bytes())?,
    }
    Ok(Flow::Next)
}

// ===== Multiple word =====

/// Load rD..r31 from consecutive words
pub fn lmw(regs: &mut RegisterFile, bus: &Bus<'_>, inst: Instruction) -> ExecResult {
    let rd = inst.rd();
    if inst.ra() >= rd {
        return Ok(Flow::Invalid);
    }

    let ea = Addressing::Displacement.effective_address(regs, inst);
    let mut words = [0u32; 32];
    for (i, word) in words[rd..].iter_mut().enumerate() {
        *word = bus.load_u32(ea.wrapping_add(4 * i as u32))?;
    }
    regs.gpr[rd..].copy_from_slice(&words[rd..]);
    Ok(Flow::Next)
}

/// Store rS..r31 to consecutive words
pub fn stmw(regs: &mut RegisterFile, bus: &Bus<'_>, inst: Instruction) -> ExecResult {
    let ea = Addressing::Displacement.effective_address(regs, inst);
    for i in 0..(32 - inst.rs()) as u32 {
        bus.load_u32(ea.wrapping_add(4 * i))?;
    }
    for (i, &word) in regs.gpr[inst.rs()..].iter().enumerate() {
        bus.store_u32(ea.wrapping_add(4 * i as u32), word)?;
    }
    Ok(Flow::Next)
}

// ===== Strings =====

fn read_string(bus: &Bus<'_>, ea: u32, count: u32) -> Result<Vec<u8>, CpuError> {
    (0..count).map(|i| bus.load_u8(ea.wrapping_add(i))).collect()
}

/// Pack bytes into registers starting at `rd`, high byte first; the last
/// register is padded with zeros
fn commit_string(regs: &mut RegisterFile, rd: usize, bytes: &[u8]) {
    for (index, chunk) in bytes.chunks(4).enumerate() {
        let value = chunk
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, &byte)| acc | (byte as u32) << (24 - 8 * i));
        regs.set_gpr((rd + index) % 32, value);
    }
}

fn write_string(regs: &RegisterFile, bus: &Bus<'_>, rs: usize, ea: u32, count: u32) -> Result<(), CpuError> {
    read_string(bus, ea, count)?;
    for i in 0..count {
        let reg = (rs + (i / 4) as usize) % 32;
        let byte = (regs.gpr(reg) >> (24 - 8 * (i % 4))) as u8;
        bus.store_u8(ea.wrapping_add(i), byte)?;
    }
    Ok(())
}

/// Immediate byte count: NB = 0 means 32
#[inline]
fn immediate_count(inst: Instruction) -> u32 {
    match inst.nb() {
        0 => 32,
        n => n,
    }
}

pub fn lswi(regs: &mut RegisterFile, bus: &Bus<'_>, inst: Instruction) -> ExecResult {
    let count = immediate_count(inst);
    let rd = inst.rd();
    if in_register_range(rd, count.div_ceil(4) as usize, inst.ra()) {
        return Ok(Flow::Invalid);
    }

    let ea = regs.gpr_or_zero(inst.ra());
    let bytes = read_string(bus, ea, count)?;
    commit_string(regs, rd, &bytes);
    Ok(Flow::Next)
}

/// Byte count from XER; a count of zero transfers nothing
pub fn lswx(regs: &mut RegisterFile, bus: &Bus<'_>, inst: Instruction) -> ExecResult {
    let count = regs.xer_byte_count();
    if count == 0 {
        return Ok(Flow::Next);
    }
    let rd = inst.rd();
    let registers = count.div_ceil(4) as usize;
    if in_register_range(rd, registers, inst.ra()) || in_register_range(rd, registers, inst.rb()) {
        return Ok(Flow::Invalid);
    }

    let ea = Addressing::Indexed.effective_address(regs, inst);
    let bytes = read_string(bus, ea, count)?;
    commit_string(regs, rd, &bytes);
    Ok(Flow::Next)
}

pub fn stswi(regs: &mut RegisterFile, bus: &Bus<'_>, inst: Instruction) -> ExecResult {
    let ea = regs.gpr_or_zero(inst.ra());
    write_string(regs, bus, inst.rs(), ea, immediate_count(inst))?;
    Ok(Flow::Next)
}

pub fn stswx(regs: &mut RegisterFile, bus: &Bus<'_>, inst: Instruction) -> ExecResult {
    let ea = Addressing::Indexed.effective_address(regs, inst);
    write_string(regs, bus, inst.rs(), ea, regs.xer_byte_count())?;
    Ok(Flow::Next)
}

// ===== Floating point =====

/// `lfs`, `lfd` and their update/indexed forms
///
/// Singles are widened bit-exactly; signaling NaNs stay signaling.
pub fn load_float(
    regs: &mut RegisterFile,
    bus: &Bus<'_>,
    inst: Instruction,
    mode: Addressing,
    precision: Precision,
) -> ExecResult {
    let ra = inst.ra();
    if mode.is_update() && ra == 0 {
        return Ok(Flow::Invalid);
    }

    let ea = mode.effective_address(regs, inst);
    let bits = match precision {
        Precision::Single => single_to_double(bus.load_u32(ea)?),
        Precision::Double => bus.load_u64(ea)?,
    };

    regs.set_fpr_bits(inst.fd(), bits);
    if mode.is_update() {
        regs.set_gpr(ra, ea);
    }
    Ok(Flow::Next)
}

/// `stfs`, `stfd` and their update/indexed forms
pub fn store_float(
    regs: &mut RegisterFile,
    bus: &Bus<'_>,
    inst: Instruction,
    mode: Addressing,
    precision: Precision,
) -> ExecResult {
    let ra = inst.ra();
    if mode.is_update() && ra == 0 {
        return Ok(Flow::Invalid);
    }

    let ea = mode.effective_address(regs, inst);
    let bits = regs.fpr_bits(inst.fd());
    match precision {
        Precision::Single => bus.store_u32(ea, double_to_single(bits))?,
        Precision::Double => bus.store_u64(ea, bits)?,
    }

    if mode.is_update() {
        regs.set_gpr(ra, ea);
    }
    Ok(Flow::Next)
}

/// Store the low word of frS unconverted
pub fn stfiwx(regs: &mut RegisterFile, bus: &Bus<'_>, inst: Instruction) -> ExecResult {
    let ea = Addressing::Indexed.effective_address(regs, inst);
    bus.store_u32(ea, regs.fpr_bits(inst.fd()) as u32)?;
    Ok(Flow::Next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::test_support::{d_form, x_form};
    use gk_core::error::MemoryError;
    use gk_memory::{MemoryImage, MemoryPort, PageFlags};
    use std::sync::Arc;

    const BASE: u32 = 0x8000_0100;

    fn setup() -> (Arc<MemoryImage>, RegisterFile) {
        let mem = MemoryImage::with_size(0x2000);
        let mut regs = RegisterFile::new(0x8000_0000);
        regs.gpr[3] = BASE;
        (mem, regs)
    }

    #[test]
    fn test_round_trip_every_width() {
        let (mem, mut regs) = setup();
        let bus = Bus::new(&*mem, regs.pc, true);
        regs.gpr[4] = 0x89AB_CDEF;

        let cases = [(Width::Byte, 0xEF), (Width::Half, 0xCDEF), (Width::Word, 0x89AB_CDEF)];
        for (i, &(width, expected)) in cases.iter().enumerate() {
            let d = 16 * i as i16;
            store(&mut regs, &bus, Instruction(d_form(36, 4, 3, d)), Addressing::Displacement, width).unwrap();
            load(&mut regs, &bus, Instruction(d_form(32, 5, 3, d)), Addressing::Displacement, width, false).unwrap();
            assert_eq!(regs.gpr[5], expected, "{:?}", width);
        }

        regs.set_fpr_bits(1, 0x0123_4567_89AB_CDEF);
        let stfd = Instruction(d_form(54, 1, 3, 0x40));
        store_float(&mut regs, &bus, stfd, Addressing::Displacement, Precision::Double).unwrap();
        let lfd = Instruction(d_form(50, 2, 3, 0x40));
        load_float(&mut regs, &bus, lfd, Addressing::Displacement, Precision::Double).unwrap();
        assert_eq!(regs.fpr_bits(2), 0x0123_4567_89AB_CDEF);
        assert_eq!(mem.read_u32(BASE + 0x40).unwrap(), 0x0123_4567);
    }

    #[test]
    fn test_lha_sign_extends() {
        let (mem, mut regs) = setup();
        mem.write_u16(BASE, 0x8001).unwrap();
        let bus = Bus::new(&*mem, regs.pc, true);

        load(&mut regs, &bus, Instruction(d_form(42, 5, 3, 0)), Addressing::Displacement, Width::Half, true).unwrap();
        assert_eq!(regs.gpr[5], 0xFFFF_8001);
        load(&mut regs, &bus, Instruction(d_form(40, 5, 3, 0)), Addressing::Displacement, Width::Half, false).unwrap();
        assert_eq!(regs.gpr[5], 0x8001);
    }

    #[test]
    fn test_update_forms() {
        let (mem, mut regs) = setup();
        mem.write_u32(BASE + 8, 0xDEAD_BEEF).unwrap();
        let bus = Bus::new(&*mem, regs.pc, true);

        // lwzu r5, 8(r3)
        load(&mut regs, &bus, Instruction(d_form(33, 5, 3, 8)), Addressing::DisplacementUpdate, Width::Word, false)
            .unwrap();
        assert_eq!(regs.gpr[5], 0xDEAD_BEEF);
        assert_eq!(regs.gpr[3], BASE + 8);

        // stwu r1, -16(r1) stores the old r1
        regs.gpr[1] = BASE + 0x100;
        store(&mut regs, &bus, Instruction(d_form(37, 1, 1, -16)), Addressing::DisplacementUpdate, Width::Word)
            .unwrap();
        assert_eq!(regs.gpr[1], BASE + 0xF0);
        assert_eq!(mem.read_u32(BASE + 0xF0).unwrap(), BASE + 0x100);
    }

    #[test]
    fn test_invalid_update_forms_leave_state() {
        let (mem, mut regs) = setup();
        let bus = Bus::new(&*mem, regs.pc, true);
        let before = regs.clone();

        // lwzu r3, 0(r3)
        let flow = load(&mut regs, &bus, Instruction(d_form(33, 3, 3, 0)), Addressing::DisplacementUpdate, Width::Word, false);
        assert_eq!(flow.unwrap(), Flow::Invalid);
        // lwzu r5, 0(0)
        let flow = load(&mut regs, &bus, Instruction(d_form(33, 5, 0, 0)), Addressing::DisplacementUpdate, Width::Word, false);
        assert_eq!(flow.unwrap(), Flow::Invalid);
        // stwu r5, 0(0)
        let flow = store(&mut regs, &bus, Instruction(d_form(37, 5, 0, 0)), Addressing::DisplacementUpdate, Width::Word);
        assert_eq!(flow.unwrap(), Flow::Invalid);
        // lfsu f1, 0(0)
        let flow = load_float(&mut regs, &bus, Instruction(d_form(49, 1, 0, 0)), Addressing::DisplacementUpdate, Precision::Single);
        assert_eq!(flow.unwrap(), Flow::Invalid);

        assert_eq!(regs, before);
    }

    #[test]
    fn test_fault_does_not_update_ra() {
        let (mem, mut regs) = setup();
        let bus = Bus::new(&*mem, regs.pc, true);
        regs.gpr[3] = 0x9000_0000;
        let before = regs.clone();

        let err = load(&mut regs, &bus, Instruction(d_form(33, 5, 3, 4)), Addressing::DisplacementUpdate, Width::Word, false)
            .unwrap_err();
        assert!(matches!(err, CpuError::Memory { pc: 0x8000_0000, source: MemoryError::Unmapped { .. } }));
        assert_eq!(regs, before);
    }

    #[test]
    fn test_alignment_policy() {
        let (mem, mut regs) = setup();
        let inst = Instruction(d_form(32, 5, 3, 2));

        let strict = Bus::new(&*mem, regs.pc, true);
        let err = load(&mut regs, &strict, inst, Addressing::Displacement, Width::Word, false).unwrap_err();
        assert_eq!(err, CpuError::MisalignedAccess { pc: 0x8000_0000, addr: BASE + 2, width: 4 });

        mem.write_u32(BASE, 0x1122_3344).unwrap();
        mem.write_u32(BASE + 4, 0x5566_7788).unwrap();
        let relaxed = Bus::new(&*mem, regs.pc, false);
        load(&mut regs, &relaxed, inst, Addressing::Displacement, Width::Word, false).unwrap();
        assert_eq!(regs.gpr[5], 0x3344_5566);
    }

    #[test]
    fn test_byte_reversed() {
        let (mem, mut regs) = setup();
        let bus = Bus::new(&*mem, regs.pc, true);
        regs.gpr[4] = 0;
        regs.gpr[5] = 0x1122_3344;

        // stwbrx r5, r3, r4
        store_reversed(&mut regs, &bus, Instruction(x_form(31, 5, 3, 4, 662, false)), Width::Word).unwrap();
        assert_eq!(mem.read_u32(BASE).unwrap(), 0x4433_2211);
        // lwbrx r6, r3, r4
        load_reversed(&mut regs, &bus, Instruction(x_form(31, 6, 3, 4, 534, false)), Width::Word).unwrap();
        assert_eq!(regs.gpr[6], 0x1122_3344);

        // sthbrx r5, r3, r4 / lhbrx r7, r3, r4
        store_reversed(&mut regs, &bus, Instruction(x_form(31, 5, 3, 4, 918, false)), Width::Half).unwrap();
        assert_eq!(mem.read_u16(BASE).unwrap(), 0x4433);
        load_reversed(&mut regs, &bus, Instruction(x_form(31, 7, 3, 4, 790, false)), Width::Half).unwrap();
        assert_eq!(regs.gpr[7], 0x3344);
    }

    #[test]
    fn test_lmw_stmw() {
        let (mem, mut regs) = setup();
        let bus = Bus::new(&*mem, regs.pc, true);
        for r in 28..32 {
            regs.gpr[r] = 0x1000 + r as u32;
        }

        // stmw r28, 0(r3)
        stmw(&mut regs, &bus, Instruction(d_form(47, 28, 3, 0))).unwrap();
        assert_eq!(mem.read_u32(BASE + 12).unwrap(), 0x101F);

        // lmw r29, 0(r3) shifts the values down one register
        lmw(&mut regs, &bus, Instruction(d_form(46, 29, 3, 0))).unwrap();
        assert_eq!(&regs.gpr[29..], &[0x101C, 0x101D, 0x101E]);
        assert_eq!(regs.gpr[28], 0x101C);
    }

    #[test]
    fn test_lmw_with_base_in_range_is_invalid() {
        let (mem, mut regs) = setup();
        let bus = Bus::new(&*mem, regs.pc, true);
        regs.gpr[30] = BASE;
        let before = regs.clone();
        // lmw r29, 0(r30)
        assert_eq!(lmw(&mut regs, &bus, Instruction(d_form(46, 29, 30, 0))).unwrap(), Flow::Invalid);
        assert_eq!(regs, before);
    }

    #[test]
    fn test_stmw_partial_fault() {
        let (mem, mut regs) = setup();
        mem.protect(0x8000_1000, 0x1000, PageFlags::READ).unwrap();
        let bus = Bus::new(&*mem, regs.pc, true);
        regs.gpr[3] = 0x8000_0FF8;
        regs.gpr[30] = 0xAAAA_AAAA;
        regs.gpr[31] = 0xBBBB_BBBB;
        let before = regs.clone();

        // stmw r29, 0(r3): r29 and r30 land, r31 hits the read-only page
        let err = stmw(&mut regs, &bus, Instruction(d_form(47, 29, 3, 0))).unwrap_err();
        assert!(err.is_memory_fault());
        assert_eq!(mem.read_u32(0x8000_0FFC).unwrap(), 0xAAAA_AAAA);
        assert_eq!(regs, before);
    }

    #[test]
    fn test_multiple_stores_check_targets_first() {
        let (mem, mut regs) = setup();
        let bus = Bus::new(&*mem, regs.pc, true);
        regs.gpr[29] = 0x1111_1111;
        regs.gpr[30] = 0x2222_2222;

        // stmw r29, 0(r3): the last word falls past the end of RAM
        regs.gpr[3] = 0x8000_1FF8;
        let err = stmw(&mut regs, &bus, Instruction(d_form(47, 29, 3, 0))).unwrap_err();
        assert!(err.is_memory_fault());
        assert_eq!(mem.read_u32(0x8000_1FF8).unwrap(), 0);
        assert_eq!(mem.read_u32(0x8000_1FFC).unwrap(), 0);

        // stswi r29, r3, 12 with the same tail
        let err = stswi(&mut regs, &bus, Instruction(x_form(31, 29, 3, 12, 725, false))).unwrap_err();
        assert!(err.is_memory_fault());
        assert_eq!(mem.read_u32(0x8000_1FF8).unwrap(), 0);
    }

    #[test]
    fn test_string_round_trip_pads_last_register() {
        let (mem, mut regs) = setup();
        mem.load_bytes(BASE, b"gekko!!").unwrap();
        let bus = Bus::new(&*mem, regs.pc, true);
        regs.gpr[6] = 0xFFFF_FFFF;

        // lswi r5, r3, 7
        lswi(&mut regs, &bus, Instruction(x_form(31, 5, 3, 7, 597, false))).unwrap();
        assert_eq!(regs.gpr[5], u32::from_be_bytes(*b"gekk"));
        assert_eq!(regs.gpr[6], u32::from_be_bytes([b'o', b'!', b'!', 0]));

        // stswi r5, r3, 7 at a new address, through r4 = BASE + 0x20
        regs.gpr[4] = BASE + 0x20;
        stswi(&mut regs, &bus, Instruction(x_form(31, 5, 4, 7, 725, false))).unwrap();
        assert_eq!(mem.read_bytes(BASE + 0x20, 8).unwrap(), b"gekko!!\0");
    }

    #[test]
    fn test_lswi_wraps_to_r0() {
        let (mem, mut regs) = setup();
        mem.load_bytes(BASE, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let bus = Bus::new(&*mem, regs.pc, true);

        // lswi r31, r3, 8 fills r31 then r0
        lswi(&mut regs, &bus, Instruction(x_form(31, 31, 3, 8, 597, false))).unwrap();
        assert_eq!(regs.gpr[31], 0x0102_0304);
        assert_eq!(regs.gpr[0], 0x0506_0708);
    }

    #[test]
    fn test_lswi_nb_zero_means_32_bytes() {
        let (mem, mut regs) = setup();
        let bytes: Vec<u8> = (1..=32).collect();
        mem.load_bytes(BASE, &bytes).unwrap();
        let bus = Bus::new(&*mem, regs.pc, true);
        regs.gpr[3] = BASE;

        // lswi r8, r3, 0 loads r8..r15; r3 is outside that range
        lswi(&mut regs, &bus, Instruction(x_form(31, 8, 3, 0, 597, false))).unwrap();
        assert_eq!(regs.gpr[8], 0x0102_0304);
        assert_eq!(regs.gpr[15], 0x1D1E_1F20);
        assert_eq!(regs.gpr[16], 0);
    }

    #[test]
    fn test_lswi_base_in_range_is_invalid() {
        let (mem, mut regs) = setup();
        let bus = Bus::new(&*mem, regs.pc, true);
        let before = regs.clone();
        // lswi r2, r3, 8 would overwrite r3
        assert_eq!(lswi(&mut regs, &bus, Instruction(x_form(31, 2, 3, 8, 597, false))).unwrap(), Flow::Invalid);
        assert_eq!(regs, before);
    }

    #[test]
    fn test_lswx_uses_xer_count() {
        let (mem, mut regs) = setup();
        mem.load_bytes(BASE + 4, &[0xAA, 0xBB, 0xCC]).unwrap();
        let bus = Bus::new(&*mem, regs.pc, true);
        regs.gpr[4] = 4;
        regs.gpr[10] = 0x1234_5678;

        // Zero count transfers nothing
        let inst = Instruction(x_form(31, 10, 3, 4, 533, false));
        lswx(&mut regs, &bus, inst).unwrap();
        assert_eq!(regs.gpr[10], 0x1234_5678);

        regs.xer = 3;
        lswx(&mut regs, &bus, inst).unwrap();
        assert_eq!(regs.gpr[10], 0xAABB_CC00);

        // rB inside the destination range
        let before = regs.clone();
        let inst = Instruction(x_form(31, 4, 3, 4, 533, false));
        assert_eq!(lswx(&mut regs, &bus, inst).unwrap(), Flow::Invalid);
        assert_eq!(regs, before);

        // stswx r10, r3, r4 with the same count
        regs.gpr[4] = 0x10;
        stswx(&mut regs, &bus, Instruction(x_form(31, 10, 3, 4, 661, false))).unwrap();
        assert_eq!(mem.read_bytes(BASE + 0x10, 4).unwrap(), [0xAA, 0xBB, 0xCC, 0x00]);
    }

    #[test]
    fn test_single_load_store_is_bit_exact() {
        let (mem, mut regs) = setup();
        let bus = Bus::new(&*mem, regs.pc, true);
        // Signaling NaN with a payload
        mem.write_u32(BASE, 0x7F80_0123).unwrap();

        // lfs f1, 0(r3)
        load_float(&mut regs, &bus, Instruction(d_form(48, 1, 3, 0)), Addressing::Displacement, Precision::Single)
            .unwrap();
        assert!(crate::instructions::float::is_snan(regs.fpr(1)));

        // stfs f1, 4(r3)
        store_float(&mut regs, &bus, Instruction(d_form(52, 1, 3, 4)), Addressing::Displacement, Precision::Single)
            .unwrap();
        assert_eq!(mem.read_u32(BASE + 4).unwrap(), 0x7F80_0123);

        // lfsu f2, 8(r3) with 1.5f
        mem.write_u32(BASE + 8, 1.5f32.to_bits()).unwrap();
        load_float(&mut regs, &bus, Instruction(d_form(49, 2, 3, 8)), Addressing::DisplacementUpdate, Precision::Single)
            .unwrap();
        assert_eq!(regs.fpr(2), 1.5);
        assert_eq!(regs.gpr[3], BASE + 8);
    }

    #[test]
    fn test_stfiwx_stores_low_word() {
        let (mem, mut regs) = setup();
        let bus = Bus::new(&*mem, regs.pc, true);
        regs.gpr[4] = 0;
        regs.set_fpr_bits(1, 0xFFF8_0000_FFFF_FFFE);

        stfiwx(&mut regs, &bus, Instruction(x_form(31, 1, 3, 4, 983, false))).unwrap();
        assert_eq!(mem.read_u32(BASE).unwrap(), 0xFFFF_FFFE);
    }
}
