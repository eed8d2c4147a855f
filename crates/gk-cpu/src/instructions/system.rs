//! System instructions: exceptions, MSR access, cache and sync operations

use gk_core::cpu_debug;
use gk_memory::constants::CACHE_BLOCK_SIZE;

use crate::bus::Bus;
use crate::decoder::Instruction;
use crate::instructions::{ExecResult, Flow};
use crate::registers::RegisterFile;

/// Program exception vector offset
pub const VECTOR_PROGRAM: u32 = 0x700;
/// System call vector offset
pub const VECTOR_SYSTEM_CALL: u32 = 0xC00;

/// SRR1 flag recorded by a trap-caused program exception
pub const SRR1_TRAP: u32 = 0x0002_0000;

/// MSR bits preserved into SRR1 on exception entry
const SRR1_MSR_MASK: u32 = 0x87C0_FFFF;
/// MSR bits cleared on exception entry (POW, EE, PR, FP, FE0, SE, BE, FE1, IR, DR, PM, RI)
const MSR_EXCEPTION_CLEAR: u32 = 0x0004_EF36;
/// MSR bits restored from SRR1 by `rfi`
const RFI_RESTORE_MASK: u32 = 0x87C0_FF73;
/// MSR[POW]
const MSR_POW: u32 = 0x0004_0000;
/// MSR[ILE]
const MSR_ILE: u32 = 0x0001_0000;
/// MSR[LE]
const MSR_LE: u32 = 0x0000_0001;

/// Enter an exception: save the return address and MSR, then switch MSR
///
/// Returns the flow that redirects to the vector.
pub fn enter_exception(
    regs: &mut RegisterFile,
    vector: u32,
    return_address: u32,
    srr1_flags: u32,
    exception_base: u32,
) -> Flow {
    regs.srr0 = return_address;
    regs.srr1 = (regs.msr & SRR1_MSR_MASK) | srr1_flags;

    let little_endian = regs.msr & MSR_ILE != 0;
    regs.msr &= !(MSR_EXCEPTION_CLEAR | MSR_LE);
    if little_endian {
        regs.msr |= MSR_LE;
    }

    let target = exception_base.wrapping_add(vector);
    cpu_debug!(
        "Exception 0x{:03x} from 0x{:08x}, SRR1=0x{:08x}",
        vector,
        regs.pc,
        regs.srr1
    );
    Flow::Jump(target)
}

/// Program exception raised by a taken `tw`/`twi`
pub fn trap(regs: &mut RegisterFile, exception_base: u32) -> Flow {
    let pc = regs.pc;
    enter_exception(regs, VECTOR_PROGRAM, pc, SRR1_TRAP, exception_base)
}

/// System call
pub fn sc(regs: &mut RegisterFile, exception_base: u32) -> ExecResult {
    let return_address = regs.pc.wrapping_add(4);
    Ok(enter_exception(regs, VECTOR_SYSTEM_CALL, return_address, 0, exception_base))
}

/// Return from interrupt
pub fn rfi(regs: &mut RegisterFile) -> ExecResult {
    regs.msr = ((regs.msr & !RFI_RESTORE_MASK) | (regs.srr1 & RFI_RESTORE_MASK)) & !MSR_POW;
    Ok(Flow::Jump(regs.srr0 & !3))
}

pub fn mfmsr(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    regs.set_gpr(inst.rd(), regs.msr);
    Ok(Flow::Next)
}

pub fn mtmsr(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
    regs.msr = regs.gpr(inst.rs());
    Ok(Flow::Next)
}

/// `isync`, `sync`, `eieio` and the cache hints that need no memory effect
/// (`dcbt`, `dcbtst`, `dcbst`, `dcbf`, `dcbi`, `icbi`)
pub fn no_op() -> ExecResult {
    Ok(Flow::Next)
}

/// `dcbz`/`dcba`: zero the 32-byte block holding `(rA|0) + rB`
pub fn zero_block(regs: &mut RegisterFile, bus: &Bus<'_>, inst: Instruction) -> ExecResult {
    let ea = regs.gpr_or_zero(inst.ra()).wrapping_add(regs.gpr(inst.rb()));
    let block = ea & !(CACHE_BLOCK_SIZE - 1);
    for offset in (0..CACHE_BLOCK_SIZE).step_by(8) {
        bus.store_u64(block + offset, 0)?;
    }
    Ok(Flow::Next)
}
