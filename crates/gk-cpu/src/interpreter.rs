//! Gekko interpreter implementation
//!
//! This module fetches instruction words through the memory port, dispatches
//! them to the execution units in [`crate::instructions`] and moves the
//! program counter. Execution breakpoints are checked before every step.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use gk_core::config::Config;
use gk_core::cpu_trace;
use gk_core::error::CpuError;
use gk_memory::{MemoryPort, Width};
use parking_lot::{Mutex, RwLock};

use crate::bus::Bus;
use crate::decoder::{
    lookup, ControlFlowOp, ExtendedOp, FloatDoubleOp, FloatSingleOp, Instruction, OpcodeTable, PrimaryOp,
};
use crate::instructions::branch::{self, CrLogic};
use crate::instructions::float::{self, FusedOp, Precision};
use crate::instructions::{integer, load_store, system, Addressing, ExecResult, Flow};
use crate::registers::RegisterFile;

/// Breakpoint type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointType {
    /// Unconditional breakpoint - always breaks
    Unconditional,
    /// Conditional breakpoint - breaks when condition is met
    Conditional(BreakpointCondition),
}

/// Breakpoint condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointCondition {
    /// Break when GPR equals value
    GprEquals { reg: usize, value: u32 },
    /// Break when instruction count reaches value
    InstructionCount { count: u64 },
}

/// Breakpoint information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    /// Address of the breakpoint
    pub addr: u32,
    /// Type of breakpoint
    pub bp_type: BreakpointType,
    /// Whether the breakpoint is enabled
    pub enabled: bool,
    /// Hit count
    pub hit_count: u64,
}

/// Diagnostic for an instruction that could not be executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidInstruction {
    /// Address of the instruction
    pub pc: u32,
    /// Raw instruction word
    pub opcode: u32,
    /// Deepest opcode table consulted
    pub table: OpcodeTable,
    /// Mnemonic, or `"unknown"` when no table entry matched
    pub mnemonic: &'static str,
}

impl fmt::Display for InvalidInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (0x{:08x}, {} table) at 0x{:08x}",
            self.mnemonic, self.opcode, self.table, self.pc
        )
    }
}

/// Outcome of a step that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The instruction ran and the PC moved to its successor or target
    Executed,
    /// The instruction was skipped; only the PC moved, by 4
    Invalid(InvalidInstruction),
}

/// Gekko interpreter for instruction execution
pub struct Interpreter {
    /// Target memory
    memory: Arc<dyn MemoryPort>,
    /// Breakpoints (address -> breakpoint)
    breakpoints: RwLock<HashMap<u32, Breakpoint>>,
    /// Total instruction count (for conditional breakpoints)
    instruction_count: Mutex<u64>,
    /// Reject misaligned data accesses
    strict_alignment: bool,
    /// Base added to exception vector offsets
    exception_base: u32,
    /// Emit a trace event per instruction
    trace_instructions: bool,
}

impl Interpreter {
    /// Create an interpreter with the default configuration
    pub fn new(memory: Arc<dyn MemoryPort>) -> Self {
        Self::with_config(memory, &Config::default())
    }

    pub fn with_config(memory: Arc<dyn MemoryPort>, config: &Config) -> Self {
        Self {
            memory,
            breakpoints: RwLock::new(HashMap::new()),
            instruction_count: Mutex::new(0),
            strict_alignment: config.interpreter.strict_alignment,
            exception_base: config.interpreter.exception_base,
            trace_instructions: config.debug.trace_instructions,
        }
    }

    /// Memory port the interpreter fetches from
    pub fn memory(&self) -> &Arc<dyn MemoryPort> {
        &self.memory
    }

    /// Add a breakpoint at the specified address
    pub fn add_breakpoint(&self, addr: u32, bp_type: BreakpointType) {
        self.breakpoints.write().insert(
            addr,
            Breakpoint {
                addr,
                bp_type,
                enabled: true,
                hit_count: 0,
            },
        );
    }

    /// Remove a breakpoint at the specified address
    pub fn remove_breakpoint(&self, addr: u32) {
        self.breakpoints.write().remove(&addr);
    }

    /// Enable a breakpoint
    pub fn enable_breakpoint(&self, addr: u32) {
        if let Some(bp) = self.breakpoints.write().get_mut(&addr) {
            bp.enabled = true;
        }
    }

    /// Disable a breakpoint
    pub fn disable_breakpoint(&self, addr: u32) {
        if let Some(bp) = self.breakpoints.write().get_mut(&addr) {
            bp.enabled = false;
        }
    }

    /// Clear all breakpoints
    pub fn clear_breakpoints(&self) {
        self.breakpoints.write().clear();
    }

    /// Get all breakpoints, ordered by address
    pub fn get_breakpoints(&self) -> Vec<Breakpoint> {
        let mut breakpoints: Vec<Breakpoint> = self.breakpoints.read().values().cloned().collect();
        breakpoints.sort_by_key(|bp| bp.addr);
        breakpoints
    }

    /// Check if we should break at the current PC
    #[inline]
    fn should_break(&self, regs: &RegisterFile) -> bool {
        let breakpoints = self.breakpoints.read();
        let Some(bp) = breakpoints.get(&regs.pc) else {
            return false;
        };
        if !bp.enabled {
            return false;
        }

        match bp.bp_type {
            BreakpointType::Unconditional => true,
            BreakpointType::Conditional(BreakpointCondition::GprEquals { reg, value }) => regs.gpr(reg) == value,
            BreakpointType::Conditional(BreakpointCondition::InstructionCount { count }) => {
                *self.instruction_count.lock() >= count
            }
        }
    }

    /// Execute a single instruction, stopping first at an armed breakpoint
    pub fn step(&self, regs: &mut RegisterFile) -> Result<StepOutcome, CpuError> {
        if self.should_break(regs) {
            let pc = regs.pc;
            if let Some(bp) = self.breakpoints.write().get_mut(&pc) {
                bp.hit_count += 1;
            }
            return Err(CpuError::Breakpoint { addr: pc });
        }
        self.execute_step(regs)
    }

    /// Execute a single instruction without checking breakpoints
    ///
    /// Used to resume from the breakpoint the previous `step` reported.
    pub fn execute_step(&self, regs: &mut RegisterFile) -> Result<StepOutcome, CpuError> {
        let pc = regs.pc;
        if pc & 3 != 0 {
            return Err(CpuError::MisalignedPc { pc });
        }

        let opcode = self
            .memory
            .read_u32(pc)
            .map_err(|source| CpuError::Memory { pc, source })?;
        *self.instruction_count.lock() += 1;

        let inst = Instruction(opcode);
        if self.trace_instructions {
            cpu_trace!("0x{:08x}: {} {}", pc, inst, lookup(inst).1);
        }

        let bus = Bus::new(&*self.memory, pc, self.strict_alignment);
        match self.dispatch(regs, &bus, inst)? {
            Flow::Next => regs.advance_pc(),
            Flow::Jump(target) => regs.pc = target,
            Flow::Invalid => {
                let (table, mnemonic) = lookup(inst);
                let invalid = InvalidInstruction {
                    pc,
                    opcode,
                    table,
                    mnemonic,
                };
                tracing::warn!("Unimplemented or invalid instruction: {}", invalid);
                regs.advance_pc();
                return Ok(StepOutcome::Invalid(invalid));
            }
        }

        regs.tick();
        Ok(StepOutcome::Executed)
    }

    /// Get the current instruction count
    pub fn instruction_count(&self) -> u64 {
        *self.instruction_count.lock()
    }

    /// Reset the instruction count
    pub fn reset_instruction_count(&self) {
        *self.instruction_count.lock() = 0;
    }

    /// Route a decoded instruction to its execution unit
    fn dispatch(&self, regs: &mut RegisterFile, bus: &Bus<'_>, inst: Instruction) -> ExecResult {
        use Addressing::*;

        match PrimaryOp::decode(inst) {
            PrimaryOp::Twi => integer::twi(regs, inst, self.exception_base),
            PrimaryOp::Mulli => integer::mulli(regs, inst),
            PrimaryOp::Subfic => integer::subfic(regs, inst),
            PrimaryOp::Cmpli => integer::cmpli(regs, inst),
            PrimaryOp::Cmpi => integer::cmpi(regs, inst),
            PrimaryOp::Addic => integer::addic(regs, inst, false),
            PrimaryOp::AddicRc => integer::addic(regs, inst, true),
            PrimaryOp::Addi => integer::addi(regs, inst),
            PrimaryOp::Addis => integer::addis(regs, inst),
            PrimaryOp::Bc => branch::bc(regs, inst),
            PrimaryOp::Sc => system::sc(regs, self.exception_base),
            PrimaryOp::B => branch::b(regs, inst),
            PrimaryOp::ControlFlow => self.dispatch_control_flow(regs, inst),
            PrimaryOp::Rlwimi => integer::rlwimi(regs, inst),
            PrimaryOp::Rlwinm => integer::rlwinm(regs, inst),
            PrimaryOp::Rlwnm => integer::rlwnm(regs, inst),
            PrimaryOp::Ori => integer::ori(regs, inst),
            PrimaryOp::Oris => integer::oris(regs, inst),
            PrimaryOp::Xori => integer::xori(regs, inst),
            PrimaryOp::Xoris => integer::xoris(regs, inst),
            PrimaryOp::AndiRc => integer::andi_rc(regs, inst),
            PrimaryOp::AndisRc => integer::andis_rc(regs, inst),
            PrimaryOp::Extended => self.dispatch_extended(regs, bus, inst),

            PrimaryOp::Lwz => load_store::load(regs, bus, inst, Displacement, Width::Word, false),
            PrimaryOp::Lwzu => load_store::load(regs, bus, inst, DisplacementUpdate, Width::Word, false),
            PrimaryOp::Lbz => load_store::load(regs, bus, inst, Displacement, Width::Byte, false),
            PrimaryOp::Lbzu => load_store::load(regs, bus, inst, DisplacementUpdate, Width::Byte, false),
            PrimaryOp::Lhz => load_store::load(regs, bus, inst, Displacement, Width::Half, false),
            PrimaryOp::Lhzu => load_store::load(regs, bus, inst, DisplacementUpdate, Width::Half, false),
            PrimaryOp::Lha => load_store::load(regs, bus, inst, Displacement, Width::Half, true),
            PrimaryOp::Lhau => load_store::load(regs, bus, inst, DisplacementUpdate, Width::Half, true),
            PrimaryOp::Stw => load_store::store(regs, bus, inst, Displacement, Width::Word),
            PrimaryOp::Stwu => load_store::store(regs, bus, inst, DisplacementUpdate, Width::Word),
            PrimaryOp::Stb => load_store::store(regs, bus, inst, Displacement, Width::Byte),
            PrimaryOp::Stbu => load_store::store(regs, bus, inst, DisplacementUpdate, Width::Byte),
            PrimaryOp::Sth => load_store::store(regs, bus, inst, Displacement, Width::Half),
            PrimaryOp::Sthu => load_store::store(regs, bus, inst, DisplacementUpdate, Width::Half),
            PrimaryOp::Lmw => load_store::lmw(regs, bus, inst),
            PrimaryOp::Stmw => load_store::stmw(regs, bus, inst),
            PrimaryOp::Lfs => load_store::load_float(regs, bus, inst, Displacement, Precision::Single),
            PrimaryOp::Lfsu => load_store::load_float(regs, bus, inst, DisplacementUpdate, Precision::Single),
            PrimaryOp::Lfd => load_store::load_float(regs, bus, inst, Displacement, Precision::Double),
            PrimaryOp::Lfdu => load_store::load_float(regs, bus, inst, DisplacementUpdate, Precision::Double),
            PrimaryOp::Stfs => load_store::store_float(regs, bus, inst, Displacement, Precision::Single),
            PrimaryOp::Stfsu => load_store::store_float(regs, bus, inst, DisplacementUpdate, Precision::Single),
            PrimaryOp::Stfd => load_store::store_float(regs, bus, inst, Displacement, Precision::Double),
            PrimaryOp::Stfdu => load_store::store_float(regs, bus, inst, DisplacementUpdate, Precision::Double),

            PrimaryOp::FloatSingle => Self::dispatch_float_single(regs, inst),
            PrimaryOp::FloatDouble => Self::dispatch_float_double(regs, inst),

            // Paired singles and quantized loads/stores are recognized only
            PrimaryOp::PairedSingle
            | PrimaryOp::PsqL
            | PrimaryOp::PsqLu
            | PrimaryOp::PsqSt
            | PrimaryOp::PsqStu
            | PrimaryOp::Unknown(_) => Ok(Flow::Invalid),
        }
    }

    /// Opcode 19
    fn dispatch_control_flow(&self, regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
        match ControlFlowOp::decode(inst) {
            ControlFlowOp::Mcrf => branch::mcrf(regs, inst),
            ControlFlowOp::Bclr => branch::bclr(regs, inst),
            ControlFlowOp::Bcctr => branch::bcctr(regs, inst),
            ControlFlowOp::Crand => branch::cr_logic(regs, inst, CrLogic::And),
            ControlFlowOp::Cror => branch::cr_logic(regs, inst, CrLogic::Or),
            ControlFlowOp::Crxor => branch::cr_logic(regs, inst, CrLogic::Xor),
            ControlFlowOp::Crnand => branch::cr_logic(regs, inst, CrLogic::Nand),
            ControlFlowOp::Crnor => branch::cr_logic(regs, inst, CrLogic::Nor),
            ControlFlowOp::Crandc => branch::cr_logic(regs, inst, CrLogic::Andc),
            ControlFlowOp::Crorc => branch::cr_logic(regs, inst, CrLogic::Orc),
            ControlFlowOp::Creqv => branch::cr_logic(regs, inst, CrLogic::Eqv),
            ControlFlowOp::Rfi => system::rfi(regs),
            ControlFlowOp::Isync => system::no_op(),
            ControlFlowOp::Unknown(_) => Ok(Flow::Invalid),
        }
    }

    /// Opcode 31
    fn dispatch_extended(&self, regs: &mut RegisterFile, bus: &Bus<'_>, inst: Instruction) -> ExecResult {
        use Addressing::*;

        match ExtendedOp::decode(inst) {
            ExtendedOp::Add => integer::add(regs, inst),
            ExtendedOp::Addc => integer::addc(regs, inst),
            ExtendedOp::Adde => integer::adde(regs, inst),
            ExtendedOp::Addme => integer::addme(regs, inst),
            ExtendedOp::Addze => integer::addze(regs, inst),
            ExtendedOp::Subf => integer::subf(regs, inst),
            ExtendedOp::Subfc => integer::subfc(regs, inst),
            ExtendedOp::Subfe => integer::subfe(regs, inst),
            ExtendedOp::Subfme => integer::subfme(regs, inst),
            ExtendedOp::Subfze => integer::subfze(regs, inst),
            ExtendedOp::Neg => integer::neg(regs, inst),
            ExtendedOp::Mullw => integer::mullw(regs, inst),
            ExtendedOp::Mulhw => integer::mulhw(regs, inst),
            ExtendedOp::Mulhwu => integer::mulhwu(regs, inst),
            ExtendedOp::Divw => integer::divw(regs, inst),
            ExtendedOp::Divwu => integer::divwu(regs, inst),

            ExtendedOp::Cmp => integer::cmp(regs, inst),
            ExtendedOp::Cmpl => integer::cmpl(regs, inst),
            ExtendedOp::Tw => integer::tw(regs, inst, self.exception_base),
            ExtendedOp::And => integer::and(regs, inst),
            ExtendedOp::Andc => integer::andc(regs, inst),
            ExtendedOp::Or => integer::or(regs, inst),
            ExtendedOp::Orc => integer::orc(regs, inst),
            ExtendedOp::Xor => integer::xor(regs, inst),
            ExtendedOp::Nand => integer::nand(regs, inst),
            ExtendedOp::Nor => integer::nor(regs, inst),
            ExtendedOp::Eqv => integer::eqv(regs, inst),
            ExtendedOp::Slw => integer::slw(regs, inst),
            ExtendedOp::Srw => integer::srw(regs, inst),
            ExtendedOp::Sraw => integer::sraw(regs, inst),
            ExtendedOp::Srawi => integer::srawi(regs, inst),
            ExtendedOp::Cntlzw => integer::cntlzw(regs, inst),
            ExtendedOp::Extsb => integer::extsb(regs, inst),
            ExtendedOp::Extsh => integer::extsh(regs, inst),

            ExtendedOp::Lwzx => load_store::load(regs, bus, inst, Indexed, Width::Word, false),
            ExtendedOp::Lwzux => load_store::load(regs, bus, inst, IndexedUpdate, Width::Word, false),
            ExtendedOp::Lbzx => load_store::load(regs, bus, inst, Indexed, Width::Byte, false),
            ExtendedOp::Lbzux => load_store::load(regs, bus, inst, IndexedUpdate, Width::Byte, false),
            ExtendedOp::Lhzx => load_store::load(regs, bus, inst, Indexed, Width::Half, false),
            ExtendedOp::Lhzux => load_store::load(regs, bus, inst, IndexedUpdate, Width::Half, false),
            ExtendedOp::Lhax => load_store::load(regs, bus, inst, Indexed, Width::Half, true),
            ExtendedOp::Lhaux => load_store::load(regs, bus, inst, IndexedUpdate, Width::Half, true),
            ExtendedOp::Stwx => load_store::store(regs, bus, inst, Indexed, Width::Word),
            ExtendedOp::Stwux => load_store::store(regs, bus, inst, IndexedUpdate, Width::Word),
            ExtendedOp::Stbx => load_store::store(regs, bus, inst, Indexed, Width::Byte),
            ExtendedOp::Stbux => load_store::store(regs, bus, inst, IndexedUpdate, Width::Byte),
            ExtendedOp::Sthx => load_store::store(regs, bus, inst, Indexed, Width::Half),
            ExtendedOp::Sthux => load_store::store(regs, bus, inst, IndexedUpdate, Width::Half),
            ExtendedOp::Lhbrx => load_store::load_reversed(regs, bus, inst, Width::Half),
            ExtendedOp::Lwbrx => load_store::load_reversed(regs, bus, inst, Width::Word),
            ExtendedOp::Sthbrx => load_store::store_reversed(regs, bus, inst, Width::Half),
            ExtendedOp::Stwbrx => load_store::store_reversed(regs, bus, inst, Width::Word),
            ExtendedOp::Lswi => load_store::lswi(regs, bus, inst),
            ExtendedOp::Lswx => load_store::lswx(regs, bus, inst),
            ExtendedOp::Stswi => load_store::stswi(regs, bus, inst),
            ExtendedOp::Stswx => load_store::stswx(regs, bus, inst),
            ExtendedOp::Lfsx => load_store::load_float(regs, bus, inst, Indexed, Precision::Single),
            ExtendedOp::Lfsux => load_store::load_float(regs, bus, inst, IndexedUpdate, Precision::Single),
            ExtendedOp::Lfdx => load_store::load_float(regs, bus, inst, Indexed, Precision::Double),
            ExtendedOp::Lfdux => load_store::load_float(regs, bus, inst, IndexedUpdate, Precision::Double),
            ExtendedOp::Stfsx => load_store::store_float(regs, bus, inst, Indexed, Precision::Single),
            ExtendedOp::Stfsux => load_store::store_float(regs, bus, inst, IndexedUpdate, Precision::Single),
            ExtendedOp::Stfdx => load_store::store_float(regs, bus, inst, Indexed, Precision::Double),
            ExtendedOp::Stfdux => load_store::store_float(regs, bus, inst, IndexedUpdate, Precision::Double),
            ExtendedOp::Stfiwx => load_store::stfiwx(regs, bus, inst),

            ExtendedOp::Mfcr => integer::mfcr(regs, inst),
            ExtendedOp::Mtcrf => integer::mtcrf(regs, inst),
            ExtendedOp::Mcrxr => integer::mcrxr(regs, inst),
            ExtendedOp::Mfspr => integer::mfspr(regs, inst),
            ExtendedOp::Mtspr => integer::mtspr(regs, inst),
            ExtendedOp::Mftb => integer::mftb(regs, inst),
            ExtendedOp::Mfmsr => system::mfmsr(regs, inst),
            ExtendedOp::Mtmsr => system::mtmsr(regs, inst),

            ExtendedOp::Dcbst
            | ExtendedOp::Dcbf
            | ExtendedOp::Dcbt
            | ExtendedOp::Dcbtst
            | ExtendedOp::Dcbi
            | ExtendedOp::Icbi
            | ExtendedOp::Sync
            | ExtendedOp::Eieio => system::no_op(),
            ExtendedOp::Dcbz | ExtendedOp::Dcba => system::zero_block(regs, bus, inst),

            // Reservations, segment registers, TLB and external control
            ExtendedOp::Lwarx
            | ExtendedOp::Stwcx
            | ExtendedOp::Mfsr
            | ExtendedOp::Mfsrin
            | ExtendedOp::Mtsr
            | ExtendedOp::Mtsrin
            | ExtendedOp::Tlbie
            | ExtendedOp::Tlbsync
            | ExtendedOp::Eciwx
            | ExtendedOp::Ecowx
            | ExtendedOp::Unknown(_) => Ok(Flow::Invalid),
        }
    }

    /// Opcode 59
    fn dispatch_float_single(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
        let single = Precision::Single;
        match FloatSingleOp::decode(inst) {
            FloatSingleOp::Fadds => float::fadd(regs, inst, single),
            FloatSingleOp::Fsubs => float::fsub(regs, inst, single),
            FloatSingleOp::Fmuls => float::fmul(regs, inst, single),
            FloatSingleOp::Fdivs => float::fdiv(regs, inst, single),
            FloatSingleOp::Fres => float::fres(regs, inst),
            FloatSingleOp::Fmadds => float::fused(regs, inst, FusedOp::MultiplyAdd, single),
            FloatSingleOp::Fmsubs => float::fused(regs, inst, FusedOp::MultiplySubtract, single),
            FloatSingleOp::Fnmadds => float::fused(regs, inst, FusedOp::NegativeMultiplyAdd, single),
            FloatSingleOp::Fnmsubs => float::fused(regs, inst, FusedOp::NegativeMultiplySubtract, single),
            FloatSingleOp::Unknown(_) => Ok(Flow::Invalid),
        }
    }

    /// Opcode 63
    fn dispatch_float_double(regs: &mut RegisterFile, inst: Instruction) -> ExecResult {
        let double = Precision::Double;
        match FloatDoubleOp::decode(inst) {
            FloatDoubleOp::Fadd => float::fadd(regs, inst, double),
            FloatDoubleOp::Fsub => float::fsub(regs, inst, double),
            FloatDoubleOp::Fmul => float::fmul(regs, inst, double),
            FloatDoubleOp::Fdiv => float::fdiv(regs, inst, double),
            FloatDoubleOp::Fsel => float::fsel(regs, inst),
            FloatDoubleOp::Frsqrte => float::frsqrte(regs, inst),
            FloatDoubleOp::Fmadd => float::fused(regs, inst, FusedOp::MultiplyAdd, double),
            FloatDoubleOp::Fmsub => float::fused(regs, inst, FusedOp::MultiplySubtract, double),
            FloatDoubleOp::Fnmadd => float::fused(regs, inst, FusedOp::NegativeMultiplyAdd, double),
            FloatDoubleOp::Fnmsub => float::fused(regs, inst, FusedOp::NegativeMultiplySubtract, double),
            FloatDoubleOp::Frsp => float::frsp(regs, inst),
            FloatDoubleOp::Fctiw => float::fctiw(regs, inst, false),
            FloatDoubleOp::Fctiwz => float::fctiw(regs, inst, true),
            FloatDoubleOp::Fcmpu => float::fcmp(regs, inst, false),
            FloatDoubleOp::Fcmpo => float::fcmp(regs, inst, true),
            FloatDoubleOp::Fmr => float::fmr(regs, inst),
            FloatDoubleOp::Fneg => float::fneg(regs, inst),
            FloatDoubleOp::Fabs => float::fabs(regs, inst),
            FloatDoubleOp::Fnabs => float::fnabs(regs, inst),
            FloatDoubleOp::Mffs => float::mffs(regs, inst),
            FloatDoubleOp::Mtfsb0 => float::mtfsb0(regs, inst),
            FloatDoubleOp::Mtfsb1 => float::mtfsb1(regs, inst),
            FloatDoubleOp::Mtfsfi => float::mtfsfi(regs, inst),
            FloatDoubleOp::Mtfsf => float::mtfsf(regs, inst),
            FloatDoubleOp::Mcrfs => float::mcrfs(regs, inst),
            FloatDoubleOp::Unknown(_) => Ok(Flow::Invalid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_memory::MemoryImage;

    fn create_test_env() -> (Arc<MemoryImage>, Interpreter, RegisterFile) {
        let memory = MemoryImage::with_size(0x10000);
        let interpreter = Interpreter::new(memory.clone());
        let regs = RegisterFile::new(0x8000_1000);
        (memory, interpreter, regs)
    }

    /// Write an instruction at PC and execute it
    fn execute_instruction(
        memory: &MemoryImage,
        interpreter: &Interpreter,
        regs: &mut RegisterFile,
        opcode: u32,
    ) -> Result<StepOutcome, CpuError> {
        memory.write_u32(regs.pc, opcode).unwrap();
        interpreter.step(regs)
    }

    #[test]
    fn test_li_scenario() {
        let (memory, interpreter, mut regs) = create_test_env();
        regs.pc = 0x8000_0000;

        // addi r3, r0, 5
        let outcome = execute_instruction(&memory, &interpreter, &mut regs, 0x38600005).unwrap();
        assert_eq!(outcome, StepOutcome::Executed);
        assert_eq!(regs.gpr[3], 5);
        assert_eq!(regs.pc, 0x8000_0004);
        assert_eq!(regs.tb, 1);
        assert_eq!(regs.cr, 0);
        assert_eq!(regs.xer, 0);
    }

    #[test]
    fn test_cache_hints_are_idempotent() {
        // dcbt, dcbtst, dcbst, dcbf, dcbi, icbi with rA = r3, rB = r4
        for opcode in [0x7C03222C, 0x7C0321EC, 0x7C03206C, 0x7C0320AC, 0x7C0323AC, 0x7C0327AC] {
            let (memory, interpreter, mut regs) = create_test_env();
            memory.load_bytes(0x8000_2000, &[0xA5; 64]).unwrap();
            regs.gpr[3] = 0x8000_2000;
            regs.gpr[4] = 0x20;
            let entry = regs.pc;

            assert_eq!(execute_instruction(&memory, &interpreter, &mut regs, opcode).unwrap(), StepOutcome::Executed);
            let once = regs.clone();
            let image_once = memory.read_bytes(0x8000_0000, 0x10000).unwrap();

            regs.pc = entry;
            assert_eq!(interpreter.step(&mut regs).unwrap(), StepOutcome::Executed);
            assert_eq!(regs.tb, once.tb + 1);
            regs.tb = once.tb;
            assert_eq!(regs, once, "opcode 0x{:08X}", opcode);
            assert_eq!(memory.read_bytes(0x8000_0000, 0x10000).unwrap(), image_once);
        }
    }

    #[test]
    fn test_bl_redirects_and_links() {
        let (memory, interpreter, mut regs) = create_test_env();
        regs.pc = 0x1000;

        execute_instruction(&memory, &interpreter, &mut regs, 0x48000021).unwrap();
        assert_eq!(regs.pc, 0x1020);
        assert_eq!(regs.lr, 0x1004);
    }

    #[test]
    fn test_unknown_primary_reports_and_skips() {
        let (memory, interpreter, mut regs) = create_test_env();
        regs.gpr[3] = 0x1234;
        let before = regs.clone();

        let outcome = execute_instruction(&memory, &interpreter, &mut regs, 0x04000000).unwrap();
        let StepOutcome::Invalid(invalid) = outcome else {
            panic!("expected an invalid outcome, got {:?}", outcome);
        };
        assert_eq!(invalid.mnemonic, "unknown");
        assert_eq!(invalid.table, OpcodeTable::Primary);
        assert_eq!(invalid.pc, 0x8000_1000);
        assert_eq!(invalid.opcode, 0x04000000);

        // Only the PC moved; the time base did not tick
        assert_eq!(regs.pc, before.pc + 4);
        regs.pc = before.pc;
        assert_eq!(regs, before);
    }

    #[test]
    fn test_unknown_secondary_names_its_table() {
        let (memory, interpreter, mut regs) = create_test_env();
        let outcome = execute_instruction(&memory, &interpreter, &mut regs, 0x7C000002).unwrap();
        assert!(matches!(
            outcome,
            StepOutcome::Invalid(InvalidInstruction { table: OpcodeTable::Extended, mnemonic: "unknown", .. })
        ));
    }

    #[test]
    fn test_recognized_unimplemented_instructions() {
        let (memory, interpreter, mut regs) = create_test_env();
        let cases = [
            // lwarx r3, 0, r4
            (0x7C602028, OpcodeTable::Extended, "lwarx"),
            // stwcx. r3, 0, r4
            (0x7C60212D, OpcodeTable::Extended, "stwcx."),
            // tlbie r4
            (0x7C002264, OpcodeTable::Extended, "tlbie"),
            // ps_mr f1, f2
            (0x10201090, OpcodeTable::PairedSingle, "ps_mr"),
            // psq_l f1, 0(r3), 0, 0
            (0xE0230000, OpcodeTable::Primary, "psq_l"),
        ];

        for (opcode, table, mnemonic) in cases {
            let pc = regs.pc;
            let outcome = execute_instruction(&memory, &interpreter, &mut regs, opcode).unwrap();
            assert_eq!(
                outcome,
                StepOutcome::Invalid(InvalidInstruction { pc, opcode, table, mnemonic })
            );
            assert_eq!(regs.pc, pc + 4);
        }
        assert_eq!(regs.tb, 0);
    }

    #[test]
    fn test_mtspr_to_time_base_is_invalid() {
        let (memory, interpreter, mut regs) = create_test_env();
        regs.gpr[3] = 7;
        // mtspr 284, r3 (mttbl)
        let outcome = execute_instruction(&memory, &interpreter, &mut regs, 0x7C7C43A6).unwrap();
        assert!(matches!(outcome, StepOutcome::Invalid(InvalidInstruction { mnemonic: "mtspr", .. })));
        assert_eq!(regs.tb, 0);
    }

    #[test]
    fn test_misaligned_pc() {
        let (_memory, interpreter, mut regs) = create_test_env();
        regs.pc = 0x8000_1002;
        let before = regs.clone();
        assert_eq!(interpreter.step(&mut regs), Err(CpuError::MisalignedPc { pc: 0x8000_1002 }));
        assert_eq!(regs, before);
    }

    #[test]
    fn test_fetch_fault_leaves_state() {
        let (_memory, interpreter, mut regs) = create_test_env();
        regs.pc = 0x9000_0000;
        let before = regs.clone();
        let err = interpreter.step(&mut regs).unwrap_err();
        assert!(err.is_memory_fault());
        assert_eq!(regs, before);
        assert_eq!(interpreter.instruction_count(), 0);
    }

    #[test]
    fn test_store_load_through_dispatch() {
        let (memory, interpreter, mut regs) = create_test_env();
        regs.gpr[1] = 0x8000_2000;
        regs.gpr[3] = 0xCAFE_BABE;

        // stwu r3, -8(r1)
        execute_instruction(&memory, &interpreter, &mut regs, 0x9461FFF8).unwrap();
        // lwz r4, 0(r1)
        execute_instruction(&memory, &interpreter, &mut regs, 0x80810000).unwrap();

        assert_eq!(regs.gpr[1], 0x8000_1FF8);
        assert_eq!(regs.gpr[4], 0xCAFE_BABE);
        assert_eq!(memory.read_u32(0x8000_1FF8).unwrap(), 0xCAFE_BABE);
    }

    #[test]
    fn test_misaligned_data_access_policy() {
        let (memory, interpreter, mut regs) = create_test_env();
        regs.gpr[3] = 0x8000_2002;
        // lwz r4, 0(r3)
        let err = execute_instruction(&memory, &interpreter, &mut regs, 0x80830000).unwrap_err();
        assert!(matches!(err, CpuError::MisalignedAccess { addr: 0x8000_2002, width: 4, .. }));
        assert_eq!(regs.pc, 0x8000_1000);

        let mut config = Config::default();
        config.interpreter.strict_alignment = false;
        let relaxed = Interpreter::with_config(memory.clone(), &config);
        relaxed.step(&mut regs).unwrap();
        assert_eq!(regs.pc, 0x8000_1004);
    }

    #[test]
    fn test_sc_uses_configured_exception_base() {
        let memory = MemoryImage::with_size(0x10000);
        let mut config = Config::default();
        config.interpreter.exception_base = 0;
        let interpreter = Interpreter::with_config(memory.clone(), &config);
        let mut regs = RegisterFile::new(0x2000);

        execute_instruction(&memory, &interpreter, &mut regs, 0x44000002).unwrap();
        assert_eq!(regs.pc, 0xC00);
        assert_eq!(regs.srr0, 0x2004);
    }

    #[test]
    fn test_float_dispatch() {
        let (memory, interpreter, mut regs) = create_test_env();
        regs.set_fpr(2, 1.5);
        regs.set_fpr(3, 2.25);

        // fadd f1, f2, f3
        execute_instruction(&memory, &interpreter, &mut regs, 0xFC22182A).unwrap();
        assert_eq!(regs.fpr(1), 3.75);
        // fmuls f4, f2, f3 (frC = f3)
        execute_instruction(&memory, &interpreter, &mut regs, 0xEC8200F2).unwrap();
        assert_eq!(regs.fpr(4), 3.375);
    }

    #[test]
    fn test_unconditional_breakpoint_and_resume() {
        let (memory, interpreter, mut regs) = create_test_env();
        memory.write_u32(0x8000_1000, 0x38600005).unwrap();
        interpreter.add_breakpoint(0x8000_1000, BreakpointType::Unconditional);

        assert_eq!(interpreter.step(&mut regs), Err(CpuError::Breakpoint { addr: 0x8000_1000 }));
        assert_eq!(regs.pc, 0x8000_1000);
        assert_eq!(interpreter.get_breakpoints()[0].hit_count, 1);

        // Resuming skips the breakpoint check for this one step
        assert_eq!(interpreter.execute_step(&mut regs), Ok(StepOutcome::Executed));
        assert_eq!(regs.gpr[3], 5);
    }

    #[test]
    fn test_conditional_breakpoints() {
        let (memory, interpreter, mut regs) = create_test_env();
        // addi r3, r3, 1 followed by b -4
        memory.write_u32(0x8000_1000, 0x38630001).unwrap();
        memory.write_u32(0x8000_1004, 0x4BFFFFFC).unwrap();

        interpreter.add_breakpoint(
            0x8000_1000,
            BreakpointType::Conditional(BreakpointCondition::GprEquals { reg: 3, value: 3 }),
        );
        let mut steps = 0;
        while interpreter.step(&mut regs).is_ok() {
            steps += 1;
        }
        assert_eq!(regs.gpr[3], 3);
        assert_eq!(steps, 6);

        interpreter.clear_breakpoints();
        interpreter.reset_instruction_count();
        interpreter.add_breakpoint(
            0x8000_1000,
            BreakpointType::Conditional(BreakpointCondition::InstructionCount { count: 4 }),
        );
        while interpreter.step(&mut regs).is_ok() {}
        assert_eq!(interpreter.instruction_count(), 4);
        assert_eq!(regs.gpr[3], 5);
    }

    #[test]
    fn test_disabled_breakpoint_is_ignored() {
        let (memory, interpreter, mut regs) = create_test_env();
        memory.write_u32(0x8000_1000, 0x60000000).unwrap();
        interpreter.add_breakpoint(0x8000_1000, BreakpointType::Unconditional);
        interpreter.disable_breakpoint(0x8000_1000);

        assert_eq!(interpreter.step(&mut regs), Ok(StepOutcome::Executed));
        interpreter.enable_breakpoint(0x8000_1000);
        interpreter.remove_breakpoint(0x8000_1000);
        assert!(interpreter.get_breakpoints().is_empty());
    }

    #[test]
    fn test_invalid_instruction_display() {
        let invalid = InvalidInstruction {
            pc: 0x8000_3100,
            opcode: 0x7C602028,
            table: OpcodeTable::Extended,
            mnemonic: "lwarx",
        };
        assert_eq!(invalid.to_string(), "lwarx (0x7c602028, fixed-extended table) at 0x80003100");
    }
}
