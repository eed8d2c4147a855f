//! Gekko (PowerPC 750CL) interpreter for gekko-probe
//!
//! This crate decodes and executes the Gekko user and supervisor instruction
//! set against an external memory image reached through a
//! [`gk_memory::MemoryPort`]. Paired-single instructions are recognized for
//! diagnostics but not executed.

pub mod bus;
pub mod decoder;
pub mod driver;
pub mod instructions;
pub mod interpreter;
pub mod registers;

pub use decoder::{Instruction, OpcodeTable};
pub use driver::{DriverEvent, EvaluationDriver, StopReason};
pub use interpreter::{
    Breakpoint, BreakpointCondition, BreakpointType, Interpreter, InvalidInstruction, StepOutcome,
};
pub use registers::RegisterFile;
