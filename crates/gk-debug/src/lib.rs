//! Debugging tools for gekko-probe
//!
//! This crate provides:
//! - Disassembly of Gekko instruction words for traces and diagnostics
//! - Execution profiling (hotspot and mnemonic counts)

pub mod disassembler;
pub mod profiler;

pub use disassembler::{DisassembledInstruction, GekkoDisassembler};
pub use profiler::Profiler;
