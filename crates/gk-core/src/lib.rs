//! Core infrastructure for gekko-probe
//!
//! Shared error taxonomy, configuration and logging used by the memory,
//! interpreter and debugging crates.

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{EmulatorError, Result};
