//! Error types for gekko-probe

use thiserror::Error;

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Top-level error
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("CPU error: {0}")]
    Cpu(#[from] CpuError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by a memory port
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// The port has no live connection to its target
    #[error("Memory port is not attached to a target")]
    NotAttached,

    /// The address range is not backed by the target
    #[error("Unmapped access of {width} byte(s) at 0x{addr:08x}")]
    Unmapped { addr: u32, width: u8 },

    /// The page protection forbids the access
    #[error("Access violation ({access}) at 0x{addr:08x}")]
    AccessViolation { addr: u32, access: &'static str },

    /// The transport failed to move the bytes
    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Failures that abort an interpreter step
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CpuError {
    /// A memory access issued by the instruction at `pc` failed
    #[error("Memory access failed while executing 0x{pc:08x}: {source}")]
    Memory {
        pc: u32,
        #[source]
        source: MemoryError,
    },

    /// The program counter is not word aligned
    #[error("Misaligned program counter 0x{pc:08x}")]
    MisalignedPc { pc: u32 },

    /// A data access is not aligned to its operand width
    #[error("Misaligned {width}-byte access at 0x{addr:08x} (pc 0x{pc:08x})")]
    MisalignedAccess { pc: u32, addr: u32, width: u8 },

    /// An execution breakpoint was hit before the instruction ran
    #[error("Breakpoint hit at 0x{addr:08x}")]
    Breakpoint { addr: u32 },
}

impl CpuError {
    /// True when the failure means the target can no longer be trusted
    pub fn is_memory_fault(&self) -> bool {
        matches!(self, CpuError::Memory { .. })
    }
}

/// Configuration load/store failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No configuration directory available on this platform")]
    NoConfigDir,

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_error_display() {
        let err = MemoryError::Unmapped { addr: 0x8180_0000, width: 4 };
        assert_eq!(err.to_string(), "Unmapped access of 4 byte(s) at 0x81800000");
    }

    #[test]
    fn test_cpu_error_wraps_memory_error() {
        let err = CpuError::Memory {
            pc: 0x8000_3100,
            source: MemoryError::NotAttached,
        };
        assert!(err.is_memory_fault());
        assert!(err.to_string().contains("0x80003100"));

        let top: EmulatorError = err.into();
        assert!(matches!(top, EmulatorError::Cpu(_)));
    }
}
