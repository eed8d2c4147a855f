//! Data access path of a single step
//!
//! Execution units never see the raw port: every access goes through [`Bus`],
//! which applies the alignment policy and tags port failures with the PC of
//! the instruction that issued them.

use gk_core::error::CpuError;
use gk_memory::{MemoryPort, Width};

/// Memory access context for the instruction at `pc`
#[derive(Clone, Copy)]
pub struct Bus<'a> {
    port: &'a dyn MemoryPort,
    pc: u32,
    strict_alignment: bool,
}

impl<'a> Bus<'a> {
    pub fn new(port: &'a dyn MemoryPort, pc: u32, strict_alignment: bool) -> Self {
        Self {
            port,
            pc,
            strict_alignment,
        }
    }

    /// Address of the instruction issuing the accesses
    pub fn pc(&self) -> u32 {
        self.pc
    }

    fn check_alignment(&self, addr: u32, width: Width) -> Result<(), CpuError> {
        if self.strict_alignment && !width.is_aligned(addr) {
            return Err(CpuError::MisalignedAccess {
                pc: self.pc,
                addr,
                width: width.bytes() as u8,
            });
        }
        Ok(())
    }

    /// Read `width` bytes at `addr`
    pub fn load(&self, addr: u32, width: Width) -> Result<u64, CpuError> {
        self.check_alignment(addr, width)?;
        self.port
            .read(addr, width)
            .map_err(|source| CpuError::Memory { pc: self.pc, source })
    }

    /// Write the low `width` bytes of `value` at `addr`
    pub fn store(&self, addr: u32, width: Width, value: u64) -> Result<(), CpuError> {
        self.check_alignment(addr, width)?;
        self.port
            .write(addr, width, value)
            .map_err(|source| CpuError::Memory { pc: self.pc, source })
    }

    #[inline]
    pub fn load_u8(&self, addr: u32) -> Result<u8, CpuError> {
        self.load(addr, Width::Byte).map(|v| v as u8)
    }

    #[inline]
    pub fn load_u16(&self, addr: u32) -> Result<u16, CpuError> {
        self.load(addr, Width::Half).map(|v| v as u16)
    }

    #[inline]
    pub fn load_u32(&self, addr: u32) -> Result<u32, CpuError> {
        self.load(addr, Width::Word).map(|v| v as u32)
    }

    #[inline]
    pub fn load_u64(&self, addr: u32) -> Result<u64, CpuError> {
        self.load(addr, Width::Double)
    }

    #[inline]
    pub fn store_u8(&self, addr: u32, value: u8) -> Result<(), CpuError> {
        self.store(addr, Width::Byte, value as u64)
    }

    #[inline]
    pub fn store_u16(&self, addr: u32, value: u16) -> Result<(), CpuError> {
        self.store(addr, Width::Half, value as u64)
    }

    #[inline]
    pub fn store_u32(&self, addr: u32, value: u32) -> Result<(), CpuError> {
        self.store(addr, Width::Word, value as u64)
    }

    #[inline]
    pub fn store_u64(&self, addr: u32, value: u64) -> Result<(), CpuError> {
        self.store(addr, Width::Double, value)
    }
}
