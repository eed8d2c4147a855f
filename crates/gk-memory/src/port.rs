//! Memory port abstraction
//!
//! A [`MemoryPort`] is the interpreter's only view of the target's memory. It
//! may be backed by a local buffer or by a link into another process, so every
//! access is fallible and values always travel in big-endian byte order.

use std::sync::Arc;

use gk_core::error::MemoryError;

/// Access width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    Byte,
    Half,
    Word,
    Double,
}

impl Width {
    /// Number of bytes moved by an access of this width
    #[inline]
    pub const fn bytes(self) -> u32 {
        match self {
            Width::Byte => 1,
            Width::Half => 2,
            Width::Word => 4,
            Width::Double => 8,
        }
    }

    /// Mask selecting the value bits of this width
    #[inline]
    pub const fn mask(self) -> u64 {
        match self {
            Width::Byte => 0xFF,
            Width::Half => 0xFFFF,
            Width::Word => 0xFFFF_FFFF,
            Width::Double => u64::MAX,
        }
    }

    /// True when `addr` is naturally aligned for this width
    #[inline]
    pub const fn is_aligned(self, addr: u32) -> bool {
        addr & (self.bytes() - 1) == 0
    }
}

/// Typed big-endian access to an external memory image
pub trait MemoryPort: Send + Sync {
    /// Read `width` bytes at `addr`, zero-extended into a `u64`
    fn read(&self, addr: u32, width: Width) -> Result<u64, MemoryError>;

    /// Write the low `width` bytes of `value` at `addr`
    fn write(&self, addr: u32, width: Width, value: u64) -> Result<(), MemoryError>;

    /// Whether the port currently has a live connection to its target
    fn is_connected(&self) -> bool;

    #[inline]
    fn read_u8(&self, addr: u32) -> Result<u8, MemoryError> {
        self.read(addr, Width::Byte).map(|v| v as u8)
    }

    #[inline]
    fn read_u16(&self, addr: u32) -> Result<u16, MemoryError> {
        self.read(addr, Width::Half).map(|v| v as u16)
    }

    #[inline]
    fn read_u32(&self, addr: u32) -> Result<u32, MemoryError> {
        self.read(addr, Width::Word).map(|v| v as u32)
    }

    #[inline]
    fn read_u64(&self, addr: u32) -> Result<u64, MemoryError> {
        self.read(addr, Width::Double)
    }

    #[inline]
    fn write_u8(&self, addr: u32, value: u8) -> Result<(), MemoryError> {
        self.write(addr, Width::Byte, value as u64)
    }

    #[inline]
    fn write_u16(&self, addr: u32, value: u16) -> Result<(), MemoryError> {
        self.write(addr, Width::Half, value as u64)
    }

    #[inline]
    fn write_u32(&self, addr: u32, value: u32) -> Result<(), MemoryError> {
        self.write(addr, Width::Word, value as u64)
    }

    #[inline]
    fn write_u64(&self, addr: u32, value: u64) -> Result<(), MemoryError> {
        self.write(addr, Width::Double, value)
    }
}

impl<P: MemoryPort + ?Sized> MemoryPort for &P {
    fn read(&self, addr: u32, width: Width) -> Result<u64, MemoryError> {
        (**self).read(addr, width)
    }

    fn write(&self, addr: u32, width: Width, value: u64) -> Result<(), MemoryError> {
        (**self).write(addr, width, value)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

impl<P: MemoryPort + ?Sized> MemoryPort for Arc<P> {
    fn read(&self, addr: u32, width: Width) -> Result<u64, MemoryError> {
        (**self).read(addr, width)
    }

    fn write(&self, addr: u32, width: Width, value: u64) -> Result<(), MemoryError> {
        (**self).write(addr, width, value)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}
