//! In-process memory image
//!
//! [`MemoryImage`] holds a copy of GameCube main RAM and serves it through the
//! [`MemoryPort`] interface. The same bytes are visible through the physical,
//! cached and uncached windows, matching the console's default BAT setup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gk_core::error::MemoryError;
use gk_core::mem_trace;
use parking_lot::RwLock;

use crate::constants::{
    MEM1_CACHED_BASE, MEM1_PHYS_BASE, MEM1_SIZE, MEM1_UNCACHED_BASE, PAGE_SIZE,
    WINDOW_OFFSET_MASK,
};
use crate::pages::{page_index, PageFlags};
use crate::port::{MemoryPort, Width};

/// Main RAM image shared between the interpreter and the host
pub struct MemoryImage {
    /// RAM contents, big-endian as on the console
    ram: RwLock<Box<[u8]>>,
    /// Protection flags per page
    pages: RwLock<Vec<PageFlags>>,
    /// Whether the image currently stands in for an attached target
    attached: AtomicBool,
    /// RAM size in bytes (page aligned)
    size: u32,
}

impl MemoryImage {
    /// Create a 24 MB main RAM image, attached and fully read/write
    pub fn new() -> Arc<Self> {
        Self::with_size(MEM1_SIZE)
    }

    /// Create an image of `size` bytes, rounded up to whole pages
    pub fn with_size(size: u32) -> Arc<Self> {
        let size = size.min(WINDOW_OFFSET_MASK + 1);
        let size = size.div_ceil(PAGE_SIZE).max(1) * PAGE_SIZE;
        let page_count = (size / PAGE_SIZE) as usize;

        tracing::debug!("Creating memory image of 0x{:x} bytes ({} pages)", size, page_count);

        Arc::new(Self {
            ram: RwLock::new(vec![0u8; size as usize].into_boxed_slice()),
            pages: RwLock::new(vec![PageFlags::RW; page_count]),
            attached: AtomicBool::new(true),
            size,
        })
    }

    /// RAM size in bytes
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Mark the image as attached to its target
    pub fn attach(&self) {
        self.attached.store(true, Ordering::Release);
        tracing::info!("Memory image attached");
    }

    /// Mark the image as detached; every access fails until re-attached
    pub fn detach(&self) {
        self.attached.store(false, Ordering::Release);
        tracing::info!("Memory image detached");
    }

    /// Translate an effective address to an offset into RAM
    ///
    /// Fails when the address is outside the three RAM windows or when the
    /// `len`-byte range runs past the end of RAM.
    pub fn translate(&self, addr: u32, len: u32) -> Result<usize, MemoryError> {
        let window = addr & !WINDOW_OFFSET_MASK;
        let unmapped = MemoryError::Unmapped {
            addr,
            width: len.min(u8::MAX as u32) as u8,
        };

        if window != MEM1_PHYS_BASE && window != MEM1_CACHED_BASE && window != MEM1_UNCACHED_BASE {
            return Err(unmapped);
        }

        let offset = addr & WINDOW_OFFSET_MASK;
        match offset.checked_add(len) {
            Some(end) if end <= self.size => Ok(offset as usize),
            _ => Err(unmapped),
        }
    }

    /// Change the protection of every page overlapping `[addr, addr + len)`
    pub fn protect(&self, addr: u32, len: u32, flags: PageFlags) -> Result<(), MemoryError> {
        if len == 0 {
            return Ok(());
        }
        let start = self.translate(addr, len)? as u32;
        let first = page_index(start, PAGE_SIZE);
        let last = page_index(start + len - 1, PAGE_SIZE);

        let mut pages = self.pages.write();
        for page in &mut pages[first..=last] {
            *page = flags;
        }
        tracing::debug!(
            "Protected 0x{:08x}..0x{:08x} as {:?}",
            addr,
            addr.wrapping_add(len),
            flags
        );
        Ok(())
    }

    /// Protection flags of the page holding `addr`
    pub fn page_flags(&self, addr: u32) -> Result<PageFlags, MemoryError> {
        let offset = self.translate(addr, 1)? as u32;
        Ok(self.pages.read()[page_index(offset, PAGE_SIZE)])
    }

    /// Copy `data` into RAM, ignoring page protection (host side loading)
    pub fn load_bytes(&self, addr: u32, data: &[u8]) -> Result<(), MemoryError> {
        let len = u32::try_from(data.len()).map_err(|_| MemoryError::Unmapped { addr, width: 0 })?;
        let offset = self.translate(addr, len)?;
        self.ram.write()[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Copy `len` bytes out of RAM, ignoring page protection
    pub fn read_bytes(&self, addr: u32, len: u32) -> Result<Vec<u8>, MemoryError> {
        let offset = self.translate(addr, len)?;
        Ok(self.ram.read()[offset..offset + len as usize].to_vec())
    }

    /// Check protection for an access spanning `[offset, offset + len)`
    fn check_access(&self, addr: u32, offset: u32, len: u32, needed: PageFlags) -> Result<(), MemoryError> {
        let pages = self.pages.read();
        let first = page_index(offset, PAGE_SIZE);
        let last = page_index(offset + len - 1, PAGE_SIZE);
        if pages[first..=last].iter().all(|flags| flags.contains(needed)) {
            Ok(())
        } else {
            Err(MemoryError::AccessViolation {
                addr,
                access: if needed.contains(PageFlags::WRITE) { "write" } else { "read" },
            })
        }
    }

    fn ensure_attached(&self) -> Result<(), MemoryError> {
        if self.attached.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(MemoryError::NotAttached)
        }
    }
}

impl MemoryPort for MemoryImage {
    fn read(&self, addr: u32, width: Width) -> Result<u64, MemoryError> {
        self.ensure_attached()?;
        let len = width.bytes();
        let offset = self.translate(addr, len)?;
        self.check_access(addr, offset as u32, len, PageFlags::READ)?;

        let ram = self.ram.read();
        let bytes = &ram[offset..offset + len as usize];
        let value = bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
        mem_trace!("read{} 0x{:08x} -> 0x{:x}", len * 8, addr, value);
        Ok(value)
    }

    fn write(&self, addr: u32, width: Width, value: u64) -> Result<(), MemoryError> {
        self.ensure_attached()?;
        let len = width.bytes();
        let offset = self.translate(addr, len)?;
        self.check_access(addr, offset as u32, len, PageFlags::WRITE)?;

        let be = value.to_be_bytes();
        let mut ram = self.ram.write();
        ram[offset..offset + len as usize].copy_from_slice(&be[8 - len as usize..]);
        mem_trace!("write{} 0x{:08x} <- 0x{:x}", len * 8, addr, value & width.mask());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}
