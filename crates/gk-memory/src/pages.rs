//! Page flags and management

use bitflags::bitflags;

bitflags! {
    /// Page protection flags for the in-process memory image
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PageFlags: u32 {
        /// Page is readable
        const READ    = 0b0001;
        /// Page is writable
        const WRITE   = 0b0010;

        /// Read and write access
        const RW  = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl Default for PageFlags {
    fn default() -> Self {
        Self::RW
    }
}

/// Index of the page holding `offset` (an offset into main RAM)
#[inline]
pub fn page_index(offset: u32, page_size: u32) -> usize {
    (offset / page_size) as usize
}
