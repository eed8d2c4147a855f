//! GameCube memory map constants

/// Physical base of main RAM
pub const MEM1_PHYS_BASE: u32 = 0x0000_0000;
/// Cached virtual window onto main RAM
pub const MEM1_CACHED_BASE: u32 = 0x8000_0000;
/// Uncached virtual window onto main RAM
pub const MEM1_UNCACHED_BASE: u32 = 0xC000_0000;
/// Main RAM size (24 MB)
pub const MEM1_SIZE: u32 = 0x0180_0000;

/// Size of each address window (the region mask below selects the window)
pub const WINDOW_SPAN: u32 = 0x1000_0000;
/// Mask that strips the window selector from an effective address
pub const WINDOW_OFFSET_MASK: u32 = WINDOW_SPAN - 1;

/// Operating system globals at the start of main RAM
pub const OS_GLOBALS_BASE: u32 = 0x8000_0000;
/// Size of the OS globals block
pub const OS_GLOBALS_SIZE: u32 = 0x0000_3100;
/// First address commonly used for game code (after the exception vectors)
pub const GAME_CODE_BASE: u32 = 0x8000_3100;

/// Standard page size (4 KB)
pub const PAGE_SIZE: u32 = 0x1000;

/// Data cache block size used by `dcbz` and friends
pub const CACHE_BLOCK_SIZE: u32 = 32;
