//! Memory access for gekko-probe
//!
//! The interpreter talks to target memory exclusively through [`MemoryPort`].
//! [`MemoryImage`] is the in-process implementation used when the bytes live
//! in this process (tests, offline analysis of RAM dumps).

pub mod constants;
pub mod image;
pub mod pages;
pub mod port;

pub use image::MemoryImage;
pub use pages::PageFlags;
pub use port::{MemoryPort, Width};
