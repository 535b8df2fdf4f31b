//! Memory management primitives shared by driver modules.
//!
//! Scoped to what a driver needs from a host memory subsystem: a frame
//! allocator and the address/permission vocabulary used when installing
//! frames into a caller's address range. There is no paging or page-table
//! code here; installation itself is modeled behind the
//! `drivers::ksvc::RangeInstaller` trait seam rather than real MMU
//! programming.

pub mod frame_allocator;

pub use frame_allocator::{Frame, FrameAllocator, FrameAllocatorError, FrameNumber, FRAME_ALLOCATOR, FRAME_SIZE};

/// A caller-side virtual address, opaque beyond its numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VirtualAddress(pub usize);

impl VirtualAddress {
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    pub const fn as_usize(&self) -> usize {
        self.0
    }

    pub const fn add(&self, offset: usize) -> Self {
        Self(self.0 + offset)
    }
}

bitflags::bitflags! {
    /// Page protection bits a range install operation may request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFlags: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const USER = 1 << 2;
        /// VM_DONTCOPY-equivalent: not inherited across fork.
        const NO_INHERIT = 1 << 3;
        /// VM_DONTEXPAND-equivalent: the mapping may not grow.
        const NO_EXPAND = 1 << 4;
    }
}

pub fn init() {
    crate::println!("[MM] frame allocator ready ({} frames)", FRAME_ALLOCATOR.capacity());
}
