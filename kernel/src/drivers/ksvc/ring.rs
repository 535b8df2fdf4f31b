//! Ring storage: header page plus entry pages for one submission or
//! completion ring, and the trait seam for installing those frames into a
//! caller's address range.

use alloc::vec::Vec;

use crate::drivers::ksvc::abi::{ring_page_count, valid_ring_entries, RingHeader, PAGE_SIZE};
use crate::drivers::ksvc::error::{KsvcError, Result};
use crate::mm::{Frame, FrameAllocator, PageFlags};
use crate::raii::FramesGuard;

/// Installs a contiguous run of frames into some caller-defined address
/// range, with the given page permissions. The real operation is a host
/// mmap-style page-table walk; this seam exists so create/map failure
/// paths are testable without one.
pub trait RangeInstaller {
    /// Map `frames` contiguously starting at `base` in the caller's
    /// address space.
    fn install(&mut self, base: crate::mm::VirtualAddress, frames: &[Frame], flags: PageFlags) -> Result<()>;
}

/// One ring's backing store: a header frame and the entry frames behind
/// it, both owned until the ring is torn down.
pub struct RingStore {
    guard: FramesGuard,
    ring_size: u32,
    entry_size: u32,
}

impl RingStore {
    /// Allocate and initialize a ring of `ring_size` entries of `entry_size`
    /// bytes. `ring_size` must satisfy [`valid_ring_entries`].
    pub fn allocate(
        allocator: &'static FrameAllocator,
        ring_size: u32,
        entry_size: u32,
    ) -> Result<Self> {
        if !valid_ring_entries(ring_size) {
            return Err(KsvcError::InvalidArgument);
        }
        let page_count = ring_page_count(ring_size, entry_size);
        let mut guard = allocator.allocate_frames_raii(page_count)?;
        {
            let header_bytes = guard.frames_mut()[0].as_bytes_mut();
            let _ = RingHeader::init(header_bytes, ring_size, entry_size);
        }
        Ok(Self {
            guard,
            ring_size,
            entry_size,
        })
    }

    pub fn ring_size(&self) -> u32 {
        self.ring_size
    }

    pub fn entry_size(&self) -> u32 {
        self.entry_size
    }

    pub fn page_count(&self) -> usize {
        self.guard.frames().len()
    }

    /// Install this ring's frames at `base` through `installer`. Entry
    /// pages are writable since both sides of the ring advance their own
    /// counter; only the header's magic/size fields are meant to be
    /// read-only from userspace, and this driver does not yet split that
    /// mapping finer than whole-ring. The range is marked non-inheritable
    /// and non-expandable: a forked child gets no mapping of its own, and
    /// the ring cannot grow past its allocated page count.
    pub fn install(&self, base: crate::mm::VirtualAddress, installer: &mut dyn RangeInstaller) -> Result<()> {
        let flags = PageFlags::READ | PageFlags::WRITE | PageFlags::USER | PageFlags::NO_INHERIT | PageFlags::NO_EXPAND;
        installer.install(base, self.guard.frames(), flags)
    }

    /// Hand back the owned frames, e.g. when ownership moves to a teardown
    /// path that frees them directly instead of through this guard.
    pub fn leak(self) -> Vec<Frame> {
        self.guard.leak()
    }
}
