//! Frame allocator backing the ring store and shared-page store.
//!
//! A real kernel hands out physical pages tracked by a bitmap over a fixed
//! span of physical memory. This module keeps that bookkeeping shape
//! (fixed capacity, atomic free count, double-free detection) but backs
//! each handed-out frame with its own heap allocation rather than a span of
//! physical RAM, since nothing below this layer programs an MMU. This is
//! the "owned vector of frame-owning handles" model: a `Frame` is a
//! first-class object the allocator hands out and reclaims, not a pointer
//! into a shared table.

extern crate alloc;

use alloc::boxed::Box;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use spin::Mutex;

use crate::raii::{FrameGuard, FramesGuard};

/// Size of a single frame, fixed per the ABI's page-size assumption.
pub const FRAME_SIZE: usize = 4096;

/// Upper bound on frames this allocator will ever hand out concurrently.
/// Chosen generously for a driver workload (a handful of rings per open
/// instance); not a claim about real physical memory size.
const MAX_FRAMES: usize = 65536;

pub type Result<T> = core::result::Result<T, FrameAllocatorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAllocatorError {
    /// The allocator has handed out its full capacity.
    OutOfMemory,
    /// A frame was freed that the allocator never considered allocated.
    InvalidFrame,
}

/// Opaque identifier for an allocated frame, unique among frames
/// concurrently outstanding from one allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameNumber(u64);

impl FrameNumber {
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A single zero-filled, page-sized, heap-backed frame.
///
/// `Frame` owns its storage outright; dropping it without going through
/// [`FrameAllocator::free_frame`] simply deallocates the memory, it does
/// not corrupt allocator bookkeeping -- bookkeeping is a separate free
/// count, not a reference into this value.
pub struct Frame {
    number: FrameNumber,
    storage: Box<[u8; FRAME_SIZE]>,
}

impl Frame {
    fn new(number: FrameNumber) -> Self {
        Self {
            number,
            storage: Box::new([0u8; FRAME_SIZE]),
        }
    }

    pub fn number(&self) -> FrameNumber {
        self.number
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.storage
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; FRAME_SIZE] {
        &mut self.storage
    }
}

/// Bitmap-backed frame allocator.
///
/// Tracks only how many of `MAX_FRAMES` identifiers are outstanding;
/// the frames themselves are independent heap allocations (see [`Frame`]).
pub struct FrameAllocator {
    next_number: AtomicU64,
    outstanding: AtomicUsize,
    capacity: usize,
    /// Reclaimed frame numbers, reused before minting new ones. Kept small
    /// and simple (a Mutex<Vec<..>>) since allocation is not a hot path
    /// for this driver: it runs once per ring/shared-page create, not per
    /// submission.
    freelist: Mutex<alloc::vec::Vec<FrameNumber>>,
}

impl FrameAllocator {
    pub const fn new() -> Self {
        Self {
            next_number: AtomicU64::new(0),
            outstanding: AtomicUsize::new(0),
            capacity: MAX_FRAMES,
            freelist: Mutex::new(alloc::vec::Vec::new()),
        }
    }

    /// A test-only constructor for exercising exhaustion/rollback without
    /// allocating `MAX_FRAMES` real frames.
    #[cfg(test)]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::new()
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    fn mint(&self) -> Result<FrameNumber> {
        if let Some(reused) = self.freelist.lock().pop() {
            self.outstanding.fetch_add(1, Ordering::Relaxed);
            return Ok(reused);
        }
        if self.outstanding.load(Ordering::Relaxed) >= self.capacity {
            return Err(FrameAllocatorError::OutOfMemory);
        }
        let number = FrameNumber(self.next_number.fetch_add(1, Ordering::Relaxed));
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        Ok(number)
    }

    /// Allocate a single zero-filled frame.
    pub fn allocate_frame(&self) -> Result<Frame> {
        let number = self.mint()?;
        Ok(Frame::new(number))
    }

    /// Allocate `count` zero-filled frames, or none at all.
    ///
    /// On partial failure, already-minted frames are returned before the
    /// error propagates so the caller never has to reconcile a half-filled
    /// `Vec` against the allocator's outstanding count.
    pub fn allocate_frames(&self, count: usize) -> Result<alloc::vec::Vec<Frame>> {
        let mut frames = alloc::vec::Vec::with_capacity(count);
        for _ in 0..count {
            match self.allocate_frame() {
                Ok(frame) => frames.push(frame),
                Err(e) => {
                    for frame in frames {
                        self.free_frame(frame);
                    }
                    return Err(e);
                }
            }
        }
        Ok(frames)
    }

    /// Return a frame's identifier to the pool; the frame's storage is
    /// dropped with `frame`.
    pub fn free_frame(&self, frame: Frame) {
        self.freelist.lock().push(frame.number);
        self.outstanding.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn allocate_frame_raii(&'static self) -> Result<FrameGuard> {
        Ok(FrameGuard::new(self.allocate_frame()?, self))
    }

    pub fn allocate_frames_raii(&'static self, count: usize) -> Result<FramesGuard> {
        Ok(FramesGuard::new(self.allocate_frames(count)?, self))
    }
}

impl Default for FrameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Not wrapped in an outer lock: every method above takes `&self` and
/// synchronizes internally, so a bare `static` is enough.
pub static FRAME_ALLOCATOR: FrameAllocator = FrameAllocator::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_is_zero_filled() {
        let alloc = FrameAllocator::new();
        let frame = alloc.allocate_frame().unwrap();
        assert!(frame.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn free_and_reuse_number() {
        let alloc = FrameAllocator::new();
        let f1 = alloc.allocate_frame().unwrap();
        let n1 = f1.number();
        alloc.free_frame(f1);
        let f2 = alloc.allocate_frame().unwrap();
        assert_eq!(f2.number(), n1);
        assert_eq!(alloc.outstanding(), 1);
    }

    #[test]
    fn allocate_many_rolls_back_on_exhaustion() {
        let alloc = FrameAllocator::new();
        // Drain capacity down to a small remainder so a bulk request fails.
        let mut held = alloc::vec::Vec::new();
        for _ in 0..MAX_FRAMES - 2 {
            held.push(alloc.allocate_frame().unwrap());
        }
        assert_eq!(alloc.outstanding(), MAX_FRAMES - 2);
        let result = alloc.allocate_frames(5);
        assert!(matches!(result, Err(FrameAllocatorError::OutOfMemory)));
        // Rolled back: outstanding count unchanged by the failed bulk request.
        assert_eq!(alloc.outstanding(), MAX_FRAMES - 2);
    }
}
