//! RAII wrappers for resources acquired during the create transaction.
//!
//! Each wrapper frees its resource on drop so a create step can simply
//! `?`-return out of the transaction and trust that everything it already
//! acquired unwinds itself, instead of hand-rolling reverse-order rollback
//! at every call site.

extern crate alloc;
use alloc::vec::Vec;

use crate::mm::frame_allocator::{Frame, FrameAllocator};

/// Owns a single frame; returns it to the allocator on drop.
pub struct FrameGuard {
    frame: Option<Frame>,
    allocator: &'static FrameAllocator,
}

impl FrameGuard {
    pub fn new(frame: Frame, allocator: &'static FrameAllocator) -> Self {
        Self {
            frame: Some(frame),
            allocator,
        }
    }

    pub fn frame(&self) -> &Frame {
        self.frame.as_ref().expect("frame taken")
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        self.frame.as_mut().expect("frame taken")
    }

    /// Take ownership of the frame without returning it to the allocator.
    pub fn leak(mut self) -> Frame {
        self.frame.take().expect("frame taken")
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.allocator.free_frame(frame);
        }
    }
}

/// Owns a contiguous set of frames allocated together; frees all of them on
/// drop, in allocation order.
pub struct FramesGuard {
    frames: Option<Vec<Frame>>,
    allocator: &'static FrameAllocator,
}

impl FramesGuard {
    pub fn new(frames: Vec<Frame>, allocator: &'static FrameAllocator) -> Self {
        Self {
            frames: Some(frames),
            allocator,
        }
    }

    pub fn frames(&self) -> &[Frame] {
        self.frames.as_deref().expect("frames taken")
    }

    pub fn frames_mut(&mut self) -> &mut [Frame] {
        self.frames.as_deref_mut().expect("frames taken")
    }

    pub fn leak(mut self) -> Vec<Frame> {
        self.frames.take().expect("frames taken")
    }
}

impl Drop for FramesGuard {
    fn drop(&mut self) {
        if let Some(frames) = self.frames.take() {
            for frame in frames {
                self.allocator.free_frame(frame);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::frame_allocator::FrameAllocator;

    #[test]
    fn frame_guard_releases_on_drop() {
        static ALLOC: FrameAllocator = FrameAllocator::new();
        {
            let frame = ALLOC.allocate_frame().unwrap();
            let _guard = FrameGuard::new(frame, &ALLOC);
            assert_eq!(ALLOC.outstanding(), 1);
        }
        assert_eq!(ALLOC.outstanding(), 0);
    }

    #[test]
    fn frames_guard_leak_prevents_free() {
        static ALLOC: FrameAllocator = FrameAllocator::new();
        let frames = ALLOC.allocate_frames(3).unwrap();
        let guard = FramesGuard::new(frames, &ALLOC);
        let leaked = guard.leak();
        assert_eq!(leaked.len(), 3);
        assert_eq!(ALLOC.outstanding(), 3);
    }
}
