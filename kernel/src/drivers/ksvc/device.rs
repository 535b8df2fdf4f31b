//! The device surface: one `PerOpenState` per open file description,
//! dispatching the single control command and the three mmap windows.

use crate::drivers::ksvc::abi::{CreateParams, CREATE_DEFAULT, PAGE_SIZE};
use crate::drivers::ksvc::error::{KsvcError, Result};
use crate::drivers::ksvc::eventcounter::EventCounterSource;
use crate::drivers::ksvc::instance::Instance;
use crate::drivers::ksvc::ring::RangeInstaller;
use crate::drivers::ksvc::task::{ClockSource, TaskContext};
use crate::mm::FrameAllocator;

/// Per-open device state. One instance per successful `open()`.
pub struct PerOpenState {
    instance: Instance,
}

impl PerOpenState {
    pub fn open() -> Self {
        Self {
            instance: Instance::new(),
        }
    }

    /// Dispatch a control command. Only `CREATE_DEFAULT` is defined; any
    /// other command is rejected the way an unsupported ioctl number is:
    /// [`KsvcError::NotATty`].
    pub fn control(
        &mut self,
        command: u32,
        params: CreateParams,
        allocator: &'static FrameAllocator,
        task: &dyn TaskContext,
        clock: &dyn ClockSource,
        events: &dyn EventCounterSource,
    ) -> Result<CreateParams> {
        if command != CREATE_DEFAULT {
            return Err(KsvcError::NotATty);
        }
        self.instance.create(params, allocator, task, clock, events)?;
        Ok(self.instance.params())
    }

    /// Map the region starting at `offset` (one of the three fixed window
    /// offsets) at `base` in the caller's address space, of `len` bytes.
    /// `len` must cover the whole region; partial-window maps are rejected.
    pub fn map(
        &self,
        offset: u64,
        len: usize,
        base: crate::mm::VirtualAddress,
        installer: &mut dyn RangeInstaller,
    ) -> Result<()> {
        let page_count = self
            .instance
            .region_page_count(offset)
            .ok_or(KsvcError::InvalidArgument)?;
        if len != page_count * PAGE_SIZE {
            return Err(KsvcError::InvalidArgument);
        }
        self.instance.map_dispatch(offset, base, installer)
    }

    pub fn close(&mut self) {
        self.instance.close();
    }
}
