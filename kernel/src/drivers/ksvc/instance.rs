//! Per-open instance state machine: `Open` -> `Created` -> `Closed`, and
//! the transactional create step that allocates both rings, the shared
//! page, and an optional event-counter reference, rolling everything back
//! on the first failure.

use alloc::boxed::Box;

use crate::drivers::ksvc::abi::{CreateParams, OFF_COMPLETE_RING, OFF_SHARED_PAGE, OFF_SUBMIT_RING};
use crate::drivers::ksvc::config::ksvc_debug;
use crate::drivers::ksvc::error::{KsvcError, Result};
use crate::drivers::ksvc::eventcounter::{EventCounterHandle, EventCounterSource};
use crate::drivers::ksvc::ring::{RangeInstaller, RingStore};
use crate::drivers::ksvc::shared_page::SharedPageStore;
use crate::drivers::ksvc::task::{ClockSource, TaskContext};
use crate::mm::FrameAllocator;

/// Lifecycle state of one open file description. `Created` is a one-way
/// door: a second `create` call on an already-created instance is
/// rejected rather than silently replacing the rings underneath any
/// mapping userspace may already hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Created,
    Closed,
}

/// All per-open state for one ksvc file description.
pub struct Instance {
    state: State,
    submit_ring: Option<RingStore>,
    complete_ring: Option<RingStore>,
    shared_page: Option<SharedPageStore>,
    event_counter: Option<Box<dyn EventCounterHandle>>,
    params: CreateParams,
}

impl Instance {
    pub fn new() -> Self {
        Self {
            state: State::Open,
            submit_ring: None,
            complete_ring: None,
            shared_page: None,
            event_counter: None,
            params: CreateParams::default(),
        }
    }

    pub fn is_created(&self) -> bool {
        self.state == State::Created
    }

    /// Run the create transaction: allocate the submission ring, the
    /// completion ring, the shared page, populate it, and acquire the
    /// event-counter reference if one was requested. Any failure rolls
    /// back everything acquired so far by dropping it in reverse order
    /// before returning the error; the instance stays in `Open`.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        params: CreateParams,
        allocator: &'static FrameAllocator,
        task: &dyn TaskContext,
        clock: &dyn ClockSource,
        events: &dyn EventCounterSource,
    ) -> Result<()> {
        if self.state != State::Open {
            log::error!("ksvc: create rejected: instance is not Open");
            return Err(KsvcError::Busy);
        }

        let submit_ring = match RingStore::allocate(
            allocator,
            params.submit_ring_entries,
            crate::drivers::ksvc::abi::SUBMISSION_ENTRY_SIZE,
        ) {
            Ok(ring) => ring,
            Err(e) => {
                log::error!("ksvc: submit ring allocation failed: {e}");
                return Err(e);
            }
        };
        ksvc_debug!("ksvc: submit ring allocated ({} entries)", params.submit_ring_entries);

        let complete_ring = match RingStore::allocate(
            allocator,
            params.complete_ring_entries,
            crate::drivers::ksvc::abi::COMPLETION_ENTRY_SIZE,
        ) {
            Ok(ring) => ring,
            Err(e) => {
                log::error!("ksvc: complete ring allocation failed: {e}");
                return Err(e); // submit_ring drops here, freeing its frames
            }
        };
        ksvc_debug!("ksvc: complete ring allocated ({} entries)", params.complete_ring_entries);

        let shared_page = match SharedPageStore::allocate(allocator, task, clock) {
            Ok(page) => page,
            Err(e) => {
                log::error!("ksvc: shared page allocation failed: {e}");
                return Err(e); // submit_ring and complete_ring drop here
            }
        };
        ksvc_debug!("ksvc: shared page populated for pid {}", task.pid());

        let event_counter = match events.acquire(params.eventfd) {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("ksvc: event counter acquisition failed: {e}");
                return Err(e); // all three allocations above drop here
            }
        };
        ksvc_debug!("ksvc: event counter acquired (fd {})", params.eventfd);

        self.submit_ring = Some(submit_ring);
        self.complete_ring = Some(complete_ring);
        self.shared_page = Some(shared_page);
        self.event_counter = event_counter;
        self.params = params;
        self.state = State::Created;
        log::info!("ksvc: instance created (pid {}, submit={}, complete={})", task.pid(), params.submit_ring_entries, params.complete_ring_entries);
        Ok(())
    }

    /// Install the region named by `offset` (one of the three fixed
    /// mmap-window offsets) at `base` in the caller's address space.
    /// `offset` must exactly match a window start; this driver does not
    /// support partial-window maps.
    pub fn map_dispatch(&self, offset: u64, base: crate::mm::VirtualAddress, installer: &mut dyn RangeInstaller) -> Result<()> {
        if !self.is_created() {
            return Err(KsvcError::InvalidArgument);
        }
        match offset {
            OFF_SUBMIT_RING => self
                .submit_ring
                .as_ref()
                .expect("created instance has a submit ring")
                .install(base, installer),
            OFF_COMPLETE_RING => self
                .complete_ring
                .as_ref()
                .expect("created instance has a complete ring")
                .install(base, installer),
            OFF_SHARED_PAGE => {
                let frame = self
                    .shared_page
                    .as_ref()
                    .expect("created instance has a shared page")
                    .frame();
                let flags = crate::mm::PageFlags::READ
                    | crate::mm::PageFlags::USER
                    | crate::mm::PageFlags::NO_INHERIT
                    | crate::mm::PageFlags::NO_EXPAND;
                installer.install(base, core::slice::from_ref(frame), flags)
            }
            _ => Err(KsvcError::InvalidArgument),
        }
    }

    pub fn params(&self) -> CreateParams {
        self.params
    }

    /// Total mappable size in pages, for a caller that wants to validate a
    /// map request's length before calling map_dispatch.
    pub fn region_page_count(&self, offset: u64) -> Option<usize> {
        match offset {
            OFF_SUBMIT_RING => self.submit_ring.as_ref().map(RingStore::page_count),
            OFF_COMPLETE_RING => self.complete_ring.as_ref().map(RingStore::page_count),
            OFF_SHARED_PAGE if self.shared_page.is_some() => Some(1),
            _ => None,
        }
    }

    pub fn close(&mut self) {
        self.state = State::Closed;
        self.submit_ring = None;
        self.complete_ring = None;
        self.shared_page = None;
        self.event_counter = None;
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::ksvc::eventcounter::fakes::FakeEventCounterSource;
    use crate::drivers::ksvc::task::{FakeClock, FakeTaskContext};
    use crate::mm::Frame;

    fn fresh_allocator() -> &'static FrameAllocator {
        Box::leak(Box::new(FrameAllocator::with_capacity(64)))
    }

    struct NoopInstaller;

    impl RangeInstaller for NoopInstaller {
        fn install(&mut self, _base: crate::mm::VirtualAddress, _frames: &[Frame], _flags: crate::mm::PageFlags) -> Result<()> {
            Ok(())
        }
    }

    fn default_params() -> CreateParams {
        CreateParams {
            submit_ring_entries: 64,
            complete_ring_entries: 64,
            flags: 0,
            eventfd: -1,
            reserved: [0; 4],
        }
    }

    #[test]
    fn create_transitions_open_to_created() {
        let allocator = fresh_allocator();
        let mut instance = Instance::new();
        let task = FakeTaskContext::default();
        let clock = FakeClock::default();
        let events = FakeEventCounterSource::default();
        instance
            .create(default_params(), allocator, &task, &clock, &events)
            .unwrap();
        assert!(instance.is_created());
    }

    #[test]
    fn second_create_is_rejected_with_busy() {
        let allocator = fresh_allocator();
        let mut instance = Instance::new();
        let task = FakeTaskContext::default();
        let clock = FakeClock::default();
        let events = FakeEventCounterSource::default();
        instance
            .create(default_params(), allocator, &task, &clock, &events)
            .unwrap();
        let result = instance.create(default_params(), allocator, &task, &clock, &events);
        assert_eq!(result.err(), Some(KsvcError::Busy));
    }

    #[test]
    fn create_rejects_bad_ring_size_without_leaking_frames() {
        let allocator = fresh_allocator();
        let mut instance = Instance::new();
        let task = FakeTaskContext::default();
        let clock = FakeClock::default();
        let events = FakeEventCounterSource::default();
        let mut params = default_params();
        params.submit_ring_entries = 33; // not a power of two
        let result = instance.create(params, allocator, &task, &clock, &events);
        assert_eq!(result.err(), Some(KsvcError::InvalidArgument));
        assert!(!instance.is_created());
        assert_eq!(allocator.outstanding(), 0);
    }

    #[test]
    fn create_rolls_back_rings_when_event_counter_acquisition_fails() {
        let allocator = fresh_allocator();
        let mut instance = Instance::new();
        let task = FakeTaskContext::default();
        let clock = FakeClock::default();
        let events = FakeEventCounterSource::default();
        let mut params = default_params();
        params.eventfd = events.bad_descriptor;
        let result = instance.create(params, allocator, &task, &clock, &events);
        assert_eq!(result.err(), Some(KsvcError::BadAddress));
        assert!(!instance.is_created());
        assert_eq!(allocator.outstanding(), 0);
    }

    #[test]
    fn map_dispatch_before_create_is_rejected() {
        let instance = Instance::new();
        let mut installer = NoopInstaller;
        let result = instance.map_dispatch(OFF_SUBMIT_RING, crate::mm::VirtualAddress::new(0x1000), &mut installer);
        assert_eq!(result.err(), Some(KsvcError::InvalidArgument));
    }

    #[test]
    fn map_dispatch_routes_each_window_after_create() {
        let allocator = fresh_allocator();
        let mut instance = Instance::new();
        let task = FakeTaskContext::default();
        let clock = FakeClock::default();
        let events = FakeEventCounterSource::default();
        instance
            .create(default_params(), allocator, &task, &clock, &events)
            .unwrap();
        let mut installer = NoopInstaller;
        let base = crate::mm::VirtualAddress::new(0x1000);
        assert!(instance.map_dispatch(OFF_SUBMIT_RING, base, &mut installer).is_ok());
        assert!(instance.map_dispatch(OFF_COMPLETE_RING, base, &mut installer).is_ok());
        assert!(instance.map_dispatch(OFF_SHARED_PAGE, base, &mut installer).is_ok());
        assert_eq!(
            instance.map_dispatch(0xdead, base, &mut installer).err(),
            Some(KsvcError::InvalidArgument)
        );
    }

    #[test]
    fn close_releases_all_frames() {
        let allocator = fresh_allocator();
        let mut instance = Instance::new();
        let task = FakeTaskContext::default();
        let clock = FakeClock::default();
        let events = FakeEventCounterSource::default();
        instance
            .create(default_params(), allocator, &task, &clock, &events)
            .unwrap();
        assert!(allocator.outstanding() > 0);
        instance.close();
        assert_eq!(allocator.outstanding(), 0);
    }
}
