//! Trait seam for acquiring a reference to the caller-supplied event
//! counter (the eventfd-like object a create request names).
//!
//! Acquisition is the one part of create that reaches outside this driver
//! into a host file-descriptor table, so it is behind a trait: a host
//! implementation looks the descriptor up and takes a reference, a test
//! fake can simulate "no such descriptor" or "wrong type" without a real
//! kernel fd table.

use crate::drivers::ksvc::error::{KsvcError, Result};

/// A held reference to an external event counter. Dropping it releases the
/// reference; this driver never reads or writes the counter value itself,
/// it only forwards the reference far enough to wake it when the
/// completion ring's tail advances.
pub trait EventCounterHandle {
    fn notify(&self) -> Result<()>;
}

/// Looks up and acquires a reference to the event counter named by a
/// create request, by host-specific descriptor number. `-1` means "no
/// counter requested".
pub trait EventCounterSource {
    fn acquire(&self, descriptor: i32) -> Result<Option<alloc::boxed::Box<dyn EventCounterHandle>>>;
}

/// No host eventfd table wired in yet; every real descriptor lookup fails
/// with [`KsvcError::NotSupported`] so create falls back to "no counter".
/// A host integrating this driver replaces this with its real fd-table
/// lookup.
pub struct HostEventCounterSource;

impl EventCounterSource for HostEventCounterSource {
    fn acquire(&self, descriptor: i32) -> Result<Option<alloc::boxed::Box<dyn EventCounterHandle>>> {
        if descriptor < 0 {
            return Ok(None);
        }
        Err(KsvcError::NotSupported)
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::FakeEventCounterSource;
    use super::*;
    use core::sync::atomic::Ordering;

    #[test]
    fn negative_descriptor_means_no_counter_requested() {
        let source = HostEventCounterSource;
        assert!(source.acquire(-1).unwrap().is_none());
    }

    #[test]
    fn host_source_rejects_any_real_descriptor() {
        let source = HostEventCounterSource;
        assert_eq!(source.acquire(3).err(), Some(KsvcError::NotSupported));
    }

    #[test]
    fn fake_source_acquires_and_notifies() {
        let source = FakeEventCounterSource::default();
        let handle = source.acquire(5).unwrap().expect("handle");
        handle.notify().unwrap();
        assert_eq!(source.notifications.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn fake_source_reports_bad_descriptor() {
        let source = FakeEventCounterSource::default();
        assert_eq!(source.acquire(-2).err(), Some(KsvcError::BadAddress));
    }
}
