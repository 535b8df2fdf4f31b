//! Device drivers module
//!
//! Contains the kernel's device drivers, registered at driver-module init.

pub mod ksvc;

/// Initialize all drivers
pub fn init() {
    crate::println!("[DRIVERS] Initializing device drivers...");
    ksvc::init();
    crate::println!("[DRIVERS] Device drivers initialized");
}
