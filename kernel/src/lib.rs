//! ksvc kernel module
//!
//! Provides the per-process shared-memory control channel device (`ksvc`):
//! a submission ring, a completion ring, and a read-only identity page,
//! exposed to userspace through open/control/map on a character device.

#![no_std]
#![cfg_attr(target_os = "none", feature(alloc_error_handler))]

#[cfg(feature = "alloc")]
extern crate alloc;

// On bare-metal targets use the custom kernel heap allocator. On host
// builds (used for `cargo test` and for coverage), delegate to the system
// allocator so that alloc-using code compiles and runs normally.
#[cfg(target_os = "none")]
use linked_list_allocator::LockedHeap;

#[cfg(target_os = "none")]
#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

#[cfg(not(target_os = "none"))]
extern crate std;
#[cfg(not(target_os = "none"))]
#[global_allocator]
static SYSTEM_ALLOCATOR: std::alloc::System = std::alloc::System;

/// Get a reference to the global allocator, for bare-metal init to size the
/// heap region before any driver allocates a frame.
#[cfg(target_os = "none")]
pub fn get_allocator() -> &'static LockedHeap {
    &ALLOCATOR
}

#[macro_use]
pub mod print;

pub mod drivers;
pub mod mm;
pub mod raii;

#[cfg(all(target_os = "none", not(test)))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    crate::println!("panic: {info}");
    loop {
        core::hint::spin_loop();
    }
}

/// Heap allocation error handler. Panic is intentional: heap allocation
/// failure in a no_std module is unrecoverable. The alloc_error_handler ABI
/// requires `-> !`.
#[cfg(target_os = "none")]
#[alloc_error_handler]
fn alloc_error_handler(layout: core::alloc::Layout) -> ! {
    panic!("allocation error: {:?}", layout);
}
