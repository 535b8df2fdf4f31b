//! ksvc: per-process shared-memory control channel device.
//!
//! Exposes a submission ring, a completion ring, and a read-only identity
//! page through a single control command and three fixed mmap windows.
//! See [`abi`] for the wire layout, [`instance`] for the create
//! transaction, and [`device`] for the open/control/map surface a host
//! character-device registration calls into.

pub mod abi;
pub mod config;
mod device;
pub mod error;
pub mod eventcounter;
mod instance;
mod ring;
pub mod shared_page;
pub mod task;

pub use device::PerOpenState;
pub use ring::RangeInstaller;

pub const DEVICE_NAME: &str = "ksvc";
pub const DEVICE_MODE: u32 = 0o666;

pub fn init() {
    crate::println!(
        "[KSVC] registering /dev/{} (mode {:o}, magic {:#x})",
        DEVICE_NAME,
        DEVICE_MODE,
        abi::DEVICE_MAGIC
    );
}

pub fn fini() {
    crate::println!("[KSVC] unregistering /dev/{}", DEVICE_NAME);
}
