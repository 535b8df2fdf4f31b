//! The read-only shared page: one frame carrying the creating task's
//! identity, credentials, system name, rlimits, a runtime-stats region
//! the core never writes, and timestamps.
//!
//! Byte layout (4096 bytes total, all integers little-endian):
//!
//! ```text
//! 0x000  magic (u32), version (u32)
//! 0x008  pid, tgid, ppid, pgid, sid (i32 each), _pad (u32)
//! 0x020  uid, gid, euid, egid, suid, sgid (u32 each), _pad (u32)
//! 0x040  release[65], nodename[65], machine[65], pad[1]
//! 0x108  rlimit_nofile (u64), rlimit_nproc (u64)
//! 0x118  reserved, zero-filled
//! 0x200  runtime-stats region, zero-filled and left untouched by this core
//! 0x280  monotonic_ns (u64), wall_ns (u64), boot_time_ns (u64)
//! 0x298  reserved, zero-filled, to the end of the page
//! ```
use crate::drivers::ksvc::abi::{PAGE_SIZE, SHARED_MAGIC, SHARED_PAGE_VERSION};
use crate::drivers::ksvc::task::{ClockSource, TaskContext};
use crate::mm::{Frame, FrameAllocator};
use crate::raii::FrameGuard;

const OFF_MAGIC: usize = 0x000;
const OFF_IDENTITY: usize = 0x008;
const OFF_CREDENTIALS: usize = 0x020;
const OFF_UTSNAME: usize = 0x040;
const OFF_RLIMITS: usize = 0x108;
const OFF_STATS: usize = 0x200;
const OFF_TIMESTAMPS: usize = 0x280;

const UTS_FIELD_LEN: usize = 65;

/// Owns the allocated shared-page frame and knows how to populate it.
pub struct SharedPageStore {
    guard: FrameGuard,
}

impl SharedPageStore {
    /// Allocate the backing frame, zero it, and write the identity snapshot
    /// described above.
    pub fn allocate(
        allocator: &'static FrameAllocator,
        task: &dyn TaskContext,
        clock: &dyn ClockSource,
    ) -> super::error::Result<Self> {
        let mut guard = allocator.allocate_frame_raii()?;
        populate(guard.frame_mut(), task, clock);
        Ok(Self { guard })
    }

    pub fn frame(&self) -> &Frame {
        self.guard.frame()
    }

    /// Release ownership of the backing frame without freeing it, handing
    /// responsibility to whatever installs it into the caller's address
    /// space.
    pub fn leak(self) -> Frame {
        self.guard.leak()
    }
}

fn populate(frame: &mut Frame, task: &dyn TaskContext, clock: &dyn ClockSource) {
    let bytes = frame.as_bytes_mut();
    debug_assert_eq!(bytes.len(), PAGE_SIZE);

    bytes[OFF_MAGIC..OFF_MAGIC + 4].copy_from_slice(&SHARED_MAGIC.to_le_bytes());
    bytes[OFF_MAGIC + 4..OFF_MAGIC + 8].copy_from_slice(&SHARED_PAGE_VERSION.to_le_bytes());

    write_i32(bytes, OFF_IDENTITY, task.pid());
    write_i32(bytes, OFF_IDENTITY + 4, task.tgid());
    write_i32(bytes, OFF_IDENTITY + 8, task.ppid());
    write_i32(bytes, OFF_IDENTITY + 12, task.pgid());
    write_i32(bytes, OFF_IDENTITY + 16, task.sid());

    write_u32(bytes, OFF_CREDENTIALS, task.uid());
    write_u32(bytes, OFF_CREDENTIALS + 4, task.gid());
    write_u32(bytes, OFF_CREDENTIALS + 8, task.euid());
    write_u32(bytes, OFF_CREDENTIALS + 12, task.egid());
    write_u32(bytes, OFF_CREDENTIALS + 16, task.suid());
    write_u32(bytes, OFF_CREDENTIALS + 20, task.sgid());

    let (release, nodename, machine) = task.utsname();
    write_uts_field(bytes, OFF_UTSNAME, release);
    write_uts_field(bytes, OFF_UTSNAME + UTS_FIELD_LEN, nodename);
    write_uts_field(bytes, OFF_UTSNAME + 2 * UTS_FIELD_LEN, machine);

    write_u64(bytes, OFF_RLIMITS, task.rlimit_nofile());
    write_u64(bytes, OFF_RLIMITS + 8, task.rlimit_nproc());

    // OFF_STATS..OFF_TIMESTAMPS stays zero: runtime counters are owned by
    // whichever worker loop the host wires up, not by create-time populate.
    debug_assert!(bytes[OFF_STATS..OFF_TIMESTAMPS].iter().all(|&b| b == 0));

    write_u64(bytes, OFF_TIMESTAMPS, clock.monotonic_ns());
    write_u64(bytes, OFF_TIMESTAMPS + 8, clock.wall_ns());
    write_u64(bytes, OFF_TIMESTAMPS + 16, clock.boot_time_ns());
}

fn write_i32(bytes: &mut [u8], off: usize, v: i32) {
    bytes[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

fn write_u32(bytes: &mut [u8], off: usize, v: u32) {
    bytes[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

fn write_u64(bytes: &mut [u8], off: usize, v: u64) {
    bytes[off..off + 8].copy_from_slice(&v.to_le_bytes());
}

/// Writes `s` truncated to 64 bytes, followed by a null terminator, zeroing
/// the remainder of the 65-byte field.
fn write_uts_field(bytes: &mut [u8], off: usize, s: &str) {
    let field = &mut bytes[off..off + UTS_FIELD_LEN];
    field.fill(0);
    let n = s.len().min(UTS_FIELD_LEN - 1);
    field[..n].copy_from_slice(&s.as_bytes()[..n]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::ksvc::task::{FakeClock, FakeTaskContext};
    use crate::mm::FrameAllocator;
    use alloc::boxed::Box;

    fn fresh_allocator() -> &'static FrameAllocator {
        Box::leak(Box::new(FrameAllocator::with_capacity(16)))
    }

    #[test]
    fn populate_writes_identity_and_credentials() {
        let allocator = fresh_allocator();
        let task = FakeTaskContext::default();
        let clock = FakeClock::default();
        let store = SharedPageStore::allocate(allocator, &task, &clock).unwrap();
        let bytes = store.frame().as_bytes();

        assert_eq!(
            u32::from_le_bytes(bytes[0..4].try_into().unwrap()),
            SHARED_MAGIC
        );
        assert_eq!(
            i32::from_le_bytes(bytes[OFF_IDENTITY..OFF_IDENTITY + 4].try_into().unwrap()),
            task.pid
        );
        assert_eq!(
            u32::from_le_bytes(
                bytes[OFF_CREDENTIALS..OFF_CREDENTIALS + 4]
                    .try_into()
                    .unwrap()
            ),
            task.uid
        );
    }

    #[test]
    fn populate_leaves_stats_region_zero() {
        let allocator = fresh_allocator();
        let task = FakeTaskContext::default();
        let clock = FakeClock::default();
        let store = SharedPageStore::allocate(allocator, &task, &clock).unwrap();
        let bytes = store.frame().as_bytes();
        assert!(bytes[OFF_STATS..OFF_TIMESTAMPS].iter().all(|&b| b == 0));
    }

    #[test]
    fn populate_truncates_oversized_utsname_fields() {
        let allocator = fresh_allocator();
        let mut task = FakeTaskContext::default();
        task.release = "x-release-string-that-is-far-longer-than-sixty-four-bytes-wide-total";
        let clock = FakeClock::default();
        let store = SharedPageStore::allocate(allocator, &task, &clock).unwrap();
        let bytes = store.frame().as_bytes();
        let field = &bytes[OFF_UTSNAME..OFF_UTSNAME + UTS_FIELD_LEN];
        assert_eq!(field[UTS_FIELD_LEN - 1], 0);
        assert_eq!(&field[..UTS_FIELD_LEN - 1], &task.release.as_bytes()[..UTS_FIELD_LEN - 1]);
    }

    #[test]
    fn populate_writes_timestamps() {
        let allocator = fresh_allocator();
        let task = FakeTaskContext::default();
        let clock = FakeClock::default();
        let store = SharedPageStore::allocate(allocator, &task, &clock).unwrap();
        let bytes = store.frame().as_bytes();
        let mono = u64::from_le_bytes(
            bytes[OFF_TIMESTAMPS..OFF_TIMESTAMPS + 8]
                .try_into()
                .unwrap(),
        );
        assert_eq!(mono, clock.monotonic_ns);
    }
}
