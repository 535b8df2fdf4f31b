//! Trait seam for the creating task's identity, credentials, and clocks.
//!
//! The shared-page populate step (`shared_page::SharedPageStore::populate`)
//! needs to read "the current task's identity as viewed in its
//! user-namespace" and "the host's system name and clocks". Those are
//! owned by the surrounding kernel's process and time subsystems, not by
//! this driver, so populate takes them as trait objects instead of
//! reaching for global state. This is also what makes property 3 and
//! scenario A/B testable without a real scheduler: tests inject a
//! [`FakeTaskContext`]/[`FakeClock`] with known values.

/// Process identity and credentials, as the creating task's own
/// user-namespace would view them.
pub trait TaskContext {
    fn pid(&self) -> i32;
    fn tgid(&self) -> i32;
    fn ppid(&self) -> i32;
    fn pgid(&self) -> i32;
    fn sid(&self) -> i32;

    fn uid(&self) -> u32;
    fn gid(&self) -> u32;
    fn euid(&self) -> u32;
    fn egid(&self) -> u32;
    fn suid(&self) -> u32;
    fn sgid(&self) -> u32;

    /// (release, nodename, machine), each truncated to 64 bytes plus a
    /// null terminator by the caller.
    fn utsname(&self) -> (&str, &str, &str);

    fn rlimit_nofile(&self) -> u64;
    fn rlimit_nproc(&self) -> u64;
}

/// Monotonic, wall-clock, and boot timestamps in nanoseconds.
pub trait ClockSource {
    fn monotonic_ns(&self) -> u64;
    fn wall_ns(&self) -> u64;
    fn boot_time_ns(&self) -> u64;
}

/// Placeholder task context for a tree with no real process subsystem
/// wired in yet. A host kernel integrating this driver replaces this with
/// its real `Process`/`Credentials` lookup; the trait boundary is exactly
/// where that replacement plugs in.
pub struct HostTaskContext;

impl TaskContext for HostTaskContext {
    fn pid(&self) -> i32 {
        1
    }
    fn tgid(&self) -> i32 {
        1
    }
    fn ppid(&self) -> i32 {
        0
    }
    fn pgid(&self) -> i32 {
        1
    }
    fn sid(&self) -> i32 {
        1
    }
    fn uid(&self) -> u32 {
        0
    }
    fn gid(&self) -> u32 {
        0
    }
    fn euid(&self) -> u32 {
        0
    }
    fn egid(&self) -> u32 {
        0
    }
    fn suid(&self) -> u32 {
        0
    }
    fn sgid(&self) -> u32 {
        0
    }
    fn utsname(&self) -> (&str, &str, &str) {
        ("0.0.0-ksvc", "ksvc-host", "x86_64")
    }
    fn rlimit_nofile(&self) -> u64 {
        1024
    }
    fn rlimit_nproc(&self) -> u64 {
        4096
    }
}

/// Placeholder clock source; a host kernel replaces this with its real
/// timer subsystem.
pub struct HostClock;

impl ClockSource for HostClock {
    fn monotonic_ns(&self) -> u64 {
        1
    }
    fn wall_ns(&self) -> u64 {
        1
    }
    fn boot_time_ns(&self) -> u64 {
        1
    }
}

#[cfg(test)]
pub struct FakeTaskContext {
    pub pid: i32,
    pub tgid: i32,
    pub ppid: i32,
    pub pgid: i32,
    pub sid: i32,
    pub uid: u32,
    pub gid: u32,
    pub euid: u32,
    pub egid: u32,
    pub suid: u32,
    pub sgid: u32,
    pub release: &'static str,
    pub nodename: &'static str,
    pub machine: &'static str,
    pub rlimit_nofile: u64,
    pub rlimit_nproc: u64,
}

#[cfg(test)]
impl Default for FakeTaskContext {
    fn default() -> Self {
        Self {
            pid: 1234,
            tgid: 1234,
            ppid: 1,
            pgid: 1234,
            sid: 1234,
            uid: 1000,
            gid: 1000,
            euid: 1000,
            egid: 1000,
            suid: 1000,
            sgid: 1000,
            release: "6.9.0-test",
            nodename: "test-host",
            machine: "x86_64",
            rlimit_nofile: 1024,
            rlimit_nproc: 4096,
        }
    }
}

#[cfg(test)]
impl TaskContext for FakeTaskContext {
    fn pid(&self) -> i32 {
        self.pid
    }
    fn tgid(&self) -> i32 {
        self.tgid
    }
    fn ppid(&self) -> i32 {
        self.ppid
    }
    fn pgid(&self) -> i32 {
        self.pgid
    }
    fn sid(&self) -> i32 {
        self.sid
    }
    fn uid(&self) -> u32 {
        self.uid
    }
    fn gid(&self) -> u32 {
        self.gid
    }
    fn euid(&self) -> u32 {
        self.euid
    }
    fn egid(&self) -> u32 {
        self.egid
    }
    fn suid(&self) -> u32 {
        self.suid
    }
    fn sgid(&self) -> u32 {
        self.sgid
    }
    fn utsname(&self) -> (&str, &str, &str) {
        (self.release, self.nodename, self.machine)
    }
    fn rlimit_nofile(&self) -> u64 {
        self.rlimit_nofile
    }
    fn rlimit_nproc(&self) -> u64 {
        self.rlimit_nproc
    }
}

#[cfg(test)]
pub struct FakeClock {
    pub monotonic_ns: u64,
    pub wall_ns: u64,
    pub boot_time_ns: u64,
}

#[cfg(test)]
impl Default for FakeClock {
    fn default() -> Self {
        Self {
            monotonic_ns: 123_456_789,
            wall_ns: 1_700_000_000_000_000_000,
            boot_time_ns: 42,
        }
    }
}

#[cfg(test)]
impl ClockSource for FakeClock {
    fn monotonic_ns(&self) -> u64 {
        self.monotonic_ns
    }
    fn wall_ns(&self) -> u64 {
        self.wall_ns
    }
    fn boot_time_ns(&self) -> u64 {
        self.boot_time_ns
    }
}
