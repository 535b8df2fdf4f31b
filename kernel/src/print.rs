// Console print macros for kernel diagnostics.
//
// Module init/fini banners use these, mirroring the rest of the kernel's
// early-boot diagnostics. The request path (create/map) uses log::* instead
// (see drivers::ksvc::config); these macros are never on a hot path.

#[cfg(not(target_os = "none"))]
#[macro_export]
macro_rules! println {
    ($($arg:tt)*) => (std::println!($($arg)*));
}

#[cfg(not(target_os = "none"))]
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => (std::print!($($arg)*));
}

// No bound console device on bare metal in this tree; stubbed like the
// non-x86_64 fallback this macro set already used.
#[cfg(target_os = "none")]
#[macro_export]
macro_rules! println {
    ($($arg:tt)*) => {};
}

#[cfg(target_os = "none")]
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {};
}
