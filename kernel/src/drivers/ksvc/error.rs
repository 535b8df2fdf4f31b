//! Error taxonomy for the ksvc device surface.

use core::fmt;

pub type Result<T> = core::result::Result<T, KsvcError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KsvcError {
    /// Bad ring sizes, bad map offset/size, or a control/map request before
    /// create.
    InvalidArgument,
    /// A second create on an already-created instance.
    Busy,
    /// A page or bookkeeping allocation failed.
    OutOfMemory,
    /// A copy to or from the caller failed.
    BadAddress,
    /// An unknown control command code.
    NotATty,
    /// A region install reported a host-specific failure.
    NotSupported,
}

impl KsvcError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid argument",
            Self::Busy => "device busy",
            Self::OutOfMemory => "out of memory",
            Self::BadAddress => "bad address",
            Self::NotATty => "not a tty",
            Self::NotSupported => "operation not supported",
        }
    }

    /// Negative errno, matching the host's own numbering since this is the
    /// boundary callers actually observe.
    pub fn to_errno(self) -> i32 {
        match self {
            Self::InvalidArgument => -22, // EINVAL
            Self::Busy => -16,            // EBUSY
            Self::OutOfMemory => -12,     // ENOMEM
            Self::BadAddress => -14,      // EFAULT
            Self::NotATty => -25,         // ENOTTY
            Self::NotSupported => -95,    // EOPNOTSUPP
        }
    }
}

impl fmt::Display for KsvcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<crate::mm::FrameAllocatorError> for KsvcError {
    fn from(_: crate::mm::FrameAllocatorError) -> Self {
        Self::OutOfMemory
    }
}
