//! POSIX-facing error taxonomy.

use netfs_proto::HandlerError;
use thiserror::Error;

/// Abstract error kinds a handler can return, mapped to POSIX error codes
/// only at the kernel boundary ([`PosixError::to_errno`]).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosixError {
    /// Maps to `ENOENT`.
    #[error("entity not found")]
    NotFound,

    /// Maps to `EACCES`.
    #[error("permission denied")]
    PermissionDenied,

    /// Maps to `EEXIST`.
    #[error("entity already exists")]
    AlreadyExists,

    /// Maps to `EIO`. Also the landing zone for protocol-level failures:
    /// a malformed frame, a truncated response, or an unexpected reply is
    /// never retried and never surfaced as anything more specific than
    /// "I/O error" to the kernel.
    #[error("I/O error")]
    IoError,

    /// Maps to `ENOMEM`.
    #[error("out of memory")]
    OutOfMemory,
}

impl PosixError {
    /// The `errno` value the kernel should see for this error.
    pub fn to_errno(self) -> i32 {
        match self {
            Self::NotFound => libc::ENOENT,
            Self::PermissionDenied => libc::EACCES,
            Self::AlreadyExists => libc::EEXIST,
            Self::IoError => libc::EIO,
            Self::OutOfMemory => libc::ENOMEM,
        }
    }
}

/// Every `HandlerError` (poisoned client, or the protocol error that
/// poisoned it) surfaces to the kernel as `EIO`: the driver never retries a
/// desynchronised channel and never invents a more specific code for a
/// framing failure.
impl From<HandlerError> for PosixError {
    fn from(_: HandlerError) -> Self {
        Self::IoError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_expected_errno_values() {
        assert_eq!(PosixError::NotFound.to_errno(), libc::ENOENT);
        assert_eq!(PosixError::PermissionDenied.to_errno(), libc::EACCES);
        assert_eq!(PosixError::AlreadyExists.to_errno(), libc::EEXIST);
        assert_eq!(PosixError::IoError.to_errno(), libc::EIO);
        assert_eq!(PosixError::OutOfMemory.to_errno(), libc::ENOMEM);
    }
}
