//! Process exit codes
//!
//! Scripts branch on these values, so a code never changes meaning once
//! released. Core errors map onto them in one place, [`From<&Error>`].

use osync_core::Error;

/// Exit status of an osync invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Anything not covered below (local IO, serialization)
    GeneralError = 1,

    /// Bad arguments, configuration, key or path
    UsageError = 2,

    /// The store could not be reached or a listing failed
    NetworkError = 3,

    /// Credentials were rejected
    AuthError = 4,

    /// Bucket or object does not exist
    NotFound = 5,

    /// Some transfers in a folder operation failed while others succeeded
    PartialFailure = 6,

    /// Ctrl+C or `--timeout` stopped the operation
    Interrupted = 130,
}

impl ExitCode {
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(error: &Error) -> Self {
        match error.root() {
            Error::InvalidPath(_) | Error::Config(_) | Error::InvalidUrl(_) => Self::UsageError,
            Error::Network(_) | Error::Listing(_) => Self::NetworkError,
            Error::Auth(_) => Self::AuthError,
            Error::NotFound(_) => Self::NotFound,
            Error::PartialTransfer(_) => Self::PartialFailure,
            Error::Cancelled => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}
