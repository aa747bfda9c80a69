//! Error taxonomy and the integer status codes used across the C ABI.

use thiserror::Error;

// Status codes (returned by fallible C entry points)
pub const NG_SUCCESS: i32 = 0;
pub const NG_ERROR_INVALID_HANDLE: i32 = -1;
pub const NG_ERROR_INVALID_PARAMETER: i32 = -2;
pub const NG_ERROR_PLATFORM_SPECIFIC: i32 = -3;
pub const NG_ERROR_CREATION_FAILED: i32 = -4;
pub const NG_ERROR_UNSUPPORTED: i32 = -5;

/// Errors reported by dispatch facade operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NgError {
    /// NULL, destroyed, or wrong-kind handle passed to an operation.
    #[error("invalid handle")]
    InvalidHandle,

    /// Malformed argument (NULL title, out-of-range index, bad grab mode).
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// The backend call failed for a reason opaque to this layer.
    #[error("platform error: {0}")]
    PlatformSpecific(String),

    /// Native object construction failed.
    #[error("failed to create {0}")]
    CreationFailed(&'static str),

    /// The active backend does not implement the operation.
    #[error("operation `{0}` is not supported by the active backend")]
    Unsupported(&'static str),
}

pub type NgResult<T> = Result<T, NgError>;

impl NgError {
    /// Integer status code for the C ABI.
    pub fn code(&self) -> i32 {
        match self {
            NgError::InvalidHandle => NG_ERROR_INVALID_HANDLE,
            NgError::InvalidParameter(_) => NG_ERROR_INVALID_PARAMETER,
            NgError::PlatformSpecific(_) => NG_ERROR_PLATFORM_SPECIFIC,
            NgError::CreationFailed(_) => NG_ERROR_CREATION_FAILED,
            NgError::Unsupported(_) => NG_ERROR_UNSUPPORTED,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, NgError::Unsupported(_))
    }
}

/// Collapse a unit result into a status code.
pub fn status(result: NgResult<()>) -> i32 {
    match result {
        Ok(()) => NG_SUCCESS,
        Err(e) => e.code(),
    }
}
