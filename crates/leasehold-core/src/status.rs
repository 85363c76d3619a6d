//! C-compatible status codes for the allocator callback surface.
//!
//! [`LeaseStatus`] is a `repr(i32)` enum covering every [`LeaseError`]
//! variant. `Ok` is zero, all errors are negative. Values are ABI-stable.

use crate::error::LeaseError;

/// Status code reported by callback-shaped entry points.
#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LeaseStatus {
    /// Success.
    #[default]
    Ok = 0,
    /// Null, zero-sized, or misaligned input.
    InvalidArgument = -1,
    /// Address already registered.
    Duplicate = -2,
    /// Address not registered.
    NotFound = -3,
    /// Table exhausted.
    Full = -4,
    /// System memory or byte budget exhausted.
    AllocationFailure = -5,
    /// Operation forbidden by the region's contract.
    IllegalOperation = -6,
    /// Internal error (poisoned lock after a prior panic).
    InternalError = -7,
}

impl LeaseStatus {
    /// Whether this is [`LeaseStatus::Ok`].
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Decode a raw status code. Returns `None` for unknown codes.
    pub fn from_code(code: i32) -> Option<Self> {
        let status = match code {
            0 => Self::Ok,
            -1 => Self::InvalidArgument,
            -2 => Self::Duplicate,
            -3 => Self::NotFound,
            -4 => Self::Full,
            -5 => Self::AllocationFailure,
            -6 => Self::IllegalOperation,
            -7 => Self::InternalError,
            _ => return None,
        };
        Some(status)
    }

    /// Status of a completed call.
    pub fn of<T>(result: &Result<T, LeaseError>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(e) => Self::from(e),
        }
    }
}

impl From<&LeaseError> for LeaseStatus {
    fn from(e: &LeaseError) -> Self {
        match e {
            LeaseError::InvalidArgument { .. } => Self::InvalidArgument,
            LeaseError::Duplicate { .. } => Self::Duplicate,
            LeaseError::NotFound { .. } => Self::NotFound,
            LeaseError::Full { .. } => Self::Full,
            LeaseError::AllocationFailure { .. } | LeaseError::TableAllocationFailure { .. } => {
                Self::AllocationFailure
            }
            LeaseError::IllegalOperation { .. } => Self::IllegalOperation,
            LeaseError::Poisoned => Self::InternalError,
        }
    }
}

impl From<LeaseStatus> for i32 {
    fn from(s: LeaseStatus) -> i32 {
        s as i32
    }
}
