//! Error types for the leasehold allocator.
//!
//! Organised by subsystem: [`TableError`] for the open-addressing table,
//! [`LeaseError`] for registry operations. Every failure is returned as a
//! value; none of them leave the table or registry in a partial state.

use std::error::Error;
use std::fmt;

use crate::address::Address;
use crate::policy::Contract;

/// Errors from `AddressTable` operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableError {
    /// A null key, or a resize target not larger than the current size.
    InvalidArgument {
        /// What was wrong with the call.
        reason: &'static str,
    },
    /// The key is already present; nothing was inserted.
    Duplicate,
    /// The key is absent.
    NotFound,
    /// A full probe sweep found neither an empty nor a matching slot.
    Full {
        /// Slot capacity at the time of the failure.
        capacity: usize,
    },
    /// The slot array could not be allocated.
    AllocationFailure {
        /// Number of slots requested.
        requested_slots: usize,
    },
}

impl TableError {
    /// Attach the address a registry was operating on.
    pub fn at(self, address: Address) -> LeaseError {
        match self {
            Self::InvalidArgument { reason } => LeaseError::InvalidArgument {
                reason: reason.to_string(),
            },
            Self::Duplicate => LeaseError::Duplicate { address },
            Self::NotFound => LeaseError::NotFound { address },
            Self::Full { capacity } => LeaseError::Full { capacity },
            Self::AllocationFailure { requested_slots } => LeaseError::TableAllocationFailure {
                slots: requested_slots,
            },
        }
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::Duplicate => write!(f, "key already present"),
            Self::NotFound => write!(f, "key not found"),
            Self::Full { capacity } => write!(f, "table full ({capacity} slots)"),
            Self::AllocationFailure { requested_slots } => {
                write!(f, "could not allocate {requested_slots} table slots")
            }
        }
    }
}

impl Error for TableError {}

/// Errors from lease registry operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaseError {
    /// Null, zero-sized, or misaligned input.
    InvalidArgument {
        /// Human-readable description.
        reason: String,
    },
    /// The address is already registered.
    Duplicate {
        /// The conflicting address.
        address: Address,
    },
    /// The address is not registered.
    NotFound {
        /// The missing address.
        address: Address,
    },
    /// The registry's table exhausted every probe.
    Full {
        /// Slot capacity at the time of the failure.
        capacity: usize,
    },
    /// System memory (or the configured byte budget) is exhausted for a
    /// region.
    AllocationFailure {
        /// Bytes requested.
        size: usize,
        /// Alignment requested.
        alignment: usize,
    },
    /// The registry's slot array could not grow.
    TableAllocationFailure {
        /// Slots requested.
        slots: usize,
    },
    /// The operation is not permitted under the lease's contract,
    /// e.g. growing a borrowed region.
    IllegalOperation {
        /// The address operated on.
        address: Address,
        /// The contract that forbids it.
        contract: Contract,
    },
    /// A shared registry's lock was poisoned by a panicking holder.
    Poisoned,
}

impl fmt::Display for LeaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::Duplicate { address } => write!(f, "address {address} already registered"),
            Self::NotFound { address } => write!(f, "address {address} not registered"),
            Self::Full { capacity } => write!(f, "registry full ({capacity} slots)"),
            Self::AllocationFailure { size, alignment } => {
                write!(f, "could not allocate {size} bytes aligned to {alignment}")
            }
            Self::TableAllocationFailure { slots } => {
                write!(f, "could not allocate {slots} table slots")
            }
            Self::IllegalOperation { address, contract } => {
                write!(f, "operation not permitted on {contract} region {address}")
            }
            Self::Poisoned => write!(f, "registry lock poisoned"),
        }
    }
}

impl Error for LeaseError {}

/// Address-free conversion; keyed variants report [`Address::NULL`].
/// Prefer [`TableError::at`] when the address is known.
impl From<TableError> for LeaseError {
    fn from(e: TableError) -> Self {
        e.at(Address::NULL)
    }
}
