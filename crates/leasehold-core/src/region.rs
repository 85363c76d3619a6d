//! The [`RegionDescriptor`]: address, size, and alignment of one span.

use std::fmt;

use crate::address::Address;
use crate::error::LeaseError;

/// The concrete `{address, size, alignment}` triple for one allocated span.
///
/// Construction validates every field, so a descriptor in hand is always
/// non-null, non-empty, power-of-two aligned, and its address honours its
/// alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionDescriptor {
    address: Address,
    size: usize,
    alignment: usize,
}

impl RegionDescriptor {
    /// Validate and build a descriptor.
    ///
    /// Fails with [`LeaseError::InvalidArgument`] if the address is null,
    /// the size is zero, the alignment is not a power of two, or the address
    /// is not a multiple of the alignment.
    pub fn new(address: Address, size: usize, alignment: usize) -> Result<Self, LeaseError> {
        validate_shape(size, alignment)?;
        if address.is_null() {
            return Err(LeaseError::InvalidArgument {
                reason: "region address is null".to_string(),
            });
        }
        if !address.is_aligned_to(alignment) {
            return Err(LeaseError::InvalidArgument {
                reason: format!("address {address} is not aligned to {alignment}"),
            });
        }
        Ok(Self {
            address,
            size,
            alignment,
        })
    }

    /// Start of the region.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Length in bytes. Always greater than zero.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Alignment in bytes. Always a power of two.
    pub fn alignment(&self) -> usize {
        self.alignment
    }
}

impl fmt::Display for RegionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} bytes, align {})",
            self.address, self.size, self.alignment
        )
    }
}

/// Check the `(size, alignment)` pair of an allocation request.
///
/// Shared by descriptor construction and by owned allocation, which has to
/// validate before it has an address.
pub fn validate_shape(size: usize, alignment: usize) -> Result<(), LeaseError> {
    if size == 0 {
        return Err(LeaseError::InvalidArgument {
            reason: "region size is zero".to_string(),
        });
    }
    if !alignment.is_power_of_two() {
        return Err(LeaseError::InvalidArgument {
            reason: format!("alignment {alignment} is not a power of two"),
        });
    }
    Ok(())
}
