//! Leases and lease requests.
//!
//! A [`Lease`] pairs a region with its policy. The contract is the enum
//! variant: only [`Lease::Owned`] holds memory that dropping the lease frees.

use leasehold_core::{Access, Address, Contract, LeaseError, RegionDescriptor, RegionPolicy};

use crate::raw::OwnedRegion;

/// The unit of tracked ownership for one live region.
///
/// Never cloned and never stored under two keys. Destroyed exactly once:
/// by termination, by registry teardown, or by whoever took it out of a
/// registry with [`LeaseRegistry::take`](crate::LeaseRegistry::take).
#[derive(Debug)]
pub enum Lease {
    /// Allocated by a registry; the region is freed when the lease drops.
    Owned {
        /// Scope classification.
        access: Access,
        /// The backing allocation.
        region: Box<OwnedRegion>,
    },
    /// Foreign memory, never freed by the registry.
    Borrowed {
        /// Scope classification.
        access: Access,
        /// Where the foreign region lives.
        region: RegionDescriptor,
    },
    /// Program-lifetime memory, never freed.
    Static {
        /// Scope classification.
        access: Access,
        /// Where the static region lives.
        region: RegionDescriptor,
    },
}

impl Lease {
    /// Lease over a foreign region.
    pub fn borrowed(access: Access, region: RegionDescriptor) -> Self {
        Self::Borrowed { access, region }
    }

    /// Lease over a program-lifetime region.
    pub fn static_lifetime(access: Access, region: RegionDescriptor) -> Self {
        Self::Static { access, region }
    }

    /// The region's start address (its registry key).
    pub fn address(&self) -> Address {
        self.descriptor().address()
    }

    /// Address, size, and alignment.
    pub fn descriptor(&self) -> RegionDescriptor {
        match self {
            Self::Owned { region, .. } => region.descriptor(),
            Self::Borrowed { region, .. } | Self::Static { region, .. } => *region,
        }
    }

    /// Scope classification.
    pub fn access(&self) -> Access {
        match self {
            Self::Owned { access, .. }
            | Self::Borrowed { access, .. }
            | Self::Static { access, .. } => *access,
        }
    }

    /// Freeing responsibility, derived from the variant.
    pub fn contract(&self) -> Contract {
        match self {
            Self::Owned { .. } => Contract::Owned,
            Self::Borrowed { .. } => Contract::Borrowed,
            Self::Static { .. } => Contract::Static,
        }
    }

    /// `(access, contract)`.
    pub fn policy(&self) -> RegionPolicy {
        RegionPolicy::new(self.access(), self.contract())
    }

    /// The backing allocation, for owned leases.
    pub fn owned_region(&self) -> Option<&OwnedRegion> {
        match self {
            Self::Owned { region, .. } => Some(&**region),
            _ => None,
        }
    }

    /// The backing allocation, mutably, for owned leases.
    pub fn owned_region_mut(&mut self) -> Option<&mut OwnedRegion> {
        match self {
            Self::Owned { region, .. } => Some(&mut **region),
            _ => None,
        }
    }
}

/// What to register: a fresh owned allocation, or a caller-supplied region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaseRequest {
    /// Allocate `size` bytes aligned to `alignment`.
    Owned {
        /// Bytes to allocate.
        size: usize,
        /// Power-of-two alignment.
        alignment: usize,
        /// Scope classification.
        access: Access,
    },
    /// Register foreign memory without allocating.
    Borrowed {
        /// The foreign region.
        region: RegionDescriptor,
        /// Scope classification.
        access: Access,
    },
    /// Register program-lifetime memory without allocating.
    Static {
        /// The static region.
        region: RegionDescriptor,
        /// Scope classification.
        access: Access,
    },
}

impl LeaseRequest {
    /// An owned allocation with `Local` access.
    pub fn owned(size: usize, alignment: usize) -> Self {
        Self::Owned {
            size,
            alignment,
            access: Access::Local,
        }
    }

    /// A borrowed registration with `Local` access.
    ///
    /// Validates the region (non-null, non-empty, aligned).
    pub fn borrowed(address: Address, size: usize, alignment: usize) -> Result<Self, LeaseError> {
        Ok(Self::Borrowed {
            region: RegionDescriptor::new(address, size, alignment)?,
            access: Access::Local,
        })
    }

    /// A static registration with `Static` access.
    pub fn static_lifetime(
        address: Address,
        size: usize,
        alignment: usize,
    ) -> Result<Self, LeaseError> {
        Ok(Self::Static {
            region: RegionDescriptor::new(address, size, alignment)?,
            access: Access::Static,
        })
    }

    /// Build a request from a policy.
    ///
    /// Owned policies must not carry an address; borrowed and static ones
    /// must.
    pub fn from_policy(
        policy: RegionPolicy,
        address: Option<Address>,
        size: usize,
        alignment: usize,
    ) -> Result<Self, LeaseError> {
        let request = match (policy.contract, address) {
            (Contract::Owned, None) => Self::owned(size, alignment),
            (Contract::Owned, Some(address)) => {
                return Err(LeaseError::InvalidArgument {
                    reason: format!("owned request supplied address {address}"),
                })
            }
            (Contract::Borrowed, Some(address)) => Self::borrowed(address, size, alignment)?,
            (Contract::Static, Some(address)) => Self::static_lifetime(address, size, alignment)?,
            (contract, None) => {
                return Err(LeaseError::InvalidArgument {
                    reason: format!("{contract} request needs a caller-supplied address"),
                })
            }
        };
        Ok(request.with_access(policy.access))
    }

    /// Replace the access classification.
    pub fn with_access(self, access: Access) -> Self {
        match self {
            Self::Owned {
                size, alignment, ..
            } => Self::Owned {
                size,
                alignment,
                access,
            },
            Self::Borrowed { region, .. } => Self::Borrowed { region, access },
            Self::Static { region, .. } => Self::Static { region, access },
        }
    }

    /// The contract the resulting lease will carry.
    pub fn contract(&self) -> Contract {
        match self {
            Self::Owned { .. } => Contract::Owned,
            Self::Borrowed { .. } => Contract::Borrowed,
            Self::Static { .. } => Contract::Static,
        }
    }

    /// Requested size in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::Owned { size, .. } => *size,
            Self::Borrowed { region, .. } | Self::Static { region, .. } => region.size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> RegionDescriptor {
        RegionDescriptor::new(Address(0x4000), 128, 16).unwrap()
    }

    #[test]
    fn variant_decides_contract() {
        assert_eq!(Lease::borrowed(Access::Global, region()).contract(), Contract::Borrowed);
        assert_eq!(
            Lease::static_lifetime(Access::Static, region()).contract(),
            Contract::Static
        );
    }

    #[test]
    fn policy_combines_access_and_contract() {
        let lease = Lease::borrowed(Access::Global, region());
        assert_eq!(lease.policy(), RegionPolicy::borrowed(Access::Global));
        assert_eq!(lease.address(), Address(0x4000));
        assert!(lease.owned_region().is_none());
    }

    #[test]
    fn from_policy_owned_rejects_address() {
        let r = LeaseRequest::from_policy(
            RegionPolicy::owned(Access::Local),
            Some(Address(0x40)),
            8,
            8,
        );
        assert!(matches!(r, Err(LeaseError::InvalidArgument { .. })));
    }

    #[test]
    fn from_policy_borrowed_needs_address() {
        let r = LeaseRequest::from_policy(RegionPolicy::borrowed(Access::Local), None, 8, 8);
        assert!(matches!(r, Err(LeaseError::InvalidArgument { .. })));
    }

    #[test]
    fn from_policy_keeps_access() {
        let r = LeaseRequest::from_policy(
            RegionPolicy::static_lifetime(Access::Global),
            Some(Address(0x40)),
            8,
            8,
        )
        .unwrap();
        assert_eq!(r.contract(), Contract::Static);
        assert!(matches!(
            r,
            LeaseRequest::Static {
                access: Access::Global,
                ..
            }
        ));
    }

    #[test]
    fn borrowed_request_validates_region() {
        assert!(LeaseRequest::borrowed(Address::NULL, 8, 8).is_err());
        assert!(LeaseRequest::borrowed(Address(0x41), 8, 8).is_err());
        assert_eq!(LeaseRequest::borrowed(Address(0x40), 8, 8).unwrap().size(), 8);
    }
}
