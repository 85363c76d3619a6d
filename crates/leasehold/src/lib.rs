//! Leasehold: an address-keyed allocation registry.
//!
//! Every region handed out or registered is tracked under its start address
//! together with a contract saying who frees it. Owned regions are freed by
//! the registry, borrowed and static ones never are.
//!
//! This is the facade crate re-exporting the public API of the leasehold
//! sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use leasehold::prelude::*;
//!
//! let mut registry = LeaseRegistry::with_capacity(8).unwrap();
//!
//! let a = registry.allocate_owned(64, 8, Access::Global).unwrap();
//! assert_eq!(registry.lookup_policy(a), (Access::Global, Contract::Owned));
//!
//! registry.bytes_mut(a).unwrap()[0] = 0xFF;
//! let b = registry.grow(a, 256, 8).unwrap();
//! assert!(!registry.contains(a));
//! assert_eq!(registry.bytes(b).unwrap()[0], 0xFF);
//!
//! registry.terminate(b).unwrap();
//! // Unregistered addresses report the fallback policy.
//! assert_eq!(registry.lookup_policy(b), (Access::Local, Contract::Borrowed));
//!
//! let report = registry.destroy();
//! assert_eq!(report.total(), 0);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `leasehold-core` | Addresses, policies, descriptors, errors, status codes |
//! | [`table`] | `leasehold-table` | The open-addressing `AddressTable` and key trait |
//! | [`registry`] | `leasehold-registry` | Leases, registries, shared handles, callbacks |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Addresses, policies, region descriptors, and errors (`leasehold-core`).
pub use leasehold_core as types;

/// The open-addressing table (`leasehold-table`).
///
/// [`table::AddressTable`] works for any [`table::TableKey`]: addresses,
/// integers, and strings.
pub use leasehold_table as table;

/// Lease registries (`leasehold-registry`).
///
/// [`registry::LeaseRegistry`] for single-owner use,
/// [`registry::SharedRegistry`] and [`registry::RegistryDomains`] for
/// shared use, [`registry::AllocationCallbacks`] for native allocator hooks.
pub use leasehold_registry as registry;

/// Common imports for typical leasehold usage.
///
/// ```rust
/// use leasehold::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use leasehold_core::{
        Access, Address, Contract, LeaseError, LeaseStatus, RegionDescriptor, RegionPolicy,
    };

    // Registry
    pub use leasehold_registry::{
        AllocationCallbacks, Lease, LeaseRegistry, LeaseRequest, RegistryConfig, RegistryDomains,
        SharedRegistry, TeardownReport,
    };
}
