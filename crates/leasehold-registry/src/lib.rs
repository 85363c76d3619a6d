//! Address-keyed lease registry for the leasehold allocator.
//!
//! A [`LeaseRegistry`] hands out memory regions and tracks who is
//! responsible for each one. This crate is the only one in the workspace
//! that may contain `unsafe` code, confined to `raw.rs`.
//!
//! # Architecture
//!
//! ```text
//! RegistryDomains (named, explicitly constructed)
//! └── SharedRegistry = Arc<RwLock<LeaseRegistry>>
//!     └── LeaseRegistry
//!         ├── AddressTable<Address, Lease>
//!         │   └── Lease::Owned(Box<OwnedRegion>) | Borrowed | Static
//!         ├── RegistryConfig (capacity ceiling, byte budget)
//!         └── Arc<AllocStats> (shared by every OwnedRegion it created)
//! AllocationCallbacks ── allocate / grow / terminate / lookup over a SharedRegistry
//! ```
//!
//! # Contracts
//!
//! - **Owned:** the registry allocated the region and frees it exactly once,
//!   when the lease is dropped.
//! - **Borrowed:** foreign memory; releasing the lease never frees it.
//! - **Static:** program-lifetime memory; never freed.
//!
//! Which of these applies is decided by the [`Lease`] variant, so teardown
//! cannot free a borrowed address.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod callbacks;
pub mod config;
pub mod dump;
pub mod lease;
mod raw;
pub mod registry;
pub mod shared;
pub mod stats;

pub use callbacks::AllocationCallbacks;
pub use config::RegistryConfig;
pub use dump::{DumpEntry, RegistryDump};
pub use lease::{Lease, LeaseRequest};
pub use raw::OwnedRegion;
pub use registry::{LeaseRegistry, TeardownReport};
pub use shared::{RegistryDomains, SharedRegistry};
pub use stats::{AllocStats, StatsSnapshot};
