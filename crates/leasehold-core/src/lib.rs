//! Core types for the leasehold ownership allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the table and the registry: runtime addresses,
//! region policies and descriptors, error types, and ABI status codes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod address;
pub mod error;
pub mod policy;
pub mod region;
pub mod status;

pub use address::Address;
pub use error::{LeaseError, TableError};
pub use policy::{Access, Contract, RegionPolicy};
pub use region::RegionDescriptor;
pub use status::LeaseStatus;
