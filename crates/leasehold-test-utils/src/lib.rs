//! Test utilities for leasehold development.
//!
//! Provides real foreign memory to register as borrowed or static
//! ([`AlignedBuffer`], [`static_region`]), address generators that force
//! probe collisions ([`colliding_addresses`]), and registry builders.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{static_region, AlignedBuffer};

use leasehold_core::{Access, Address};
use leasehold_registry::{LeaseRegistry, RegistryConfig, SharedRegistry};

/// Addresses that all share one home slot in a table of `capacity` slots.
///
/// The probe start depends only on `address mod capacity`, so addresses a
/// multiple of `capacity` apart collide. Each result is aligned to
/// `alignment` when `base` is.
pub fn colliding_addresses(
    base: Address,
    capacity: usize,
    count: usize,
    alignment: usize,
) -> Vec<Address> {
    let step = capacity * alignment;
    (0..count).map(|i| Address(base.get() + i * step)).collect()
}

/// Unbounded registry with `capacity` initial slots.
pub fn registry(capacity: usize) -> LeaseRegistry {
    LeaseRegistry::with_capacity(capacity).unwrap()
}

/// Registry that never grows past `capacity` slots.
pub fn bounded_registry(capacity: usize) -> LeaseRegistry {
    LeaseRegistry::new(RegistryConfig::new(capacity).with_max_capacity(capacity)).unwrap()
}

/// Registry whose owned allocations stop at `bytes` live bytes.
pub fn budgeted_registry(bytes: usize) -> LeaseRegistry {
    LeaseRegistry::new(RegistryConfig::default().with_byte_budget(bytes)).unwrap()
}

/// Shared registry with default configuration.
pub fn shared_registry() -> SharedRegistry {
    SharedRegistry::new(RegistryConfig::default()).unwrap()
}

/// Allocate `count` owned regions of `size` bytes, `Local` access.
pub fn populate_owned(
    registry: &mut LeaseRegistry,
    count: usize,
    size: usize,
    alignment: usize,
) -> Vec<Address> {
    (0..count)
        .map(|_| {
            registry
                .allocate_owned(size, alignment, Access::Local)
                .unwrap()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colliding_addresses_are_aligned_and_distinct() {
        let addrs = colliding_addresses(Address(0x1000), 8, 4, 16);
        assert_eq!(addrs.len(), 4);
        for a in &addrs {
            assert!(a.is_aligned_to(16));
            assert_eq!(a.get() % 8, 0x1000 % 8);
        }
        assert_eq!(addrs[1].get() - addrs[0].get(), 128);
    }

    #[test]
    fn populate_registers_all() {
        let mut r = registry(2);
        let addrs = populate_owned(&mut r, 10, 8, 8);
        assert_eq!(r.len(), 10);
        assert!(addrs.iter().all(|a| r.contains(*a)));
    }
}
