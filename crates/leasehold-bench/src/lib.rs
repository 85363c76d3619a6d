//! Benchmark workloads for the leasehold allocator.
//!
//! Deterministic, seeded generators shared by the criterion benches:
//!
//! - [`synthetic_addresses`]: distinct aligned keys for raw table benches
//! - [`churn_workload`]: an allocate / grow / terminate mix
//! - [`run_churn`]: replays a workload against a registry

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::HashSet;

use leasehold_core::{Access, Address, LeaseError};
use leasehold_registry::LeaseRegistry;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// One step of a registry churn workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChurnOp {
    /// Allocate an owned region.
    Allocate {
        /// Bytes requested.
        size: usize,
        /// Power-of-two alignment.
        alignment: usize,
    },
    /// Grow the live region at `index % live`.
    Grow {
        /// Selector into the live set.
        index: usize,
        /// Requested size in bytes.
        new_size: usize,
    },
    /// Terminate the live region at `index % live`.
    Terminate {
        /// Selector into the live set.
        index: usize,
    },
}

/// `count` distinct, non-null addresses aligned to `alignment`.
///
/// Spread over a 2^40 byte range so home slots are well mixed.
pub fn synthetic_addresses(seed: u64, count: usize, alignment: usize) -> Vec<Address> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut seen = HashSet::with_capacity(count);
    let mut out = Vec::with_capacity(count);
    while out.len() < count {
        let raw = (rng.next_u64() as usize & ((1 << 40) - 1)) & !(alignment - 1);
        if raw != 0 && seen.insert(raw) {
            out.push(Address(raw));
        }
    }
    out
}

/// A seeded mix of allocations (50%), growths (20%), and terminations (30%).
pub fn churn_workload(seed: u64, len: usize) -> Vec<ChurnOp> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len)
        .map(|_| {
            let roll = rng.next_u32() % 10;
            let index = rng.next_u32() as usize;
            match roll {
                0..=4 => ChurnOp::Allocate {
                    size: 16 + (rng.next_u32() % 1024) as usize,
                    alignment: 1 << (rng.next_u32() % 7),
                },
                5 | 6 => ChurnOp::Grow {
                    index,
                    new_size: 64 + (rng.next_u32() % 4096) as usize,
                },
                _ => ChurnOp::Terminate { index },
            }
        })
        .collect()
}

/// Replay `ops` against `registry`; returns the addresses still live.
///
/// Grow and terminate steps with no live region are skipped.
pub fn run_churn(registry: &mut LeaseRegistry, ops: &[ChurnOp]) -> Result<Vec<Address>, LeaseError> {
    let mut live: Vec<Address> = Vec::new();
    for op in ops {
        match *op {
            ChurnOp::Allocate { size, alignment } => {
                live.push(registry.allocate_owned(size, alignment, Access::Local)?);
            }
            ChurnOp::Grow { index, new_size } if !live.is_empty() => {
                let i = index % live.len();
                let alignment = registry
                    .descriptor(live[i])
                    .map_or(1, |d| d.alignment());
                live[i] = registry.grow(live[i], new_size, alignment)?;
            }
            ChurnOp::Terminate { index } if !live.is_empty() => {
                let i = index % live.len();
                registry.terminate(live.swap_remove(i))?;
            }
            _ => {}
        }
    }
    Ok(live)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_are_distinct_and_aligned() {
        let addrs = synthetic_addresses(7, 1000, 64);
        assert_eq!(addrs.len(), 1000);
        assert!(addrs.iter().all(|a| !a.is_null() && a.is_aligned_to(64)));
        let unique: HashSet<_> = addrs.iter().collect();
        assert_eq!(unique.len(), 1000);
    }

    #[test]
    fn workload_is_deterministic() {
        assert_eq!(churn_workload(42, 500), churn_workload(42, 500));
        assert_ne!(churn_workload(42, 500), churn_workload(43, 500));
    }

    #[test]
    fn churn_leaves_only_reported_regions_live() {
        let mut registry = LeaseRegistry::with_capacity(4).unwrap();
        let live = run_churn(&mut registry, &churn_workload(1, 2000)).unwrap();
        assert_eq!(registry.len(), live.len());
        assert_eq!(registry.stats().live_regions, live.len());
    }
}
