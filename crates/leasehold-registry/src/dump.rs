//! Point-in-time listing of a registry's live leases.

use std::fmt;

use leasehold_core::{RegionDescriptor, RegionPolicy};

use crate::stats::StatsSnapshot;

/// One live lease in a [`RegistryDump`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DumpEntry {
    /// Table slot the lease occupies.
    pub slot: usize,
    /// Address, size, and alignment.
    pub descriptor: RegionDescriptor,
    /// Access and contract.
    pub policy: RegionPolicy,
}

/// Snapshot produced by [`LeaseRegistry::dump`](crate::LeaseRegistry::dump).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryDump {
    /// Slot capacity at the time of the dump.
    pub capacity: usize,
    /// Growth ceiling, if the registry has one.
    pub max_capacity: Option<usize>,
    /// Live leases in slot order.
    pub entries: Vec<DumpEntry>,
    /// Owned-allocation counters.
    pub stats: StatsSnapshot,
}

impl RegistryDump {
    /// Sum of sizes over every live lease, owned or not.
    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.descriptor.size()).sum()
    }
}

impl fmt::Display for RegistryDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} live / {} slots", self.entries.len(), self.capacity)?;
        if let Some(max) = self.max_capacity {
            write!(f, " (max {max})")?;
        }
        writeln!(
            f,
            ", {} bytes leased, {} owned bytes (peak {})",
            self.total_bytes(),
            self.stats.live_bytes,
            self.stats.peak_bytes
        )?;
        for e in &self.entries {
            writeln!(
                f,
                "  [{:>4}] {} size={} align={} {}",
                e.slot,
                e.descriptor.address(),
                e.descriptor.size(),
                e.descriptor.alignment(),
                e.policy
            )?;
        }
        Ok(())
    }
}
