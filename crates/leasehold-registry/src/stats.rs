//! Allocation counters for owned regions.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Live counters shared by every [`OwnedRegion`](crate::OwnedRegion) a
/// registry allocates.
///
/// Each region holds an `Arc` to the counters of the registry that created
/// it and records its own release on drop, so the counts stay accurate after
/// transfers and after the registry itself is gone.
#[derive(Debug, Default)]
pub struct AllocStats {
    allocations: AtomicUsize,
    releases: AtomicUsize,
    live_bytes: AtomicUsize,
    peak_bytes: AtomicUsize,
}

impl AllocStats {
    /// Fresh, zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_allocation(&self, size: usize) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        let live = self.live_bytes.fetch_add(size, Ordering::Relaxed) + size;
        self.peak_bytes.fetch_max(live, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self, size: usize) {
        self.releases.fetch_add(1, Ordering::Relaxed);
        self.live_bytes.fetch_sub(size, Ordering::Relaxed);
    }

    /// Bytes currently held by live owned regions.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        let allocations = self.allocations.load(Ordering::Relaxed);
        let releases = self.releases.load(Ordering::Relaxed);
        StatsSnapshot {
            allocations,
            releases,
            live_regions: allocations.saturating_sub(releases),
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
            peak_bytes: self.peak_bytes.load(Ordering::Relaxed),
        }
    }
}

/// Copy of [`AllocStats`] at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Owned regions ever allocated.
    pub allocations: usize,
    /// Owned regions ever released.
    pub releases: usize,
    /// `allocations - releases`.
    pub live_regions: usize,
    /// Bytes held by live owned regions.
    pub live_bytes: usize,
    /// High-water mark of `live_bytes`.
    pub peak_bytes: usize,
}
