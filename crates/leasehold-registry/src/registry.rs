//! The [`LeaseRegistry`]: allocate, look up, grow, transfer, and release.

use std::sync::Arc;

use leasehold_core::region::validate_shape;
use leasehold_core::{
    Access, Address, Contract, LeaseError, RegionDescriptor, RegionPolicy,
};
use leasehold_table::AddressTable;
use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::dump::{DumpEntry, RegistryDump};
use crate::lease::{Lease, LeaseRequest};
use crate::raw::OwnedRegion;
use crate::stats::{AllocStats, StatsSnapshot};

/// What a teardown released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Owned leases released (their memory freed).
    pub owned: usize,
    /// Borrowed leases released (memory untouched).
    pub borrowed: usize,
    /// Static leases released (memory untouched).
    pub static_leases: usize,
    /// Bytes returned to the system allocator.
    pub bytes_freed: usize,
}

impl TeardownReport {
    /// Total leases released.
    pub fn total(&self) -> usize {
        self.owned + self.borrowed + self.static_leases
    }

    fn record(&mut self, lease: &Lease) {
        let contract = lease.contract();
        match contract {
            Contract::Owned => self.owned += 1,
            Contract::Borrowed => self.borrowed += 1,
            Contract::Static => self.static_leases += 1,
        }
        if contract.frees_backing() {
            self.bytes_freed += lease.descriptor().size();
        }
    }
}

/// Address-keyed table of live leases for one allocation domain.
///
/// At most one lease per address. Every mutating call either completes or
/// leaves the registry exactly as it was: failed registrations release what
/// they allocated, failed growth keeps the old region authoritative, failed
/// transfers leave both registries unchanged.
///
/// Dropping a registry releases every lease it holds, honouring each
/// contract; [`LeaseRegistry::destroy`] does the same and reports what it
/// released.
#[derive(Debug)]
pub struct LeaseRegistry {
    table: AddressTable<Address, Lease>,
    config: RegistryConfig,
    stats: Arc<AllocStats>,
}

impl LeaseRegistry {
    /// Create a registry from a validated configuration.
    pub fn new(config: RegistryConfig) -> Result<Self, LeaseError> {
        config.validate()?;
        let table = AddressTable::with_config(&config.table_config())?;
        Ok(Self {
            table,
            config,
            stats: Arc::new(AllocStats::new()),
        })
    }

    /// Create an unbounded registry with `capacity` initial slots.
    pub fn with_capacity(capacity: usize) -> Result<Self, LeaseError> {
        Self::new(RegistryConfig::new(capacity))
    }

    /// Number of live leases.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no leases are live.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Current slot capacity.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Snapshot of the owned-allocation counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// The live counters themselves. They outlive the registry, which makes
    /// them the way to observe that teardown freed everything.
    pub fn shared_stats(&self) -> Arc<AllocStats> {
        Arc::clone(&self.stats)
    }

    // ── registration ───────────────────────────────────────────────

    /// Register a region and return its address.
    ///
    /// Owned requests allocate zeroed memory first; borrowed and static
    /// requests register the caller's region as-is. If the table rejects the
    /// address (duplicate, full, growth failure) the new lease is released
    /// immediately, freeing any owned memory, and nothing is registered.
    pub fn allocate(&mut self, request: LeaseRequest) -> Result<Address, LeaseError> {
        let lease = match request {
            LeaseRequest::Owned {
                size,
                alignment,
                access,
            } => {
                validate_shape(size, alignment)?;
                self.check_budget(size, alignment)?;
                let region = OwnedRegion::allocate(size, alignment, &self.stats)?;
                Lease::Owned {
                    access,
                    region: Box::new(region),
                }
            }
            LeaseRequest::Borrowed { region, access } => Lease::Borrowed { access, region },
            LeaseRequest::Static { region, access } => Lease::Static { access, region },
        };
        self.register(lease)
    }

    /// Allocate an owned region.
    pub fn allocate_owned(
        &mut self,
        size: usize,
        alignment: usize,
        access: Access,
    ) -> Result<Address, LeaseError> {
        self.allocate(LeaseRequest::owned(size, alignment).with_access(access))
    }

    /// Register foreign memory the registry must never free.
    pub fn register_borrowed(
        &mut self,
        address: Address,
        size: usize,
        alignment: usize,
        access: Access,
    ) -> Result<Address, LeaseError> {
        self.allocate(LeaseRequest::borrowed(address, size, alignment)?.with_access(access))
    }

    /// Register program-lifetime memory.
    pub fn register_static(
        &mut self,
        address: Address,
        size: usize,
        alignment: usize,
        access: Access,
    ) -> Result<Address, LeaseError> {
        self.allocate(LeaseRequest::static_lifetime(address, size, alignment)?.with_access(access))
    }

    /// Register a lease taken from elsewhere (usually another registry's
    /// [`LeaseRegistry::take`]).
    ///
    /// On failure the lease is released according to its contract.
    pub fn adopt(&mut self, lease: Lease) -> Result<Address, LeaseError> {
        self.register(lease)
    }

    fn register(&mut self, lease: Lease) -> Result<Address, LeaseError> {
        let address = lease.address();
        let size = lease.descriptor().size();
        let contract = lease.contract();
        match self.table.try_insert(address, lease) {
            Ok(()) => {
                debug!(%address, size, %contract, "lease registered");
                Ok(address)
            }
            Err(rejected) => {
                warn!(
                    %address,
                    size,
                    %contract,
                    error = %rejected.error,
                    "registration rejected; lease released"
                );
                drop(rejected.value);
                Err(rejected.error.at(address))
            }
        }
    }

    fn check_budget(&self, size: usize, alignment: usize) -> Result<(), LeaseError> {
        if let Some(budget) = self.config.byte_budget {
            if self.stats.live_bytes().saturating_add(size) > budget {
                return Err(LeaseError::AllocationFailure { size, alignment });
            }
        }
        Ok(())
    }

    // ── lookup ─────────────────────────────────────────────────────

    /// Whether `address` is registered.
    pub fn contains(&self, address: Address) -> bool {
        self.table.contains(&address)
    }

    /// The lease registered at `address`.
    pub fn lease(&self, address: Address) -> Option<&Lease> {
        self.table.get(&address)
    }

    /// The descriptor registered at `address`.
    pub fn descriptor(&self, address: Address) -> Option<RegionDescriptor> {
        self.lease(address).map(Lease::descriptor)
    }

    /// The policy at `address`, or [`RegionPolicy::FALLBACK`] if unregistered.
    ///
    /// The fallback makes "unregistered" look like "borrowed, local". Pair
    /// with [`LeaseRegistry::contains`] where the difference matters.
    pub fn policy(&self, address: Address) -> RegionPolicy {
        self.lease(address)
            .map_or(RegionPolicy::FALLBACK, Lease::policy)
    }

    /// Access at `address`, or `Local` if unregistered.
    pub fn access(&self, address: Address) -> Access {
        self.policy(address).access
    }

    /// Contract at `address`, or `Borrowed` if unregistered.
    pub fn contract(&self, address: Address) -> Contract {
        self.policy(address).contract
    }

    /// `(access, contract)` at `address`, with the same fallback as
    /// [`LeaseRegistry::policy`].
    pub fn lookup_policy(&self, address: Address) -> (Access, Contract) {
        let p = self.policy(address);
        (p.access, p.contract)
    }

    /// Contents of the owned region at `address`. `None` for borrowed,
    /// static, or unregistered addresses.
    pub fn bytes(&self, address: Address) -> Option<&[u8]> {
        self.lease(address)?.owned_region().map(OwnedRegion::bytes)
    }

    /// Mutable contents of the owned region at `address`.
    pub fn bytes_mut(&mut self, address: Address) -> Option<&mut [u8]> {
        self.table
            .get_mut(&address)?
            .owned_region_mut()
            .map(OwnedRegion::bytes_mut)
    }

    /// Pointer to the owned region at `address`, for foreign callers.
    pub fn owned_ptr(&self, address: Address) -> Option<std::ptr::NonNull<u8>> {
        self.lease(address)?.owned_region().map(OwnedRegion::as_ptr)
    }

    /// Iterate over `(address, lease)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Address, &Lease)> {
        self.table.iter().map(|(a, l)| (*a, l))
    }

    // ── growth ─────────────────────────────────────────────────────

    /// Grow the owned region at `address` to at least `new_size` bytes.
    ///
    /// Returns the address now holding the data. If the region is already
    /// `new_size` bytes or larger and `address` meets `alignment`, this is a
    /// no-op returning `address`. Otherwise a region of
    /// `max(new_size, current size)` bytes at `alignment` is allocated, the
    /// old bytes copied in, and the
    /// registry entry moved from the old address to the new one before the
    /// old region is freed. If the move fails, the new region is freed and
    /// the old entry stays authoritative.
    ///
    /// Borrowed and static regions cannot be grown (`IllegalOperation`).
    pub fn grow(
        &mut self,
        address: Address,
        new_size: usize,
        alignment: usize,
    ) -> Result<Address, LeaseError> {
        let lease = self
            .table
            .get(&address)
            .ok_or(LeaseError::NotFound { address })?;
        let Lease::Owned { access, region } = lease else {
            return Err(LeaseError::IllegalOperation {
                address,
                contract: lease.contract(),
            });
        };
        validate_shape(new_size, alignment)?;
        if new_size <= region.size() && address.is_aligned_to(alignment) {
            return Ok(address);
        }

        let access = *access;
        let target = new_size.max(region.size());
        self.check_budget(target, alignment)?;
        let mut fresh = OwnedRegion::allocate(target, alignment, &self.stats)?;
        let copied = fresh.copy_prefix_from(region);
        let new_address = fresh.address();

        let replacement = Lease::Owned {
            access,
            region: Box::new(fresh),
        };
        match self.table.replace_entry(&address, new_address, replacement) {
            Ok(old) => {
                debug!(%address, %new_address, size = target, copied, "owned region grown");
                drop(old);
                Ok(new_address)
            }
            Err(rejected) => {
                warn!(
                    %address,
                    %new_address,
                    error = %rejected.error,
                    "growth rolled back; new region released"
                );
                Err(rejected.error.at(new_address))
            }
        }
    }

    // ── transfer ───────────────────────────────────────────────────

    /// Remove the lease at `address` without releasing it.
    ///
    /// Ownership of the lease (and, for owned leases, the memory) moves to
    /// the caller.
    pub fn take(&mut self, address: Address) -> Result<Lease, LeaseError> {
        let lease = self.table.remove(&address).map_err(|e| e.at(address))?;
        debug!(%address, contract = %lease.contract(), "lease taken");
        Ok(lease)
    }

    /// Move the lease at `address` from `from` to `to` without copying or
    /// freeing memory.
    ///
    /// Fails with `NotFound` if `from` does not hold the address and with
    /// `Duplicate` if `to` already does. On any failure both registries are
    /// left unchanged.
    pub fn transfer(
        from: &mut LeaseRegistry,
        to: &mut LeaseRegistry,
        address: Address,
    ) -> Result<(), LeaseError> {
        if !from.contains(address) {
            return Err(LeaseError::NotFound { address });
        }
        if to.contains(address) {
            return Err(LeaseError::Duplicate { address });
        }
        let (key, lease) = from
            .table
            .remove_entry(&address)
            .map_err(|e| e.at(address))?;
        match to.table.try_insert(key, lease) {
            Ok(()) => {
                debug!(%address, "lease transferred");
                Ok(())
            }
            Err(rejected) => {
                let error = rejected.error.at(address);
                if let Err(lost) = from
                    .table
                    .insert_within_capacity(rejected.key, rejected.value)
                {
                    warn!(%address, error = %lost.error, "transfer rollback failed; lease released");
                }
                Err(error)
            }
        }
    }

    /// Move the lease at `address` from this registry to `to`.
    pub fn transfer_to(&mut self, to: &mut LeaseRegistry, address: Address) -> Result<(), LeaseError> {
        Self::transfer(self, to, address)
    }

    // ── release ────────────────────────────────────────────────────

    /// Release the lease at `address`.
    ///
    /// Owned regions are freed; borrowed and static regions are left alone.
    /// The lease's own bookkeeping is always dropped.
    pub fn terminate(&mut self, address: Address) -> Result<(), LeaseError> {
        let lease = self.table.remove(&address).map_err(|e| e.at(address))?;
        let contract = lease.contract();
        drop(lease);
        debug!(%address, %contract, "lease terminated");
        Ok(())
    }

    /// Release every lease, keeping the registry usable.
    pub fn clear(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        for (_, lease) in self.table.drain() {
            report.record(&lease);
        }
        if report.total() > 0 {
            debug!(
                owned = report.owned,
                borrowed = report.borrowed,
                static_leases = report.static_leases,
                bytes_freed = report.bytes_freed,
                "registry cleared"
            );
        }
        report
    }

    /// Release every lease and free the registry itself.
    pub fn destroy(mut self) -> TeardownReport {
        self.clear()
    }

    // ── diagnostics ────────────────────────────────────────────────

    /// Snapshot of every live lease, in slot order.
    pub fn dump(&self) -> RegistryDump {
        RegistryDump {
            capacity: self.table.capacity(),
            max_capacity: self.table.max_capacity(),
            entries: self
                .table
                .iter_slots()
                .map(|(slot, _, lease)| DumpEntry {
                    slot,
                    descriptor: lease.descriptor(),
                    policy: lease.policy(),
                })
                .collect(),
            stats: self.stats(),
        }
    }

    /// Emit one `debug` event per live lease.
    pub fn log_dump(&self) {
        let dump = self.dump();
        debug!(
            live = dump.entries.len(),
            capacity = dump.capacity,
            live_bytes = dump.stats.live_bytes,
            "registry dump"
        );
        for entry in &dump.entries {
            debug!(
                slot = entry.slot,
                address = %entry.descriptor.address(),
                size = entry.descriptor.size(),
                alignment = entry.descriptor.alignment(),
                policy = %entry.policy,
                "live lease"
            );
        }
    }
}
