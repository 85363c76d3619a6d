//! Thread-safe registry handles and named allocation domains.
//!
//! [`SharedRegistry`] puts one [`LeaseRegistry`] behind an `RwLock`: every
//! mutation holds the write lock for the whole call, lookups take the read
//! lock. [`RegistryDomains`] groups shared registries under names, so there
//! is no process-wide default registry.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;
use leasehold_core::{Access, Address, Contract, LeaseError, RegionDescriptor};
use tracing::warn;

use crate::config::RegistryConfig;
use crate::dump::RegistryDump;
use crate::lease::{Lease, LeaseRequest};
use crate::registry::{LeaseRegistry, TeardownReport};
use crate::stats::StatsSnapshot;

/// Cloneable handle to a lock-protected [`LeaseRegistry`].
///
/// Clones share the same registry. The registry is torn down when the last
/// clone drops.
#[derive(Clone, Debug)]
pub struct SharedRegistry {
    inner: Arc<RwLock<LeaseRegistry>>,
}

impl SharedRegistry {
    /// Wrap a new registry built from `config`.
    pub fn new(config: RegistryConfig) -> Result<Self, LeaseError> {
        Ok(Self::from_registry(LeaseRegistry::new(config)?))
    }

    /// Wrap an existing registry.
    pub fn from_registry(registry: LeaseRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Whether two handles refer to the same registry.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LeaseRegistry>, LeaseError> {
        self.inner.read().map_err(|_| LeaseError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LeaseRegistry>, LeaseError> {
        self.inner.write().map_err(|_| LeaseError::Poisoned)
    }

    /// Run `f` with shared access to the registry.
    pub fn with_registry<R>(&self, f: impl FnOnce(&LeaseRegistry) -> R) -> Result<R, LeaseError> {
        Ok(f(&*self.read()?))
    }

    /// Run `f` with exclusive access to the registry.
    pub fn with_registry_mut<R>(
        &self,
        f: impl FnOnce(&mut LeaseRegistry) -> R,
    ) -> Result<R, LeaseError> {
        Ok(f(&mut *self.write()?))
    }

    /// See [`LeaseRegistry::allocate`].
    pub fn allocate(&self, request: LeaseRequest) -> Result<Address, LeaseError> {
        self.write()?.allocate(request)
    }

    /// See [`LeaseRegistry::allocate_owned`].
    pub fn allocate_owned(
        &self,
        size: usize,
        alignment: usize,
        access: Access,
    ) -> Result<Address, LeaseError> {
        self.write()?.allocate_owned(size, alignment, access)
    }

    /// See [`LeaseRegistry::terminate`].
    pub fn terminate(&self, address: Address) -> Result<(), LeaseError> {
        self.write()?.terminate(address)
    }

    /// See [`LeaseRegistry::grow`].
    pub fn grow(
        &self,
        address: Address,
        new_size: usize,
        alignment: usize,
    ) -> Result<Address, LeaseError> {
        self.write()?.grow(address, new_size, alignment)
    }

    /// See [`LeaseRegistry::take`].
    pub fn take(&self, address: Address) -> Result<Lease, LeaseError> {
        self.write()?.take(address)
    }

    /// See [`LeaseRegistry::adopt`].
    pub fn adopt(&self, lease: Lease) -> Result<Address, LeaseError> {
        self.write()?.adopt(lease)
    }

    /// `(access, contract)` at `address`, falling back to `(Local, Borrowed)`
    /// for unregistered addresses and for a poisoned lock.
    pub fn lookup_policy(&self, address: Address) -> (Access, Contract) {
        match self.read() {
            Ok(registry) => registry.lookup_policy(address),
            Err(_) => {
                warn!(%address, "lookup on poisoned registry; reporting fallback policy");
                (Access::Local, Contract::Borrowed)
            }
        }
    }

    /// Whether `address` is registered. `false` on a poisoned lock.
    pub fn contains(&self, address: Address) -> bool {
        self.read().is_ok_and(|r| r.contains(address))
    }

    /// The descriptor at `address`.
    pub fn descriptor(&self, address: Address) -> Option<RegionDescriptor> {
        self.read().ok()?.descriptor(address)
    }

    /// Number of live leases.
    pub fn len(&self) -> Result<usize, LeaseError> {
        Ok(self.read()?.len())
    }

    /// Whether no leases are live.
    pub fn is_empty(&self) -> Result<bool, LeaseError> {
        Ok(self.read()?.is_empty())
    }

    /// See [`LeaseRegistry::stats`].
    pub fn stats(&self) -> Result<StatsSnapshot, LeaseError> {
        Ok(self.read()?.stats())
    }

    /// See [`LeaseRegistry::dump`].
    pub fn dump(&self) -> Result<RegistryDump, LeaseError> {
        Ok(self.read()?.dump())
    }

    /// See [`LeaseRegistry::clear`].
    pub fn clear(&self) -> Result<TeardownReport, LeaseError> {
        Ok(self.write()?.clear())
    }

    /// Move the lease at `address` from this registry to `to`.
    ///
    /// Both write locks are taken in address order of the underlying
    /// allocations, so two threads transferring in opposite directions cannot
    /// deadlock. Transferring into the same registry fails: `Duplicate` if
    /// the address is registered there, `NotFound` otherwise.
    pub fn transfer(&self, to: &SharedRegistry, address: Address) -> Result<(), LeaseError> {
        if self.ptr_eq(to) {
            return if self.read()?.contains(address) {
                Err(LeaseError::Duplicate { address })
            } else {
                Err(LeaseError::NotFound { address })
            };
        }
        let from_first =
            Arc::as_ptr(&self.inner).cast::<u8>() < Arc::as_ptr(&to.inner).cast::<u8>();
        let (mut src, mut dst) = if from_first {
            let src = self.write()?;
            let dst = to.write()?;
            (src, dst)
        } else {
            let dst = to.write()?;
            let src = self.write()?;
            (src, dst)
        };
        LeaseRegistry::transfer(&mut src, &mut dst, address)
    }
}

/// Named, insertion-ordered set of shared registries.
///
/// Constructed explicitly and passed where needed.
#[derive(Clone, Debug, Default)]
pub struct RegistryDomains {
    domains: IndexMap<String, SharedRegistry>,
}

impl RegistryDomains {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry named `name`.
    ///
    /// Fails with `InvalidArgument` if the name is taken or the configuration
    /// is invalid.
    pub fn create(
        &mut self,
        name: impl Into<String>,
        config: RegistryConfig,
    ) -> Result<SharedRegistry, LeaseError> {
        let name = name.into();
        if self.domains.contains_key(&name) {
            return Err(LeaseError::InvalidArgument {
                reason: format!("domain {name:?} already exists"),
            });
        }
        let registry = SharedRegistry::new(config)?;
        self.domains.insert(name, registry.clone());
        Ok(registry)
    }

    /// Insert an existing registry, returning the one it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        registry: SharedRegistry,
    ) -> Option<SharedRegistry> {
        self.domains.insert(name.into(), registry)
    }

    /// The registry named `name`.
    pub fn get(&self, name: &str) -> Option<&SharedRegistry> {
        self.domains.get(name)
    }

    /// Remove the registry named `name`, keeping the order of the rest.
    ///
    /// The registry itself is torn down once every handle is dropped.
    pub fn remove(&mut self, name: &str) -> Option<SharedRegistry> {
        self.domains.shift_remove(name)
    }

    /// Domain names in creation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    /// `(name, registry)` pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SharedRegistry)> {
        self.domains.iter().map(|(n, r)| (n.as_str(), r))
    }

    /// Number of domains.
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether there are no domains.
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Name of the domain holding `address`, if any.
    pub fn locate(&self, address: Address) -> Option<&str> {
        self.iter()
            .find(|(_, r)| r.contains(address))
            .map(|(n, _)| n)
    }
}
