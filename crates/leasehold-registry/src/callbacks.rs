//! Allocator callbacks for native libraries that accept a custom allocator.
//!
//! The callbacks speak raw pointers and report failure as null, the shape
//! such libraries expect. The reason for the most recent failure is kept in
//! [`AllocationCallbacks::last_status`].

use std::ptr;
use std::sync::atomic::{AtomicI32, Ordering};

use leasehold_core::{Access, Address, Contract, LeaseError, LeaseStatus};
use tracing::warn;

use crate::registry::LeaseRegistry;
use crate::shared::SharedRegistry;

/// Allocation, reallocation, and free over one [`SharedRegistry`].
///
/// Every pointer returned here is the start of an owned region in the
/// registry.
#[derive(Debug)]
pub struct AllocationCallbacks {
    registry: SharedRegistry,
    last_status: AtomicI32,
}

impl AllocationCallbacks {
    /// Callbacks allocating from `registry`.
    pub fn new(registry: SharedRegistry) -> Self {
        Self {
            registry,
            last_status: AtomicI32::new(LeaseStatus::Ok as i32),
        }
    }

    /// The registry backing these callbacks.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Status of the most recent call.
    pub fn last_status(&self) -> LeaseStatus {
        LeaseStatus::from_code(self.last_status.load(Ordering::Relaxed))
            .unwrap_or(LeaseStatus::InternalError)
    }

    fn finish(&self, op: &'static str, result: Result<*mut u8, LeaseError>) -> *mut u8 {
        self.last_status
            .store(LeaseStatus::of(&result).into(), Ordering::Relaxed);
        match result {
            Ok(p) => p,
            Err(error) => {
                warn!(op, %error, "allocator callback returned null");
                ptr::null_mut()
            }
        }
    }

    /// Allocate `size` zeroed bytes aligned to `alignment`. Null on failure.
    pub fn allocation(&self, size: usize, alignment: usize, access: Access) -> *mut u8 {
        let result = self
            .registry
            .with_registry_mut(|r| {
                r.allocate_owned(size, alignment, access)
                    .and_then(|address| owned_ptr_at(r, address))
            })
            .and_then(|inner| inner);
        self.finish("allocation", result)
    }

    /// Resize the region at `original`.
    ///
    /// A null `original` behaves as [`allocation`](Self::allocation). A zero
    /// `size` frees `original` and returns null. Growing returns the new
    /// region's pointer with the old contents copied in; a size that already
    /// fits at an alignment `original` already meets returns `original`. On
    /// failure the result is null and `original` stays valid.
    pub fn reallocation(
        &self,
        original: *mut u8,
        size: usize,
        alignment: usize,
        access: Access,
    ) -> *mut u8 {
        if original.is_null() {
            return self.allocation(size, alignment, access);
        }
        if size == 0 {
            self.free(original);
            return ptr::null_mut();
        }
        let address = Address::from_ptr(original.cast_const());
        let result = self
            .registry
            .with_registry_mut(|r| {
                r.grow(address, size, alignment)
                    .and_then(|moved| owned_ptr_at(r, moved))
            })
            .and_then(|inner| inner);
        self.finish("reallocation", result)
    }

    /// Release the region at `ptr`.
    ///
    /// Null is a no-op. Pointers the registry does not know are ignored and
    /// logged.
    pub fn free(&self, ptr: *mut u8) {
        if ptr.is_null() {
            self.last_status
                .store(LeaseStatus::Ok.into(), Ordering::Relaxed);
            return;
        }
        let address = Address::from_ptr(ptr.cast_const());
        let result = self.registry.terminate(address);
        self.last_status
            .store(LeaseStatus::of(&result).into(), Ordering::Relaxed);
        if let Err(error) = result {
            warn!(%address, %error, "free ignored");
        }
    }

    /// `(access, contract)` of the region at `ptr`, with the registry's
    /// fallback for unknown pointers.
    pub fn policy_of(&self, ptr: *const u8) -> (Access, Contract) {
        self.registry.lookup_policy(Address::from_ptr(ptr))
    }
}

fn owned_ptr_at(registry: &LeaseRegistry, address: Address) -> Result<*mut u8, LeaseError> {
    registry
        .owned_ptr(address)
        .map(|p| p.as_ptr())
        .ok_or(LeaseError::NotFound { address })
}
