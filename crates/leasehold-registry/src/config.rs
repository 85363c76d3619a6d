//! Registry configuration parameters.

use leasehold_core::LeaseError;
use leasehold_table::TableConfig;

/// Configuration for a [`LeaseRegistry`](crate::LeaseRegistry).
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Slots allocated up front. Zero is treated as one.
    ///
    /// Default: 16.
    pub initial_capacity: usize,

    /// Growth ceiling in slots.
    ///
    /// Default: `None` (unbounded). Once the table reaches this size it
    /// stops resizing, and registrations fail with `Full` when every slot
    /// is taken.
    pub max_capacity: Option<usize>,

    /// Cap on live owned bytes allocated by this registry.
    ///
    /// Default: `None`. An owned allocation (or growth) that would push live
    /// bytes past the budget fails with `AllocationFailure` before touching
    /// the system allocator. Regions transferred to another registry keep
    /// counting against the registry that allocated them.
    pub byte_budget: Option<usize>,
}

impl RegistryConfig {
    /// Default initial slot count.
    pub const DEFAULT_INITIAL_CAPACITY: usize = TableConfig::DEFAULT_INITIAL_CAPACITY;

    /// Unbounded, unbudgeted registry with the given initial capacity.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            max_capacity: None,
            byte_budget: None,
        }
    }

    /// Set the slot ceiling.
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = Some(max_capacity);
        self
    }

    /// Set the owned-byte budget.
    pub fn with_byte_budget(mut self, bytes: usize) -> Self {
        self.byte_budget = Some(bytes);
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), LeaseError> {
        let initial = self.initial_capacity.max(1);
        if let Some(max) = self.max_capacity {
            if max < initial {
                return Err(LeaseError::InvalidArgument {
                    reason: format!(
                        "max_capacity ({max}) is below initial_capacity ({initial})"
                    ),
                });
            }
        }
        if self.byte_budget == Some(0) {
            return Err(LeaseError::InvalidArgument {
                reason: "byte_budget must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// The table sizing this configuration implies.
    pub fn table_config(&self) -> TableConfig {
        TableConfig {
            initial_capacity: self.initial_capacity,
            max_capacity: self.max_capacity,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_CAPACITY)
    }
}
