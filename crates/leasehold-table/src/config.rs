//! Table sizing parameters.

/// Sizing for an [`AddressTable`](crate::AddressTable).
///
/// The table starts at `initial_capacity` slots (at least one) and doubles
/// whenever the load factor exceeds 3/4. With `max_capacity` set, growth is
/// clamped to that many slots; a table at its ceiling keeps probing until
/// every slot is taken and then reports `Full`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableConfig {
    /// Number of slots allocated up front. Zero is treated as one.
    pub initial_capacity: usize,
    /// Growth ceiling in slots. `None` = unbounded.
    pub max_capacity: Option<usize>,
}

impl TableConfig {
    /// Default initial capacity.
    pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

    /// Unbounded table with the given initial capacity.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            max_capacity: None,
        }
    }

    /// Set the growth ceiling.
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = Some(max_capacity);
        self
    }

    /// The initial slot count actually allocated.
    pub fn effective_initial_capacity(&self) -> usize {
        self.initial_capacity.max(1)
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_CAPACITY)
    }
}
