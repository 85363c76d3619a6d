//! The [`AddressTable`] itself.

use std::cmp::Ordering;
use std::fmt;

use leasehold_core::TableError;
use tracing::{trace, warn};

use crate::config::TableConfig;
use crate::key::TableKey;

type Slot<K, V> = Option<(K, V)>;

/// An insertion that did not happen, with the entry handed back.
///
/// Callers that move ownership into the table (transfers, rekeys) use this
/// to roll back without losing the value.
pub struct Rejected<K, V> {
    /// Why the insertion failed.
    pub error: TableError,
    /// The key that was not inserted.
    pub key: K,
    /// The value that was not inserted.
    pub value: V,
}

impl<K, V> fmt::Debug for Rejected<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Open-addressing hash table with linear probing and backward-shift deletion.
///
/// Invariants:
/// - `len() <= capacity()`.
/// - For every occupied slot, walking the key's probe sequence from probe 0
///   reaches that slot before any empty slot. Lookups, inserts, and deletes
///   all stop at the first empty slot, so this is what keeps entries
///   findable. Deletion preserves it by re-placing the rest of the run.
#[derive(Debug)]
pub struct AddressTable<K, V> {
    entries: Vec<Slot<K, V>>,
    count: usize,
    max_capacity: Option<usize>,
}

fn allocate_slots<K, V>(size: usize) -> Result<Vec<Slot<K, V>>, TableError> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(size)
        .map_err(|_| TableError::AllocationFailure {
            requested_slots: size,
        })?;
    slots.resize_with(size, || None);
    Ok(slots)
}

fn same<K: Ord>(a: &K, b: &K) -> bool {
    a.cmp(b) == Ordering::Equal
}

/// First-empty-slot placement over an arbitrary slot array.
fn place_in<K: TableKey, V>(
    slots: &mut [Slot<K, V>],
    key: K,
    value: V,
) -> Result<usize, Rejected<K, V>> {
    let size = slots.len();
    for probe in 0..size {
        let idx = key.slot(size, probe);
        match &slots[idx] {
            None => {
                slots[idx] = Some((key, value));
                return Ok(idx);
            }
            Some((existing, _)) if same(existing, &key) => {
                return Err(Rejected {
                    error: TableError::Duplicate,
                    key,
                    value,
                });
            }
            Some(_) => {}
        }
    }
    Err(Rejected {
        error: TableError::Full { capacity: size },
        key,
        value,
    })
}

impl<K: TableKey, V> AddressTable<K, V> {
    /// Create an unbounded table with `initial_capacity` slots (minimum 1).
    pub fn new(initial_capacity: usize) -> Result<Self, TableError> {
        Self::with_config(&TableConfig::new(initial_capacity))
    }

    /// Create a table from a [`TableConfig`].
    ///
    /// Fails with `InvalidArgument` if the ceiling is below the initial
    /// capacity, or `AllocationFailure` if the slot array cannot be
    /// allocated.
    pub fn with_config(config: &TableConfig) -> Result<Self, TableError> {
        let size = config.effective_initial_capacity();
        if config.max_capacity.is_some_and(|max| max < size) {
            return Err(TableError::InvalidArgument {
                reason: "max capacity is below initial capacity",
            });
        }
        Ok(Self {
            entries: allocate_slots(size)?,
            count: 0,
            max_capacity: config.max_capacity,
        })
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Total slot count.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Growth ceiling, if any.
    pub fn max_capacity(&self) -> Option<usize> {
        self.max_capacity
    }

    /// Insert `key → value`, growing first if the load factor exceeds 3/4.
    ///
    /// On failure the entry is dropped. Use [`AddressTable::try_insert`] to
    /// get it back.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        self.try_insert(key, value).map_err(|r| r.error)
    }

    /// Insert `key → value`, handing the entry back on failure.
    ///
    /// Errors: `InvalidArgument` for a null key, `Duplicate` if the key is
    /// already present (the existing entry is untouched), `Full` if every
    /// slot was probed without success, `AllocationFailure` if a required
    /// resize could not allocate. A failed resize leaves the table as it was.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<(), Rejected<K, V>> {
        if key.is_null() {
            return Err(Rejected {
                error: TableError::InvalidArgument {
                    reason: "null key",
                },
                key,
                value,
            });
        }
        if self.over_load_factor() {
            if let Some(target) = self.growth_target() {
                if let Err(error) = self.resize(target) {
                    return Err(Rejected { error, key, value });
                }
            }
        }
        self.place(key, value).map(|_| ())
    }

    /// Insert without growing, even above the load factor.
    ///
    /// Used to reinstate an entry that was just removed: the slot it vacated
    /// guarantees room.
    pub fn insert_within_capacity(&mut self, key: K, value: V) -> Result<(), Rejected<K, V>> {
        if key.is_null() {
            return Err(Rejected {
                error: TableError::InvalidArgument {
                    reason: "null key",
                },
                key,
                value,
            });
        }
        self.place(key, value).map(|_| ())
    }

    /// Grow the slot array to `new_size` and re-place every entry.
    ///
    /// All-or-nothing: if any entry cannot be re-placed, every entry already
    /// moved goes back to its original slot and the old array is kept.
    pub fn resize(&mut self, new_size: usize) -> Result<(), TableError> {
        let old_size = self.entries.len();
        if new_size <= old_size {
            return Err(TableError::InvalidArgument {
                reason: "resize target must exceed current capacity",
            });
        }
        if self.max_capacity.is_some_and(|max| new_size > max) {
            return Err(TableError::InvalidArgument {
                reason: "resize target exceeds max capacity",
            });
        }

        let mut fresh = allocate_slots(new_size)?;
        let mut moved: Vec<(usize, usize)> = Vec::new();
        moved
            .try_reserve_exact(self.count)
            .map_err(|_| TableError::AllocationFailure {
                requested_slots: new_size,
            })?;

        for old_idx in 0..old_size {
            let Some((key, value)) = self.entries[old_idx].take() else {
                continue;
            };
            match place_in(&mut fresh, key, value) {
                Ok(new_idx) => moved.push((old_idx, new_idx)),
                Err(rejected) => {
                    self.entries[old_idx] = Some((rejected.key, rejected.value));
                    for (o, n) in moved {
                        self.entries[o] = fresh[n].take();
                    }
                    trace!(old_size, new_size, "table resize rolled back");
                    return Err(rejected.error);
                }
            }
        }

        self.entries = fresh;
        trace!(old_size, new_size, entries = self.count, "table resized");
        Ok(())
    }

    /// Look up the value for `key`. Never mutates.
    pub fn get(&self, key: &K) -> Option<&V> {
        let idx = self.find(key)?;
        self.entries[idx].as_ref().map(|(_, v)| v)
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.find(key)?;
        self.entries[idx].as_mut().map(|(_, v)| v)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Slot index currently holding `key`.
    pub fn slot_of(&self, key: &K) -> Option<usize> {
        self.find(key)
    }

    /// Remove `key` and return its value.
    ///
    /// After clearing the slot, every entry in the contiguous run that
    /// follows it is taken out and re-placed, which moves it back to the
    /// earliest free slot on its own probe sequence. The walk stops at the
    /// first empty slot.
    pub fn remove(&mut self, key: &K) -> Result<V, TableError> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Remove `key`, returning both the stored key and value.
    pub fn remove_entry(&mut self, key: &K) -> Result<(K, V), TableError> {
        if key.is_null() {
            return Err(TableError::InvalidArgument {
                reason: "null key",
            });
        }
        let idx = self.find(key).ok_or(TableError::NotFound)?;
        let entry = self.entries[idx].take().ok_or(TableError::NotFound)?;
        self.count -= 1;
        self.compact_after(idx);
        Ok(entry)
    }

    /// Swap the entry under `old` for `new_key → new_value`, returning the
    /// old value.
    ///
    /// On failure the table is unchanged and the new entry is handed back.
    /// Fails with `NotFound` if `old` is absent and `Duplicate` if `new_key`
    /// is already present under a different entry. Never grows: removing
    /// `old` first always frees a slot for the new key.
    pub fn replace_entry(
        &mut self,
        old: &K,
        new_key: K,
        new_value: V,
    ) -> Result<V, Rejected<K, V>> {
        let reject = |error, key, value| Err(Rejected { error, key, value });
        if new_key.is_null() {
            return reject(
                TableError::InvalidArgument {
                    reason: "null key",
                },
                new_key,
                new_value,
            );
        }
        let Some(old_idx) = self.find(old) else {
            return reject(TableError::NotFound, new_key, new_value);
        };
        if same(old, &new_key) {
            let slot = &mut self.entries[old_idx];
            return match slot.as_mut() {
                Some((_, v)) => Ok(std::mem::replace(v, new_value)),
                None => reject(TableError::NotFound, new_key, new_value),
            };
        }
        if self.contains(&new_key) {
            return reject(TableError::Duplicate, new_key, new_value);
        }

        let (old_key, old_value) = match self.remove_entry(old) {
            Ok(entry) => entry,
            Err(error) => return reject(error, new_key, new_value),
        };
        match self.place(new_key, new_value) {
            Ok(_) => Ok(old_value),
            Err(rejected) => {
                // Nothing was placed, so the slot vacated above is still free.
                let restored = self.place(old_key, old_value);
                debug_assert!(restored.is_ok(), "vacated slot was not reusable");
                if let Err(lost) = restored {
                    warn!(error = %lost.error, "replace_entry rollback failed; old entry dropped");
                } else {
                    trace!("replace_entry rolled back");
                }
                Err(rejected)
            }
        }
    }

    /// Drop every entry. Capacity is kept.
    pub fn clear(&mut self) {
        self.entries.fill_with(|| None);
        self.count = 0;
    }

    /// Remove every entry and return them in slot order. Capacity is kept.
    pub fn drain(&mut self) -> Vec<(K, V)> {
        let drained: Vec<_> = self.entries.iter_mut().filter_map(Option::take).collect();
        self.count = 0;
        drained
    }

    /// Iterate over `(key, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries
            .iter()
            .filter_map(|s| s.as_ref().map(|(k, v)| (k, v)))
    }

    /// Iterate over `(slot, key, value)` triples in slot order.
    pub fn iter_slots(&self) -> impl Iterator<Item = (usize, &K, &V)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|(k, v)| (i, k, v)))
    }

    /// Iterate over keys in slot order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    fn find(&self, key: &K) -> Option<usize> {
        let size = self.entries.len();
        for probe in 0..size {
            let idx = key.slot(size, probe);
            match &self.entries[idx] {
                None => return None,
                Some((k, _)) if same(k, key) => return Some(idx),
                Some(_) => {}
            }
        }
        None
    }

    fn place(&mut self, key: K, value: V) -> Result<usize, Rejected<K, V>> {
        let idx = place_in(&mut self.entries, key, value)?;
        self.count += 1;
        Ok(idx)
    }

    fn compact_after(&mut self, freed: usize) {
        let size = self.entries.len();
        let mut cursor = (freed + 1) % size;
        for _ in 1..size {
            let Some((key, value)) = self.entries[cursor].take() else {
                break;
            };
            self.count -= 1;
            if let Err(rejected) = self.place(key, value) {
                // The slot at `cursor` was just emptied; this is unreachable
                // while the probe sequence is linear.
                self.entries[cursor] = Some((rejected.key, rejected.value));
                self.count += 1;
            }
            cursor = (cursor + 1) % size;
        }
    }

    fn over_load_factor(&self) -> bool {
        self.count.saturating_mul(4) > self.entries.len().saturating_mul(3)
    }

    fn growth_target(&self) -> Option<usize> {
        let size = self.entries.len();
        let doubled = size.saturating_mul(2);
        match self.max_capacity {
            Some(max) if size >= max => None,
            Some(max) => Some(doubled.min(max)),
            None => Some(doubled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leasehold_core::Address;

    /// Key whose probe sequence collapses onto slot 0 once the table is
    /// larger than four slots, so re-placement during a resize fails.
    #[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
    struct Pinned(usize);

    impl TableKey for Pinned {
        fn slot(&self, size: usize, probe: usize) -> usize {
            if size > 4 {
                0
            } else {
                (self.0 + probe) % size
            }
        }
    }

    /// Addresses that all share a home slot in a table of `size` slots.
    fn colliding(size: usize, n: usize) -> Vec<Address> {
        (1..=n).map(|i| Address(0x1000 + i * size)).collect()
    }

    fn table(size: usize) -> AddressTable<Address, u32> {
        AddressTable::new(size).unwrap()
    }

    #[test]
    fn create_rounds_zero_up() {
        let t: AddressTable<Address, u32> = AddressTable::new(0).unwrap();
        assert_eq!(t.capacity(), 1);
        assert!(t.is_empty());
    }

    #[test]
    fn insert_then_search() {
        let mut t = table(8);
        t.insert(Address(0x10), 1).unwrap();
        t.insert(Address(0x20), 2).unwrap();
        assert_eq!(t.get(&Address(0x10)), Some(&1));
        assert_eq!(t.get(&Address(0x20)), Some(&2));
        assert_eq!(t.get(&Address(0x30)), None);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn null_key_rejected() {
        let mut t = table(8);
        assert!(matches!(
            t.insert(Address::NULL, 1),
            Err(TableError::InvalidArgument { .. })
        ));
        assert!(matches!(
            t.remove(&Address::NULL),
            Err(TableError::InvalidArgument { .. })
        ));
        assert!(t.is_empty());
    }

    #[test]
    fn duplicate_leaves_original() {
        let mut t = table(8);
        t.insert(Address(0x10), 1).unwrap();
        let rejected = t.try_insert(Address(0x10), 2).unwrap_err();
        assert_eq!(rejected.error, TableError::Duplicate);
        assert_eq!(rejected.value, 2);
        assert_eq!(t.get(&Address(0x10)), Some(&1));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn grows_past_three_quarters() {
        let mut t = table(4);
        for i in 1..=4 {
            t.insert(Address(i * 8), i as u32).unwrap();
        }
        // Fourth insert saw 3/4 load, not above it.
        assert_eq!(t.capacity(), 4);
        t.insert(Address(5 * 8), 5).unwrap();
        assert_eq!(t.capacity(), 8);
        for i in 1..=5 {
            assert_eq!(t.get(&Address(i * 8)), Some(&(i as u32)));
        }
    }

    #[test]
    fn full_at_ceiling() {
        let config = TableConfig::new(2).with_max_capacity(2);
        let mut t: AddressTable<Address, u32> = AddressTable::with_config(&config).unwrap();
        t.insert(Address(8), 1).unwrap();
        t.insert(Address(16), 2).unwrap();
        let err = t.insert(Address(24), 3).unwrap_err();
        assert_eq!(err, TableError::Full { capacity: 2 });
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn ceiling_below_initial_rejected() {
        let config = TableConfig::new(8).with_max_capacity(4);
        let r: Result<AddressTable<Address, u32>, _> = AddressTable::with_config(&config);
        assert!(matches!(r, Err(TableError::InvalidArgument { .. })));
    }

    #[test]
    fn growth_clamped_to_ceiling() {
        let config = TableConfig::new(4).with_max_capacity(6);
        let mut t: AddressTable<Address, u32> = AddressTable::with_config(&config).unwrap();
        for i in 1..=6 {
            t.insert(Address(i * 8), 0).unwrap();
        }
        assert_eq!(t.capacity(), 6);
        assert_eq!(t.len(), 6);
    }

    #[test]
    fn resize_must_grow() {
        let mut t = table(8);
        assert!(matches!(t.resize(8), Err(TableError::InvalidArgument { .. })));
        assert!(matches!(t.resize(4), Err(TableError::InvalidArgument { .. })));
    }

    #[test]
    fn resize_allocation_failure_leaves_table_intact() {
        let mut t = table(8);
        for i in 1..=5 {
            t.insert(Address(i * 16), i as u32).unwrap();
        }
        let before: Vec<_> = t.iter_slots().map(|(s, k, v)| (s, *k, *v)).collect();

        let err = t.resize(usize::MAX / 2).unwrap_err();
        assert!(matches!(err, TableError::AllocationFailure { .. }));

        assert_eq!(t.capacity(), 8);
        assert_eq!(t.len(), 5);
        let after: Vec<_> = t.iter_slots().map(|(s, k, v)| (s, *k, *v)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn resize_failing_midway_rolls_back() {
        let mut t: AddressTable<Pinned, &str> = AddressTable::new(4).unwrap();
        t.insert(Pinned(0), "a").unwrap();
        t.insert(Pinned(1), "b").unwrap();
        t.insert(Pinned(2), "c").unwrap();
        let before: Vec<_> = t.iter_slots().map(|(s, k, v)| (s, k.0, *v)).collect();

        // First entry lands in slot 0 of the new array; the second finds
        // slot 0 taken on every probe.
        let err = t.resize(8).unwrap_err();
        assert_eq!(err, TableError::Full { capacity: 8 });

        assert_eq!(t.capacity(), 4);
        assert_eq!(t.len(), 3);
        let after: Vec<_> = t.iter_slots().map(|(s, k, v)| (s, k.0, *v)).collect();
        assert_eq!(before, after);
        for (i, v) in ["a", "b", "c"].into_iter().enumerate() {
            assert_eq!(t.get(&Pinned(i)), Some(&v));
        }
    }

    #[test]
    fn insert_propagates_failed_growth() {
        let mut t: AddressTable<Pinned, u8> = AddressTable::new(4).unwrap();
        for i in 0..4 {
            t.insert(Pinned(i), i as u8).unwrap();
        }
        let rejected = t.try_insert(Pinned(9), 9).unwrap_err();
        assert_eq!(rejected.error, TableError::Full { capacity: 8 });
        assert_eq!(t.capacity(), 4);
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn delete_middle_of_collision_run() {
        let mut t = table(8);
        let keys = colliding(8, 3);
        let home = keys[0].slot(8, 0);
        for (i, k) in keys.iter().enumerate() {
            t.insert(*k, i as u32).unwrap();
        }
        assert_eq!(t.slot_of(&keys[2]), Some((home + 2) % 8));

        assert_eq!(t.remove(&keys[1]), Ok(1));

        assert_eq!(t.get(&keys[0]), Some(&0));
        assert_eq!(t.get(&keys[2]), Some(&2));
        assert_eq!(t.get(&keys[1]), None);
        // Third key shifted back into the freed slot.
        assert_eq!(t.slot_of(&keys[2]), Some((home + 1) % 8));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn delete_head_of_run_shifts_everything() {
        let mut t = table(8);
        let keys = colliding(8, 3);
        let home = keys[0].slot(8, 0);
        for (i, k) in keys.iter().enumerate() {
            t.insert(*k, i as u32).unwrap();
        }
        t.remove(&keys[0]).unwrap();
        assert_eq!(t.slot_of(&keys[1]), Some(home));
        assert_eq!(t.slot_of(&keys[2]), Some((home + 1) % 8));
    }

    #[test]
    fn delete_keeps_displaced_foreign_key_reachable() {
        let mut t = table(8);
        let keys = colliding(8, 2);
        let home = keys[0].slot(8, 0);
        // A key whose own home is the slot right after the run.
        let neighbour = (0..64)
            .map(|j| Address(0x2000 + j))
            .find(|a| a.slot(8, 0) == (home + 1) % 8)
            .unwrap();
        t.insert(keys[0], 0).unwrap();
        t.insert(keys[1], 1).unwrap();
        t.insert(neighbour, 7).unwrap();
        assert_eq!(t.slot_of(&neighbour), Some((home + 2) % 8));

        t.remove(&keys[0]).unwrap();
        assert_eq!(t.get(&keys[1]), Some(&1));
        assert_eq!(t.get(&neighbour), Some(&7));
        assert_eq!(t.slot_of(&keys[1]), Some(home));
        assert_eq!(t.slot_of(&neighbour), Some((home + 1) % 8));
    }

    #[test]
    fn delete_compaction_wraps_around() {
        let mut t = table(8);
        let last = (1..64)
            .map(Address)
            .find(|a| a.slot(8, 0) == 7)
            .unwrap();
        let wrapped = Address(last.get() + 8);
        t.insert(last, 1).unwrap();
        t.insert(wrapped, 2).unwrap();
        assert_eq!(t.slot_of(&wrapped), Some(0));
        t.remove(&last).unwrap();
        assert_eq!(t.slot_of(&wrapped), Some(7));
    }

    #[test]
    fn delete_missing_is_not_found() {
        let mut t = table(8);
        t.insert(Address(8), 1).unwrap();
        assert_eq!(t.remove(&Address(16)), Err(TableError::NotFound));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn replace_entry_moves_key() {
        let mut t = table(8);
        t.insert(Address(0x10), 1).unwrap();
        let old = t.replace_entry(&Address(0x10), Address(0x20), 2).unwrap();
        assert_eq!(old, 1);
        assert!(!t.contains(&Address(0x10)));
        assert_eq!(t.get(&Address(0x20)), Some(&2));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn replace_entry_in_full_table() {
        let config = TableConfig::new(2).with_max_capacity(2);
        let mut t: AddressTable<Address, u32> = AddressTable::with_config(&config).unwrap();
        t.insert(Address(8), 1).unwrap();
        t.insert(Address(16), 2).unwrap();
        assert_eq!(t.replace_entry(&Address(8), Address(24), 3).unwrap(), 1);
        assert_eq!(t.get(&Address(24)), Some(&3));
        assert_eq!(t.get(&Address(16)), Some(&2));
    }

    /// Key with a single fixed slot: every probe lands on `home`.
    #[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
    struct Fixed {
        id: u32,
        home: usize,
    }

    impl TableKey for Fixed {
        fn slot(&self, size: usize, _probe: usize) -> usize {
            self.home % size
        }
    }

    #[test]
    fn replace_entry_restores_old_entry_when_new_key_has_no_slot() {
        let mut t: AddressTable<Fixed, u32> = AddressTable::new(4).unwrap();
        t.insert(Fixed { id: 1, home: 1 }, 10).unwrap();
        t.insert(Fixed { id: 2, home: 2 }, 20).unwrap();
        t.insert(Fixed { id: 3, home: 3 }, 30).unwrap();

        let old = Fixed { id: 3, home: 3 };
        let rejected = t
            .replace_entry(&old, Fixed { id: 4, home: 1 }, 40)
            .unwrap_err();
        assert_eq!(rejected.error, TableError::Full { capacity: 4 });
        assert_eq!(rejected.value, 40);
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(&old), Some(&30));
        assert_eq!(t.slot_of(&old), Some(3));
        assert_eq!(t.get(&Fixed { id: 1, home: 1 }), Some(&10));
    }

    #[test]
    fn replace_entry_rejects_existing_target() {
        let mut t = table(8);
        t.insert(Address(0x10), 1).unwrap();
        t.insert(Address(0x20), 2).unwrap();
        let rejected = t.replace_entry(&Address(0x10), Address(0x20), 3).unwrap_err();
        assert_eq!(rejected.error, TableError::Duplicate);
        assert_eq!(t.get(&Address(0x10)), Some(&1));
        assert_eq!(t.get(&Address(0x20)), Some(&2));
    }

    #[test]
    fn replace_entry_missing_source() {
        let mut t = table(8);
        let rejected = t.replace_entry(&Address(0x10), Address(0x20), 3).unwrap_err();
        assert_eq!(rejected.error, TableError::NotFound);
        assert!(t.is_empty());
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut t = table(4);
        for i in 1..=6 {
            t.insert(Address(i * 8), 0).unwrap();
        }
        let cap = t.capacity();
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.capacity(), cap);
        assert!(!t.contains(&Address(8)));
    }

    #[test]
    fn drain_returns_everything() {
        let mut t = table(8);
        t.insert(Address(8), 1).unwrap();
        t.insert(Address(16), 2).unwrap();
        let mut drained: Vec<_> = t.drain().into_iter().map(|(_, v)| v).collect();
        drained.sort_unstable();
        assert_eq!(drained, vec![1, 2]);
        assert!(t.is_empty());
    }

    #[test]
    fn integer_and_string_keys() {
        let mut ints: AddressTable<u64, &str> = AddressTable::new(2).unwrap();
        ints.insert(0, "zero").unwrap();
        ints.insert(42, "answer").unwrap();
        assert_eq!(ints.get(&0), Some(&"zero"));

        let mut names: AddressTable<String, u32> = AddressTable::new(2).unwrap();
        for (i, n) in ["VK_LAYER_A", "VK_LAYER_B", "VK_LAYER_C"].iter().enumerate() {
            names.insert(n.to_string(), i as u32).unwrap();
        }
        assert_eq!(names.get(&"VK_LAYER_B".to_string()), Some(&1));
        names.remove(&"VK_LAYER_A".to_string()).unwrap();
        assert_eq!(names.get(&"VK_LAYER_C".to_string()), Some(&2));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeMap;

        #[derive(Clone, Debug)]
        enum Op {
            Insert(usize, u32),
            Remove(usize),
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1usize..40, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
                (1usize..40).prop_map(Op::Remove),
            ]
        }

        fn probe_invariant_holds(t: &AddressTable<Address, u32>) -> bool {
            let size = t.capacity();
            t.iter_slots().all(|(slot, key, _)| {
                (0..size)
                    .map(|p| key.slot(size, p))
                    .take_while(|&s| s != slot)
                    .all(|s| t.entries[s].is_some())
            })
        }

        proptest! {
            #[test]
            fn matches_btreemap_model(
                initial in 1usize..6,
                ops in proptest::collection::vec(arb_op(), 1..120),
            ) {
                let mut t: AddressTable<Address, u32> = AddressTable::new(initial).unwrap();
                let mut model = BTreeMap::new();
                for op in ops {
                    match op {
                        Op::Insert(k, v) => {
                            // Multiples of 4 force collisions in small tables.
                            let key = Address(k * 4);
                            let expected_dup = model.contains_key(&key);
                            let r = t.insert(key, v);
                            if expected_dup {
                                prop_assert_eq!(r, Err(TableError::Duplicate));
                            } else {
                                prop_assert!(r.is_ok());
                                model.insert(key, v);
                            }
                        }
                        Op::Remove(k) => {
                            let key = Address(k * 4);
                            let r = t.remove(&key);
                            prop_assert_eq!(r.ok(), model.remove(&key));
                        }
                    }
                    prop_assert_eq!(t.len(), model.len());
                    prop_assert!(t.len() <= t.capacity());
                    prop_assert!(probe_invariant_holds(&t));
                }
                for (k, v) in &model {
                    prop_assert_eq!(t.get(k), Some(v));
                }
            }

            #[test]
            fn search_never_mutates(
                keys in proptest::collection::vec(1usize..1000, 1..40),
                probe in 1usize..1000,
            ) {
                let mut t: AddressTable<Address, u32> = AddressTable::new(4).unwrap();
                for k in &keys {
                    let _ = t.insert(Address(*k), *k as u32);
                }
                let before: Vec<_> = t.iter_slots().map(|(s, k, v)| (s, *k, *v)).collect();
                let _ = t.get(&Address(probe));
                let _ = t.contains(&Address(probe));
                let after: Vec<_> = t.iter_slots().map(|(s, k, v)| (s, *k, *v)).collect();
                prop_assert_eq!(before, after);
            }
        }
    }
}
