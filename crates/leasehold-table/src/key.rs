//! Key shapes and their probe sequences.

use leasehold_core::Address;

/// Knuth's multiplicative hashing constant (`⌊2^32 / φ⌋`).
pub const KNUTH_MULTIPLIER: u64 = 2_654_435_761;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// A key that can live in an [`AddressTable`](crate::AddressTable).
///
/// Equality for the table is `Ord::cmp(..) == Equal`. The probe sequence
/// must be linear: `slot(size, p + 1) == (slot(size, p) + 1) % size`.
/// Backward-shift deletion relies on each key's candidates forming one
/// contiguous run.
pub trait TableKey: Ord {
    /// Slot index for the `probe`-th attempt in a table of `size` slots.
    fn slot(&self, size: usize, probe: usize) -> usize;

    /// Whether this is the null key, which no table accepts.
    fn is_null(&self) -> bool {
        false
    }
}

/// `(value * KNUTH_MULTIPLIER + probe) mod size`, computed without overflow.
pub fn multiplicative_slot(value: u64, size: usize, probe: usize) -> usize {
    debug_assert!(size > 0, "table size must be positive");
    let h = u128::from(value) * u128::from(KNUTH_MULTIPLIER) + probe as u128;
    (h % size as u128) as usize
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |h, &b| {
        (h ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

impl TableKey for Address {
    fn slot(&self, size: usize, probe: usize) -> usize {
        multiplicative_slot(self.get() as u64, size, probe)
    }

    fn is_null(&self) -> bool {
        Address::is_null(*self)
    }
}

impl TableKey for u64 {
    fn slot(&self, size: usize, probe: usize) -> usize {
        multiplicative_slot(*self, size, probe)
    }
}

impl TableKey for String {
    fn slot(&self, size: usize, probe: usize) -> usize {
        let h = u128::from(fnv1a(self.as_bytes())) + probe as u128;
        (h % size as u128) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_are_contiguous() {
        let a = Address(0xdead_beef);
        for size in [1usize, 7, 8, 13, 64] {
            for p in 0..size {
                assert_eq!(a.slot(size, p + 1), (a.slot(size, p) + 1) % size);
            }
        }
    }

    #[test]
    fn addresses_one_size_apart_share_home_slot() {
        let size = 8;
        let base = Address(0x1000);
        let other = Address(0x1000 + size);
        assert_eq!(base.slot(size, 0), other.slot(size, 0));
    }

    #[test]
    fn null_address_is_null_key() {
        assert!(TableKey::is_null(&Address::NULL));
        assert!(!TableKey::is_null(&Address(1)));
        assert!(!0u64.is_null());
    }

    #[test]
    fn string_slots_in_range() {
        let k = "instance-layer".to_string();
        for p in 0..5 {
            assert!(k.slot(5, p) < 5);
        }
    }

    #[test]
    fn multiplicative_slot_matches_formula_for_small_values() {
        assert_eq!(multiplicative_slot(3, 10, 0), ((3 * KNUTH_MULTIPLIER) % 10) as usize);
        assert_eq!(multiplicative_slot(3, 10, 4), ((3 * KNUTH_MULTIPLIER + 4) % 10) as usize);
    }
}
