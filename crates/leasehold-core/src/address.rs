//! The [`Address`] newtype: an opaque, pointer-sized runtime address.

use std::fmt;

/// A runtime memory address used as a registry key.
///
/// Addresses are compared by value only; the registry never dereferences an
/// `Address`. The all-zero address is the null address and is rejected by
/// every registration path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub usize);

impl Address {
    /// The null address.
    pub const NULL: Address = Address(0);

    /// Capture the address of a raw pointer.
    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Self(ptr.cast::<u8>().addr())
    }

    /// The raw integer value.
    pub fn get(self) -> usize {
        self.0
    }

    /// Whether this is the null address.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Whether the address is a multiple of `alignment`.
    ///
    /// Returns `false` for a zero alignment.
    pub fn is_aligned_to(self, alignment: usize) -> bool {
        alignment != 0 && self.0 % alignment == 0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<usize> for Address {
    fn from(v: usize) -> Self {
        Self(v)
    }
}
