//! Region policies: who may touch a region and who frees it.

use std::fmt;

/// Scope classification of a region.
///
/// Purely informational: the registry records it and hands it back on
/// lookup, but never changes behaviour based on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Access {
    /// Visible to the whole process.
    Global,
    /// Visible to a single owner or call site. The lookup fallback.
    #[default]
    Local,
    /// Program-lifetime data.
    Static,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Local => write!(f, "local"),
            Self::Static => write!(f, "static"),
        }
    }
}

/// Who is responsible for freeing a region's backing storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Contract {
    /// Allocated by the registry; released by the registry exactly once.
    Owned,
    /// Foreign memory; the registry never frees it. The lookup fallback.
    #[default]
    Borrowed,
    /// Program-lifetime memory; never freed.
    Static,
}

impl Contract {
    /// Whether releasing a lease under this contract frees its backing memory.
    pub fn frees_backing(self) -> bool {
        matches!(self, Self::Owned)
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owned => write!(f, "owned"),
            Self::Borrowed => write!(f, "borrowed"),
            Self::Static => write!(f, "static"),
        }
    }
}

/// The `(access, contract)` pair attached to every lease.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionPolicy {
    /// Scope classification.
    pub access: Access,
    /// Freeing responsibility.
    pub contract: Contract,
}

impl RegionPolicy {
    /// Policy reported for addresses that are not registered:
    /// `(Local, Borrowed)`.
    ///
    /// Read-only lookups substitute this instead of failing, so an
    /// unregistered address is indistinguishable from a registered borrowed
    /// one. Use an explicit existence check when the difference matters.
    pub const FALLBACK: Self = Self {
        access: Access::Local,
        contract: Contract::Borrowed,
    };

    /// Create a policy from its parts.
    pub const fn new(access: Access, contract: Contract) -> Self {
        Self { access, contract }
    }

    /// An owned policy with the given access.
    pub const fn owned(access: Access) -> Self {
        Self::new(access, Contract::Owned)
    }

    /// A borrowed policy with the given access.
    pub const fn borrowed(access: Access) -> Self {
        Self::new(access, Contract::Borrowed)
    }

    /// A static-lifetime policy with the given access.
    pub const fn static_lifetime(access: Access) -> Self {
        Self::new(access, Contract::Static)
    }
}

impl Default for RegionPolicy {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for RegionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.access, self.contract)
    }
}
