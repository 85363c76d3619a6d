//! Owned, aligned heap regions.
//!
//! The only module in the workspace with `unsafe` code: one allocation,
//! one deallocation, and the two slice views over the region. Every block
//! carries a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;
use std::slice;
use std::sync::Arc;

use leasehold_core::region::validate_shape;
use leasehold_core::{Address, LeaseError, RegionDescriptor};

use crate::stats::AllocStats;

/// A zero-initialised heap region allocated by a registry.
///
/// Freed exactly once, on drop. There is no other way to release it, so an
/// owned lease cannot be freed twice or leaked by a forgotten flag.
pub struct OwnedRegion {
    ptr: NonNull<u8>,
    layout: Layout,
    descriptor: RegionDescriptor,
    stats: Arc<AllocStats>,
}

// SAFETY: the region is exclusively owned by this value; the raw pointer is
// never shared, and all access goes through `&self`/`&mut self`.
unsafe impl Send for OwnedRegion {}
// SAFETY: `&OwnedRegion` only permits reading the bytes.
unsafe impl Sync for OwnedRegion {}

impl OwnedRegion {
    /// Allocate `size` zeroed bytes aligned to `alignment` from the system
    /// allocator and record it in `stats`.
    pub(crate) fn allocate(
        size: usize,
        alignment: usize,
        stats: &Arc<AllocStats>,
    ) -> Result<Self, LeaseError> {
        validate_shape(size, alignment)?;
        let layout =
            Layout::from_size_align(size, alignment).map_err(|_| LeaseError::InvalidArgument {
                reason: format!("{size} bytes rounded up to {alignment} overflows isize"),
            })?;
        // SAFETY: `layout` has a non-zero size (checked by `validate_shape`).
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or(LeaseError::AllocationFailure { size, alignment })?;
        let descriptor = match RegionDescriptor::new(Address::from_ptr(raw), size, alignment) {
            Ok(d) => d,
            Err(e) => {
                // SAFETY: `raw` was returned by `alloc_zeroed(layout)` just above.
                unsafe { alloc::dealloc(raw, layout) };
                return Err(e);
            }
        };
        stats.record_allocation(size);
        Ok(Self {
            ptr,
            layout,
            descriptor,
            stats: Arc::clone(stats),
        })
    }

    /// Start address.
    pub fn address(&self) -> Address {
        self.descriptor.address()
    }

    /// Descriptor of the region.
    pub fn descriptor(&self) -> RegionDescriptor {
        self.descriptor
    }

    /// Length in bytes.
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Raw pointer to the first byte, for handing to foreign code.
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// The region's contents.
    pub fn bytes(&self) -> &[u8] {
        // SAFETY: `ptr` is valid for `layout.size()` bytes, which were
        // initialised by `alloc_zeroed`. The shared borrow of `self` rules
        // out a concurrent `bytes_mut`.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    /// The region's contents, mutably.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as in `bytes`; the unique borrow of `self` makes this the
        // only live view.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }

    /// Copy the leading bytes of `src`, bounded by the smaller of the two sizes.
    pub(crate) fn copy_prefix_from(&mut self, src: &OwnedRegion) -> usize {
        let n = self.size().min(src.size());
        self.bytes_mut()[..n].copy_from_slice(&src.bytes()[..n]);
        n
    }
}

impl Drop for OwnedRegion {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from `alloc_zeroed(self.layout)` and this is the
        // only place it is released; `drop` runs once.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
        self.stats.record_release(self.layout.size());
    }
}

impl fmt::Debug for OwnedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedRegion")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_zeroed_and_aligned() {
        let stats = Arc::new(AllocStats::new());
        let region = OwnedRegion::allocate(100, 64, &stats).unwrap();
        assert_eq!(region.size(), 100);
        assert!(region.address().is_aligned_to(64));
        assert!(region.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn drop_releases_once() {
        let stats = Arc::new(AllocStats::new());
        let region = OwnedRegion::allocate(32, 8, &stats).unwrap();
        assert_eq!(stats.snapshot().live_regions, 1);
        drop(region);
        let s = stats.snapshot();
        assert_eq!(s.live_regions, 0);
        assert_eq!(s.releases, 1);
        assert_eq!(s.live_bytes, 0);
    }

    #[test]
    fn writes_are_visible() {
        let stats = Arc::new(AllocStats::new());
        let mut region = OwnedRegion::allocate(8, 8, &stats).unwrap();
        region.bytes_mut().copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(region.bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn copy_prefix_is_bounded_by_source() {
        let stats = Arc::new(AllocStats::new());
        let mut small = OwnedRegion::allocate(4, 4, &stats).unwrap();
        small.bytes_mut().copy_from_slice(&[9, 9, 9, 9]);
        let mut big = OwnedRegion::allocate(16, 4, &stats).unwrap();
        assert_eq!(big.copy_prefix_from(&small), 4);
        assert_eq!(&big.bytes()[..4], &[9, 9, 9, 9]);
        assert!(big.bytes()[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn invalid_shapes_rejected_before_allocating() {
        let stats = Arc::new(AllocStats::new());
        assert!(OwnedRegion::allocate(0, 8, &stats).is_err());
        assert!(OwnedRegion::allocate(8, 3, &stats).is_err());
        assert!(OwnedRegion::allocate(isize::MAX as usize, 1 << 20, &stats).is_err());
        assert_eq!(stats.snapshot().allocations, 0);
    }
}
