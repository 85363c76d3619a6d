//! Foreign memory fixtures.
//!
//! Borrowed and static leases need addresses that point at memory the
//! registry did not allocate. These fixtures provide it without `unsafe`:
//! an over-sized `Vec<u8>` with an aligned window inside it.

use leasehold_core::{Address, RegionDescriptor};

/// Heap buffer exposing an aligned window of `size` bytes.
///
/// Keep the buffer alive for as long as a registry holds a lease on it.
pub struct AlignedBuffer {
    storage: Vec<u8>,
    offset: usize,
    size: usize,
    alignment: usize,
}

impl AlignedBuffer {
    /// Buffer with `size` usable bytes aligned to `alignment`, filled with `fill`.
    ///
    /// Panics if `alignment` is not a power of two or `size` is zero.
    pub fn new(size: usize, alignment: usize, fill: u8) -> Self {
        assert!(size > 0, "size must be positive");
        assert!(alignment.is_power_of_two(), "alignment must be a power of two");
        let storage = vec![fill; size + alignment];
        let offset = storage.as_ptr().align_offset(alignment);
        assert!(offset < alignment, "could not align buffer");
        Self {
            storage,
            offset,
            size,
            alignment,
        }
    }

    /// Start of the aligned window.
    pub fn address(&self) -> Address {
        Address::from_ptr(self.as_slice().as_ptr())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Descriptor for the aligned window.
    pub fn descriptor(&self) -> RegionDescriptor {
        RegionDescriptor::new(self.address(), self.size, self.alignment).unwrap()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.offset..self.offset + self.size]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[self.offset..self.offset + self.size]
    }
}

/// Program-lifetime region, leaked on purpose.
pub fn static_region(size: usize, alignment: usize) -> &'static AlignedBuffer {
    Box::leak(Box::new(AlignedBuffer::new(size, alignment, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_aligned() {
        for shift in 0..12 {
            let buf = AlignedBuffer::new(24, 1 << shift, 0xAB);
            assert!(buf.address().is_aligned_to(1 << shift));
            assert_eq!(buf.as_slice().len(), 24);
            assert!(buf.as_slice().iter().all(|&b| b == 0xAB));
        }
    }

    #[test]
    fn descriptor_matches_window() {
        let buf = AlignedBuffer::new(64, 32, 0);
        let d = buf.descriptor();
        assert_eq!(d.address(), buf.address());
        assert_eq!(d.size(), 64);
        assert_eq!(d.alignment(), 32);
    }

    #[test]
    fn static_region_outlives_scope() {
        let region = static_region(16, 16);
        assert!(region.address().is_aligned_to(16));
    }
}
