//! Contiguous-container annotations.
//!
//! - [`annotate`]: moves the live/reserved boundary of a region and rewrites
//!   only the granules it crossed.
//! - [`verify`]: checks a region's shadow against a boundary, sampling
//!   granules near `beg`, `mid` and `end` or walking all of them.
//! - [`vec`]: a fixed-capacity vector that drives both.
//!
//! ## Region lifecycle
//!
//! A freshly allocated region reads as fully addressable, which is the
//! annotated state for `mid == end`. Every size change annotates
//! `old_mid -> new_mid`. Before the buffer is freed or reallocated the
//! container annotates `mid -> end` so the owner gets back what it handed
//! out, then the owner discards the region's shadow.

pub mod annotate;
pub mod verify;
pub mod vec;

pub use annotate::{annotate_contiguous_container, annotation_cost};
pub use vec::{ShadowedVec, ShadowedVecIntoIter};
pub use verify::{
    verify_contiguous_container, verify_contiguous_container_with, VerifyMode,
    DEFAULT_SAMPLE_RADIUS,
};

use crate::util::layout::{granules_spanned, is_granule_aligned};

/// The byte range `[beg, end)` owned by a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    /// First byte of the buffer.
    pub beg: usize,
    /// One past the last byte of the buffer.
    pub end: usize,
}

impl Region {
    /// Create a region.
    pub const fn new(beg: usize, end: usize) -> Self {
        Self { beg, end }
    }

    /// Size in bytes.
    pub const fn len(&self) -> usize {
        self.end - self.beg
    }

    /// Returns true if the region holds no bytes.
    pub const fn is_empty(&self) -> bool {
        self.beg == self.end
    }

    /// Number of granules the region touches.
    pub const fn granules(&self) -> usize {
        granules_spanned(self.beg, self.end)
    }

    /// Returns true if `mid` is a valid boundary for this region.
    pub const fn contains_boundary(&self, mid: usize) -> bool {
        self.beg <= mid && mid <= self.end
    }

    /// Returns true if `beg <= end` and `beg` is granule-aligned.
    ///
    /// An unaligned `end` is accepted; whether it is the true end of its
    /// allocation cannot be told from the addresses alone.
    pub const fn is_well_formed(&self) -> bool {
        self.beg <= self.end && is_granule_aligned(self.beg)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.beg, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region() {
        let region = Region::new(0x100, 0x10c);
        assert_eq!(region.len(), 12);
        assert_eq!(region.granules(), 2);
        assert!(region.is_well_formed());
        assert!(region.contains_boundary(0x100));
        assert!(region.contains_boundary(0x10c));
        assert!(!region.contains_boundary(0x10d));
        assert_eq!(region.to_string(), "[0x100, 0x10c)");
    }

    #[test]
    fn test_malformed_regions() {
        assert!(!Region::new(0x104, 0x110).is_well_formed());
        assert!(!Region::new(0x110, 0x100).is_well_formed());
        assert!(Region::new(0x100, 0x100).is_empty());
    }
}
