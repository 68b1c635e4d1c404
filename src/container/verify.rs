//! Checking a container's shadow against its size.
//!
//! A correctly annotated container has `[beg, mid)` addressable and
//! `[mid, end)` poisoned. Checking that in full costs one read per granule;
//! the default [`VerifyMode::Sampled`] only reads granules within a fixed
//! radius of `beg`, `mid` and `end` and trusts the annotator for the rest.

use crate::shadow::ShadowTable;
use crate::util::layout::{granule_starts, GRANULE};

/// Default sampling radius in bytes: four granules around each boundary.
pub const DEFAULT_SAMPLE_RADIUS: usize = 32;

/// How much of the container the verifier reads.
///
/// `Sampled` catches any inconsistency within `radius` bytes of `beg`, `mid`
/// or `end`. A granule corrupted further than `radius` from all three goes
/// unnoticed. `Full` reads every granule of `[beg, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    /// Read only the granules near the three boundaries.
    Sampled {
        /// Bytes inspected on each side of a boundary. Zero means one granule.
        radius: usize,
    },
    /// Read every granule in the region.
    Full,
}

impl VerifyMode {
    /// Sampled mode with [`DEFAULT_SAMPLE_RADIUS`].
    pub const fn sampled() -> Self {
        VerifyMode::Sampled {
            radius: DEFAULT_SAMPLE_RADIUS,
        }
    }
}

impl Default for VerifyMode {
    fn default() -> Self {
        Self::sampled()
    }
}

impl std::fmt::Display for VerifyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyMode::Sampled { radius } => write!(f, "sampled({} bytes)", radius),
            VerifyMode::Full => write!(f, "full"),
        }
    }
}

/// Returns true if `[beg, mid)` is addressable and `[mid, end)` is poisoned,
/// sampling [`DEFAULT_SAMPLE_RADIUS`] bytes around each boundary.
pub fn verify_contiguous_container<S>(shadow: &S, beg: usize, mid: usize, end: usize) -> bool
where
    S: ShadowTable + ?Sized,
{
    verify_contiguous_container_with(shadow, beg, mid, end, VerifyMode::sampled())
}

/// Like [`verify_contiguous_container`], with an explicit [`VerifyMode`].
///
/// An unaligned `mid` passes only if its granule reports exactly
/// `mid % 8` live bytes. Bytes past an unaligned `end` are not inspected.
pub fn verify_contiguous_container_with<S>(
    shadow: &S,
    beg: usize,
    mid: usize,
    end: usize,
    mode: VerifyMode,
) -> bool
where
    S: ShadowTable + ?Sized,
{
    debug_assert!(beg <= mid && mid <= end);
    match mode {
        VerifyMode::Full => {
            is_addressable(shadow, beg, mid) && is_poisoned(shadow, mid, end)
        }
        VerifyMode::Sampled { radius } => {
            let r = radius.max(GRANULE);
            is_addressable(shadow, beg, mid.min(beg.saturating_add(r)))
                && is_addressable(shadow, mid.saturating_sub(r).max(beg), mid)
                && is_poisoned(shadow, mid, end.min(mid.saturating_add(r)))
                && is_poisoned(shadow, end.saturating_sub(r).max(mid), end)
        }
    }
}

/// Every byte of `[beg, end)` is addressable.
fn is_addressable<S>(shadow: &S, beg: usize, end: usize) -> bool
where
    S: ShadowTable + ?Sized,
{
    granule_starts(beg, end).all(|g| {
        let needed = end.min(g + GRANULE) - g;
        shadow.read_granule(g).addressable_len() >= needed
    })
}

/// No byte of `[beg, end)` is addressable.
fn is_poisoned<S>(shadow: &S, beg: usize, end: usize) -> bool
where
    S: ShadowTable + ?Sized,
{
    granule_starts(beg, end).all(|g| {
        let allowed = beg.max(g) - g;
        shadow.read_granule(g).addressable_len() <= allowed
    })
}
