//! Granule arithmetic.
//!
//! Shadow state is tracked per 8-byte granule. Every address computation the
//! annotator and verifier perform goes through these helpers.

/// Size of one shadow granule in bytes.
pub const GRANULE: usize = 8;

/// Round an address down to the start of its granule.
#[inline]
pub const fn align_down(addr: usize) -> usize {
    addr & !(GRANULE - 1)
}

/// Round an address up to the next granule boundary.
#[inline]
pub const fn align_up(addr: usize) -> usize {
    (addr + GRANULE - 1) & !(GRANULE - 1)
}

/// Returns true if `addr` sits on a granule boundary.
#[inline]
pub const fn is_granule_aligned(addr: usize) -> bool {
    addr & (GRANULE - 1) == 0
}

/// Offset of `addr` inside its granule.
#[inline]
pub const fn granule_offset(addr: usize) -> usize {
    addr & (GRANULE - 1)
}

/// Index of the granule containing `addr`.
#[inline]
pub const fn granule_index(addr: usize) -> usize {
    addr / GRANULE
}

/// Number of granules overlapping `[beg, end)`.
#[inline]
pub const fn granules_spanned(beg: usize, end: usize) -> usize {
    if end <= beg {
        return 0;
    }
    (align_up(end) - align_down(beg)) / GRANULE
}

/// Iterate over the start addresses of granules overlapping `[beg, end)`.
#[inline]
pub fn granule_starts(beg: usize, end: usize) -> impl Iterator<Item = usize> {
    let first = align_down(beg);
    let last = if end <= beg { first } else { align_up(end) };
    (first..last).step_by(GRANULE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align() {
        assert_eq!(align_down(0), 0);
        assert_eq!(align_down(7), 0);
        assert_eq!(align_down(8), 8);
        assert_eq!(align_down(15), 8);
        assert_eq!(align_up(0), 0);
        assert_eq!(align_up(1), 8);
        assert_eq!(align_up(8), 8);
        assert_eq!(align_up(9), 16);
    }

    #[test]
    fn test_offsets() {
        assert!(is_granule_aligned(16));
        assert!(!is_granule_aligned(10));
        assert_eq!(granule_offset(10), 2);
        assert_eq!(granule_index(10), 1);
    }

    #[test]
    fn test_granules_spanned() {
        assert_eq!(granules_spanned(0, 0), 0);
        assert_eq!(granules_spanned(0, 24), 3);
        assert_eq!(granules_spanned(0, 12), 2);
        assert_eq!(granules_spanned(9, 10), 1);
        assert_eq!(granules_spanned(7, 9), 2);
    }

    #[test]
    fn test_granule_starts() {
        let starts: Vec<usize> = granule_starts(3, 17).collect();
        assert_eq!(starts, vec![0, 8, 16]);
        assert_eq!(granule_starts(16, 16).count(), 0);
    }
}
