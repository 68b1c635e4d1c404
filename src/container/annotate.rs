//! Poisoning the reserved tail of a contiguous container.
//!
//! A container owns `[beg, end)`. Bytes in `[beg, mid)` hold elements and
//! must stay addressable; bytes in `[mid, end)` are spare capacity and are
//! poisoned so any access to them is flagged. Each time `mid` moves, only the
//! granules between the old and the new position are rewritten.

use crate::shadow::{GranuleState, ShadowTable};
use crate::util::layout::{align_down, align_up};

/// Move the live/reserved boundary of `[beg, end)` from `old_mid` to `new_mid`.
///
/// After the call `[beg, new_mid)` reads as addressable and `[new_mid, end)`
/// as poisoned. The granule containing an unaligned `new_mid` becomes
/// [`GranuleState::Partial`] with `new_mid % 8` live bytes.
///
/// Exactly `(align_up(max) - align_down(min)) / 8` granules are written,
/// where `min`/`max` are the smaller and larger of the two boundaries;
/// granules outside that span are never touched. Calling with
/// `old_mid == new_mid` writes nothing.
///
/// Requirements (not checked):
/// - `beg <= old_mid <= end` and `beg <= new_mid <= end`;
/// - `beg` is 8-aligned;
/// - `end` is 8-aligned or is the true end of its allocation;
/// - `[beg, old_mid)` currently reads as the annotator left it for `old_mid`
///   (or the region is freshly allocated and `old_mid == end`).
///
/// Not atomic: callers serialize concurrent annotations of the same region.
pub fn annotate_contiguous_container<S>(
    shadow: &mut S,
    beg: usize,
    end: usize,
    old_mid: usize,
    new_mid: usize,
) where
    S: ShadowTable + ?Sized,
{
    debug_assert!(beg <= end);
    if old_mid == new_mid {
        return;
    }

    let a = align_down(old_mid.min(new_mid));
    let c = align_up(old_mid.max(new_mid));
    let b1 = align_down(new_mid);
    let b2 = align_up(new_mid);

    // [a, b1) live, [b2, c) reserved, [b1, b2) straddles new_mid
    shadow.fill_granules(a, b1, GranuleState::Valid);
    shadow.fill_granules(b2, c, GranuleState::RESERVED);
    if b1 != b2 {
        shadow.write_granule(b1, GranuleState::with_prefix(new_mid - b1));
    }
}

/// Number of granule writes [`annotate_contiguous_container`] performs.
#[inline]
pub fn annotation_cost(old_mid: usize, new_mid: usize) -> usize {
    if old_mid == new_mid {
        return 0;
    }
    crate::util::layout::granules_spanned(old_mid.min(new_mid), old_mid.max(new_mid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::{MemoryShadow, PoisonKind, ShadowOwner};

    const BASE: usize = 0x1000;

    #[test]
    fn test_shrink_to_unaligned_mid() {
        let mut shadow = MemoryShadow::new();
        annotate_contiguous_container(&mut shadow, BASE, BASE + 24, BASE + 24, BASE + 10);
        assert_eq!(
            shadow.snapshot(BASE, BASE + 24),
            vec![
                GranuleState::Valid,
                GranuleState::Partial(2),
                GranuleState::RESERVED,
            ]
        );
    }

    #[test]
    fn test_move_back_restores_state() {
        let mut shadow = MemoryShadow::new();
        annotate_contiguous_container(&mut shadow, BASE, BASE + 24, BASE + 24, BASE + 10);
        let before = shadow.snapshot(BASE, BASE + 24);

        annotate_contiguous_container(&mut shadow, BASE, BASE + 24, BASE + 10, BASE + 24);
        assert_eq!(shadow.snapshot(BASE, BASE + 24), vec![GranuleState::Valid; 3]);

        annotate_contiguous_container(&mut shadow, BASE, BASE + 24, BASE + 24, BASE + 10);
        assert_eq!(shadow.snapshot(BASE, BASE + 24), before);
    }

    #[test]
    fn test_same_mid_writes_nothing() {
        let mut shadow = MemoryShadow::new();
        annotate_contiguous_container(&mut shadow, BASE, BASE + 64, BASE + 13, BASE + 13);
        assert_eq!(shadow.writes(), 0);
        assert_eq!(shadow.tracked_granules(), 0);
    }

    #[test]
    fn test_write_count_tracks_distance_not_size() {
        let mut shadow = MemoryShadow::new();
        let end = BASE + 4096;
        annotate_contiguous_container(&mut shadow, BASE, end, end, BASE);
        assert_eq!(shadow.writes(), 512);

        shadow.reset_counters();
        annotate_contiguous_container(&mut shadow, BASE, end, BASE, BASE + 8);
        assert_eq!(shadow.writes(), 1);

        shadow.reset_counters();
        annotate_contiguous_container(&mut shadow, BASE, end, BASE + 8, BASE + 21);
        assert_eq!(shadow.writes(), annotation_cost(BASE + 8, BASE + 21) as u64);
        assert_eq!(shadow.writes(), 2);
    }

    #[test]
    fn test_aligned_mid_has_no_partial_granule() {
        let mut shadow = MemoryShadow::new();
        annotate_contiguous_container(&mut shadow, BASE, BASE + 32, BASE + 32, BASE + 16);
        assert_eq!(
            shadow.snapshot(BASE, BASE + 32),
            vec![
                GranuleState::Valid,
                GranuleState::Valid,
                GranuleState::RESERVED,
                GranuleState::RESERVED,
            ]
        );
    }

    #[test]
    fn test_unaligned_end_round_trip() {
        // 12-byte buffer: the tail granule is partial before and after
        let mut shadow = MemoryShadow::new();
        shadow.poison(BASE + 16, 16, PoisonKind::HeapLeftRedzone);
        shadow.unpoison_allocation(BASE, 12);
        let fresh = shadow.snapshot(BASE, BASE + 32);

        annotate_contiguous_container(&mut shadow, BASE, BASE + 12, BASE + 12, BASE + 4);
        assert_eq!(
            shadow.snapshot(BASE, BASE + 16),
            vec![GranuleState::Partial(4), GranuleState::RESERVED]
        );

        annotate_contiguous_container(&mut shadow, BASE, BASE + 12, BASE + 4, BASE + 12);
        assert_eq!(shadow.snapshot(BASE, BASE + 32), fresh);
    }

    #[test]
    fn test_neighbours_untouched() {
        let mut shadow = MemoryShadow::new();
        shadow.poison(BASE - 16, 16, PoisonKind::HeapLeftRedzone);
        shadow.poison(BASE + 40, 16, PoisonKind::HeapLeftRedzone);

        annotate_contiguous_container(&mut shadow, BASE, BASE + 40, BASE + 40, BASE);
        annotate_contiguous_container(&mut shadow, BASE, BASE + 40, BASE, BASE + 27);

        let redzone = GranuleState::Invalid(PoisonKind::HeapLeftRedzone);
        assert_eq!(shadow.snapshot(BASE - 16, BASE), vec![redzone; 2]);
        assert_eq!(shadow.snapshot(BASE + 40, BASE + 56), vec![redzone; 2]);
    }
}
