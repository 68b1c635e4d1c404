//! The shadow table collaborator.
//!
//! The annotator and verifier never own shadow storage. They read and write
//! per-granule state through [`ShadowTable`], which maps a granule-aligned
//! real address to its [`GranuleState`]. Establishing shadow for a fresh
//! allocation, and discarding it afterwards, is the owner's job and lives on
//! the separate [`ShadowOwner`] trait.

pub mod granule;
pub mod memory;
pub mod shared;

pub use granule::{GranuleState, PoisonKind};
pub use memory::MemoryShadow;
pub use shared::{SharedShadow, ShadowLock};

use crate::util::layout::{align_down, GRANULE};

/// Per-granule shadow storage.
///
/// Addresses passed to both methods are granule-aligned.
pub trait ShadowTable {
    /// Read the state of the granule starting at `addr`.
    fn read_granule(&self, addr: usize) -> GranuleState;

    /// Overwrite the state of the granule starting at `addr`.
    fn write_granule(&mut self, addr: usize, state: GranuleState);

    /// Write `state` to every granule in `[beg, end)`.
    ///
    /// Both bounds are granule-aligned.
    fn fill_granules(&mut self, beg: usize, end: usize, state: GranuleState) {
        let mut addr = beg;
        while addr < end {
            self.write_granule(addr, state);
            addr += GRANULE;
        }
    }
}

/// Allocation-level operations owned by the umbrella tool.
///
/// The container layer calls these only around a buffer's lifetime: once
/// after allocating it and once before freeing it.
pub trait ShadowOwner: ShadowTable {
    /// Mark `[beg, beg + size)` addressable, with a partial tail granule when
    /// `size` is not a multiple of the granule size.
    fn unpoison_allocation(&mut self, beg: usize, size: usize) {
        let end = beg + size;
        let full_end = align_down(end);
        self.fill_granules(beg, full_end, GranuleState::Valid);
        if full_end != end {
            self.write_granule(full_end, GranuleState::with_prefix(end - full_end));
        }
    }

    /// Drop every entry for granules overlapping `[beg, beg + size)`.
    fn discard(&mut self, beg: usize, size: usize);
}
