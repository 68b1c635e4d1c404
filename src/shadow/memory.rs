//! In-memory shadow table.
//!
//! Stores one shadow byte per granule in a sparse map keyed by granule index.
//! Absent entries read as zero (fully addressable), the same as freshly
//! mapped shadow memory. Useful for tests and for tracking containers in
//! processes that have no real instrumentation.

use std::collections::HashMap;

use super::granule::{GranuleState, PoisonKind};
use super::{ShadowOwner, ShadowTable};
use crate::sync::AtomicCounter;
use crate::util::layout::{align_down, align_up, granule_index, granule_starts, GRANULE};

/// A sparse, heap-backed shadow table.
#[derive(Default)]
pub struct MemoryShadow {
    bytes: HashMap<usize, u8>,
    reads: AtomicCounter,
    writes: AtomicCounter,
}

impl MemoryShadow {
    /// Create an empty table. Every granule starts out valid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw shadow byte for the granule containing `addr`.
    pub fn shadow_byte(&self, addr: usize) -> u8 {
        self.bytes.get(&granule_index(addr)).copied().unwrap_or(0)
    }

    /// State of the granule containing `addr`, without counting the read.
    pub fn peek(&self, addr: usize) -> GranuleState {
        GranuleState::from_shadow_byte(self.shadow_byte(addr))
    }

    /// States of all granules overlapping `[beg, end)`, without counting reads.
    pub fn snapshot(&self, beg: usize, end: usize) -> Vec<GranuleState> {
        granule_starts(beg, end).map(|addr| self.peek(addr)).collect()
    }

    /// Poison every granule overlapping `[beg, beg + size)` with `kind`.
    ///
    /// Owner-side helper for laying out redzones around a buffer.
    pub fn poison(&mut self, beg: usize, size: usize, kind: PoisonKind) {
        for addr in granule_starts(beg, beg + size) {
            self.store(addr, GranuleState::Invalid(kind));
        }
    }

    /// Number of granules with a non-zero shadow byte.
    pub fn tracked_granules(&self) -> usize {
        self.bytes.len()
    }

    /// Granule reads performed through [`ShadowTable::read_granule`].
    pub fn reads(&self) -> u64 {
        self.reads.get()
    }

    /// Granule writes performed through [`ShadowTable::write_granule`].
    pub fn writes(&self) -> u64 {
        self.writes.get()
    }

    /// Reset the read and write counters.
    pub fn reset_counters(&self) {
        self.reads.reset();
        self.writes.reset();
    }

    fn store(&mut self, addr: usize, state: GranuleState) {
        let index = granule_index(addr);
        match state.to_shadow_byte() {
            0 => {
                self.bytes.remove(&index);
            }
            byte => {
                self.bytes.insert(index, byte);
            }
        }
    }
}

impl ShadowTable for MemoryShadow {
    fn read_granule(&self, addr: usize) -> GranuleState {
        debug_assert_eq!(addr % GRANULE, 0);
        self.reads.increment();
        self.peek(addr)
    }

    fn write_granule(&mut self, addr: usize, state: GranuleState) {
        debug_assert_eq!(addr % GRANULE, 0);
        self.writes.increment();
        self.store(addr, state);
    }
}

impl ShadowOwner for MemoryShadow {
    fn discard(&mut self, beg: usize, size: usize) {
        let first = granule_index(align_down(beg));
        let last = granule_index(align_up(beg + size));
        if last - first > self.bytes.len() {
            self.bytes.retain(|index, _| *index < first || *index >= last);
        } else {
            for index in first..last {
                self.bytes.remove(&index);
            }
        }
    }
}

impl std::fmt::Debug for MemoryShadow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryShadow")
            .field("tracked_granules", &self.bytes.len())
            .field("reads", &self.reads.get())
            .field("writes", &self.writes.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_table_is_valid() {
        let shadow = MemoryShadow::new();
        assert_eq!(shadow.peek(0x1000), GranuleState::Valid);
        assert_eq!(shadow.tracked_granules(), 0);
    }

    #[test]
    fn test_read_write_counts() {
        let mut shadow = MemoryShadow::new();
        shadow.write_granule(0x1000, GranuleState::Partial(3));
        assert_eq!(shadow.read_granule(0x1000), GranuleState::Partial(3));
        assert_eq!(shadow.shadow_byte(0x1004), 3);
        assert_eq!(shadow.writes(), 1);
        assert_eq!(shadow.reads(), 1);

        shadow.reset_counters();
        assert_eq!(shadow.writes(), 0);
        assert_eq!(shadow.reads(), 0);
    }

    #[test]
    fn test_writing_valid_drops_entry() {
        let mut shadow = MemoryShadow::new();
        shadow.write_granule(0x40, GranuleState::RESERVED);
        assert_eq!(shadow.tracked_granules(), 1);
        shadow.write_granule(0x40, GranuleState::Valid);
        assert_eq!(shadow.tracked_granules(), 0);
    }

    #[test]
    fn test_unpoison_allocation_with_unaligned_size() {
        let mut shadow = MemoryShadow::new();
        shadow.poison(0x100, 32, PoisonKind::HeapFreed);
        shadow.unpoison_allocation(0x100, 12);
        assert_eq!(
            shadow.snapshot(0x100, 0x120),
            vec![
                GranuleState::Valid,
                GranuleState::Partial(4),
                GranuleState::Invalid(PoisonKind::HeapFreed),
                GranuleState::Invalid(PoisonKind::HeapFreed),
            ]
        );
    }

    #[test]
    fn test_discard() {
        let mut shadow = MemoryShadow::new();
        shadow.poison(0x100, 64, PoisonKind::UserPoisoned);
        shadow.discard(0x108, 16);
        assert_eq!(shadow.peek(0x100), GranuleState::Invalid(PoisonKind::UserPoisoned));
        assert_eq!(shadow.peek(0x108), GranuleState::Valid);
        assert_eq!(shadow.peek(0x110), GranuleState::Valid);
        assert_eq!(shadow.peek(0x118), GranuleState::Invalid(PoisonKind::UserPoisoned));
        assert_eq!(shadow.tracked_granules(), 6);
    }
}
