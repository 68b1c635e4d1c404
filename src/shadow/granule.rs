//! Granule states and their shadow-byte encoding.
//!
//! One shadow byte describes one 8-byte granule:
//!
//! | Byte        | State                                   |
//! |-------------|-----------------------------------------|
//! | `0`         | all 8 bytes addressable                 |
//! | `1..=7`     | first `k` bytes addressable             |
//! | `0x80..`    | no byte addressable; value names a kind |

use crate::util::layout::GRANULE;

/// Why a granule is unaddressable.
///
/// Only [`PoisonKind::ContainerOverflow`] is written by the annotator. The
/// other kinds belong to whoever owns the shadow table and are listed so a
/// table can round-trip their bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoisonKind {
    /// Reserved-but-unused capacity of a contiguous container.
    ContainerOverflow,
    /// Redzone to the left of a heap chunk.
    HeapLeftRedzone,
    /// Freed heap memory.
    HeapFreed,
    /// Redzone to the left of a stack frame.
    StackLeftRedzone,
    /// Redzone between stack variables.
    StackMidRedzone,
    /// Redzone to the right of a stack frame.
    StackRightRedzone,
    /// Stack memory after the function returned.
    StackAfterReturn,
    /// Memory poisoned explicitly by the user.
    UserPoisoned,
    /// Redzone after a global.
    GlobalRedzone,
    /// Any other magic byte.
    Other(u8),
}

impl PoisonKind {
    /// The shadow byte this kind is stored as.
    pub const fn magic(self) -> u8 {
        match self {
            PoisonKind::HeapLeftRedzone => 0xfa,
            PoisonKind::HeapFreed => 0xfd,
            PoisonKind::StackLeftRedzone => 0xf1,
            PoisonKind::StackMidRedzone => 0xf2,
            PoisonKind::StackRightRedzone => 0xf3,
            PoisonKind::StackAfterReturn => 0xf5,
            PoisonKind::UserPoisoned => 0xf7,
            PoisonKind::GlobalRedzone => 0xf9,
            PoisonKind::ContainerOverflow => 0xfc,
            PoisonKind::Other(byte) => byte,
        }
    }

    /// Decode a poison magic. Bytes below `0x80` are not poison and yield `None`.
    pub const fn from_magic(byte: u8) -> Option<Self> {
        if byte < 0x80 {
            return None;
        }
        Some(match byte {
            0xfa => PoisonKind::HeapLeftRedzone,
            0xfd => PoisonKind::HeapFreed,
            0xf1 => PoisonKind::StackLeftRedzone,
            0xf2 => PoisonKind::StackMidRedzone,
            0xf3 => PoisonKind::StackRightRedzone,
            0xf5 => PoisonKind::StackAfterReturn,
            0xf7 => PoisonKind::UserPoisoned,
            0xf9 => PoisonKind::GlobalRedzone,
            0xfc => PoisonKind::ContainerOverflow,
            other => PoisonKind::Other(other),
        })
    }
}

/// Validity state of one granule.
///
/// Fresh shadow is all zero, so the default is `Valid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GranuleState {
    /// All bytes are live.
    #[default]
    Valid,
    /// The first `k` bytes are live, `0 < k < 8`.
    Partial(u8),
    /// No byte is live.
    Invalid(PoisonKind),
}

impl GranuleState {
    /// The state the annotator writes for reserved capacity.
    pub const RESERVED: GranuleState = GranuleState::Invalid(PoisonKind::ContainerOverflow);

    /// State of a granule whose first `len` bytes are live.
    ///
    /// `len == 0` maps to [`GranuleState::RESERVED`], `len >= 8` to `Valid`.
    pub const fn with_prefix(len: usize) -> Self {
        if len == 0 {
            GranuleState::RESERVED
        } else if len >= GRANULE {
            GranuleState::Valid
        } else {
            GranuleState::Partial(len as u8)
        }
    }

    /// Number of leading addressable bytes (0 to 8).
    #[inline]
    pub const fn addressable_len(self) -> usize {
        match self {
            GranuleState::Valid => GRANULE,
            GranuleState::Partial(k) => k as usize,
            GranuleState::Invalid(_) => 0,
        }
    }

    /// Returns true if the byte at `offset` inside this granule is addressable.
    #[inline]
    pub const fn is_addressable(self, offset: usize) -> bool {
        offset < self.addressable_len()
    }

    /// Encode as a shadow byte.
    pub const fn to_shadow_byte(self) -> u8 {
        match self {
            GranuleState::Valid => 0,
            GranuleState::Partial(k) => k,
            GranuleState::Invalid(kind) => kind.magic(),
        }
    }

    /// Decode a shadow byte.
    ///
    /// Values `8..=0x7f` are never written here; they decode as `Valid`
    /// since every in-granule offset compares below them.
    pub const fn from_shadow_byte(byte: u8) -> Self {
        match byte {
            0 => GranuleState::Valid,
            1..=7 => GranuleState::Partial(byte),
            8..=0x7f => GranuleState::Valid,
            _ => match PoisonKind::from_magic(byte) {
                Some(kind) => GranuleState::Invalid(kind),
                None => GranuleState::Valid,
            },
        }
    }
}

impl std::fmt::Display for GranuleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GranuleState::Valid => write!(f, "valid"),
            GranuleState::Partial(k) => write!(f, "partial({})", k),
            GranuleState::Invalid(kind) => write!(f, "invalid({:#04x})", kind.magic()),
        }
    }
}
