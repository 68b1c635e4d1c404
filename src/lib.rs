//! # contshadow
//!
//! Shadow-memory annotations for contiguous containers.
//!
//! A contiguous container (a vector, a string, a deque block) owns a buffer
//! `[beg, end)` but only `[beg, mid)` holds live elements. This crate keeps a
//! per-granule shadow table in step with that boundary, so a checker can
//! tell a read of spare capacity from a read of live data.
//!
//! ## Features
//!
//! - Boundary annotation that rewrites only the granules the boundary crossed
//! - Sampled or full verification of a region against a boundary
//! - A pluggable shadow table ([`ShadowTable`]) with an in-memory
//!   implementation ([`MemoryShadow`])
//! - [`ShadowedVec`], a fixed-capacity vector that keeps its own shadow exact
//! - Coded diagnostics (`CS0xx`-`CS2xx`), strict mode, and a report facade
//!
//! ## Shadow encoding
//!
//! Memory is split into 8-byte granules. Each granule's shadow is one of:
//! fully addressable, addressable for its first `k` bytes (`1 <= k <= 7`),
//! or poisoned with a magic value. Container spare capacity uses
//! [`PoisonKind::ContainerOverflow`] (`0xfc`).
//!
//! ## Quick Start
//!
//! ```rust
//! use contshadow::{ContainerShadow, MemoryShadow, ShadowConfig};
//!
//! let shadow = ContainerShadow::new(MemoryShadow::new(), ShadowConfig::default());
//!
//! // A fresh 64-byte buffer reads as fully addressable (mid == end).
//! // Shrink it to 20 live bytes, then grow to 40.
//! shadow.annotate(0x1000, 0x1040, 0x1040, 0x1014);
//! shadow.annotate(0x1000, 0x1040, 0x1014, 0x1028);
//! assert!(shadow.verify(0x1000, 0x1028, 0x1040));
//!
//! // Before freeing, hand the whole buffer back.
//! shadow.annotate(0x1000, 0x1040, 0x1028, 0x1040);
//! ```
//!
//! The free functions [`annotate_contiguous_container`] and
//! [`verify_contiguous_container`] work on any `ShadowTable` directly, with
//! no locking, configuration or statistics.

pub mod api;
pub mod container;
pub mod diagnostics;
pub mod report;
pub mod shadow;

mod sync;
pub mod util;

#[cfg(feature = "debug")]
pub mod debug;

// Re-export public API at crate root for convenience
pub use api::config::ShadowConfig;
pub use api::shadow::ContainerShadow;
pub use api::stats::ShadowStats;

// Shadow tables
pub use shadow::{
    GranuleState, MemoryShadow, PoisonKind, ShadowLock, ShadowOwner, ShadowTable, SharedShadow,
};

// Container annotations
pub use container::{
    annotate_contiguous_container, annotation_cost, verify_contiguous_container,
    verify_contiguous_container_with, Region, ShadowedVec, ShadowedVecIntoIter, VerifyMode,
    DEFAULT_SAMPLE_RADIUS,
};

// Diagnostics - Core types and predefined codes
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, CollectingSink};
pub use diagnostics::{StrictMode, set_strict_mode, StrictModeGuard};
pub use diagnostics::{CS001, CS002, CS101, CS201};

// Report facade
pub use report::{
    clear_death_callback, clear_error_summary_hook, print_stack_trace, report_error_summary,
    set_death_callback, set_error_summary_hook, set_report_path,
};

pub use util::layout::GRANULE;
