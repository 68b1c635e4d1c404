//! Debug utilities for tracking annotations.
//!
//! Only compiled when the `debug` feature is enabled.

pub(crate) mod backtrace;

pub use backtrace::{AnnotationTrace, AnnotationTracker};
