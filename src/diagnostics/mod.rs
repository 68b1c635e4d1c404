//! Coded diagnostics.
//!
//! This module provides:
//! - **Runtime diagnostics**: annotation-aware error messages with codes
//! - **Sinks**: capture diagnostics per container handle
//! - **Strict mode**: optional panic-on-error for CI
//!
//! ## Diagnostic Codes
//!
//! | Code  | Meaning                                  |
//! |-------|------------------------------------------|
//! | CS0xx | Annotation contract violations           |
//! | CS1xx | Shadow state inconsistent with the size  |
//! | CS2xx | Container buffer issues                  |
//!
//! Output goes to the report sink configured in [`crate::report`].

pub mod kind;
pub mod emit;
pub mod strict;
pub mod macros;

pub use kind::{Diagnostic, DiagnosticKind};
pub use emit::{
    emit, emit_with_context, set_verbose, suppress_diagnostics, CollectingSink, DiagnosticSink,
};
pub use strict::{StrictMode, set_strict_mode, strict_mode, StrictModeGuard, init_from_env};

pub use kind::{CS001, CS002, CS101, CS201};
