//! Diagnostic emission backend.
//!
//! Handles outputting diagnostics to the report sink, logs, or custom sinks.

use std::sync::atomic::{AtomicBool, Ordering};

use super::kind::{Diagnostic, DiagnosticKind};
use super::strict::{should_panic, should_panic_on_warning};

/// Global flag to suppress diagnostic output (for testing).
static DIAGNOSTICS_SUPPRESSED: AtomicBool = AtomicBool::new(false);

/// Global flag to enable verbose diagnostics.
static VERBOSE_DIAGNOSTICS: AtomicBool = AtomicBool::new(false);

/// Suppress all diagnostic output.
pub fn suppress_diagnostics(suppress: bool) {
    DIAGNOSTICS_SUPPRESSED.store(suppress, Ordering::Relaxed);
}

/// Enable verbose diagnostic output.
pub fn set_verbose(verbose: bool) {
    VERBOSE_DIAGNOSTICS.store(verbose, Ordering::Relaxed);
}

/// Check if diagnostics are suppressed.
pub fn is_suppressed() -> bool {
    DIAGNOSTICS_SUPPRESSED.load(Ordering::Relaxed)
}

/// Emit a diagnostic to the report sink.
///
/// In release builds without the `diagnostics` feature, nothing is written.
/// Strict mode applies either way.
pub fn emit(diag: &Diagnostic) {
    dispatch(diag, None);
}

/// Emit a diagnostic with additional runtime context.
pub fn emit_with_context(diag: &Diagnostic, context: &str) {
    dispatch(diag, Some(context));
}

fn dispatch(diag: &Diagnostic, context: Option<&str>) {
    if is_suppressed() {
        return;
    }

    #[cfg(any(debug_assertions, feature = "diagnostics"))]
    {
        crate::report::write_report(&format_diagnostic(diag, context));
        if diag.kind == DiagnosticKind::Error {
            crate::report::report_error_summary(&summary_line(diag, context));
        }
    }

    #[cfg(feature = "log")]
    {
        emit_to_log(diag, context);
    }

    let fatal = match diag.kind {
        DiagnosticKind::Error => should_panic(),
        DiagnosticKind::Warning => should_panic_on_warning(),
        DiagnosticKind::Note | DiagnosticKind::Help => false,
    };
    if fatal {
        crate::report::run_death_callback();
        match context {
            Some(context) => panic!(
                "[contshadow][{}] {}\nContext: {}\nStrict mode enabled - errors are fatal.",
                diag.code, diag.message, context
            ),
            None => panic!(
                "[contshadow][{}] {}\nStrict mode enabled - errors are fatal.",
                diag.code, diag.message
            ),
        }
    }
}

/// Render a diagnostic the way it is written to the report sink.
pub fn format_diagnostic(diag: &Diagnostic, context: Option<&str>) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "[contshadow][{}] {}: {}",
        diag.code,
        diag.kind.prefix(),
        diag.message
    );
    if let Some(context) = context {
        let _ = writeln!(out, "  context: {}", context);
    }
    if let Some(note) = diag.note {
        let _ = writeln!(out, "  note: {}", note);
    }
    if let Some(help) = diag.help {
        let _ = writeln!(out, "  help: {}", help);
    }
    if VERBOSE_DIAGNOSTICS.load(Ordering::Relaxed) && diag.kind == DiagnosticKind::Error {
        let _ = writeln!(out, "  hint: enable the `debug` feature and call print_stack_trace()");
    }
    // Blank line for readability
    out.push('\n');
    out
}

#[cfg(any(debug_assertions, feature = "diagnostics"))]
fn summary_line(diag: &Diagnostic, context: Option<&str>) -> String {
    match context {
        Some(context) => format!("{} {} ({})", diag.code, diag.message, context),
        None => format!("{} {}", diag.code, diag.message),
    }
}

/// Emit a diagnostic using the log crate.
#[cfg(feature = "log")]
pub fn emit_to_log(diag: &Diagnostic, context: Option<&str>) {
    match diag.kind {
        DiagnosticKind::Error => {
            log::error!("[{}] {}", diag.code, diag.message);
        }
        DiagnosticKind::Warning => {
            log::warn!("[{}] {}", diag.code, diag.message);
        }
        DiagnosticKind::Note | DiagnosticKind::Help => {
            log::info!("[{}] {}", diag.code, diag.message);
        }
    }

    if let Some(context) = context {
        log::info!("  context: {}", context);
    }
    if let Some(note) = diag.note {
        log::info!("  note: {}", note);
    }
    if let Some(help) = diag.help {
        log::info!("  help: {}", help);
    }
}

/// A diagnostic sink trait for custom output.
pub trait DiagnosticSink: Send + Sync {
    /// Handle a diagnostic.
    fn emit(&self, diag: &Diagnostic);
}

/// A simple sink that collects diagnostics.
#[derive(Default)]
pub struct CollectingSink {
    diagnostics: crate::sync::Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    /// Create a new collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all collected diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Clear collected diagnostics.
    pub fn clear(&self) {
        self.diagnostics.lock().clear();
    }

    /// Check if any errors were collected.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .lock()
            .iter()
            .any(|d| d.kind == DiagnosticKind::Error)
    }

    /// Check if a diagnostic with `code` was collected.
    pub fn has_code(&self, code: &str) -> bool {
        self.diagnostics.lock().iter().any(|d| d.code == code)
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diag: &Diagnostic) {
        self.diagnostics.lock().push(diag.clone());
    }
}
