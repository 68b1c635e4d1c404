//! Diagnostic kinds and core types.
//!
//! Mirrors rustc's diagnostic levels for familiar UX.

/// The severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A hard error - something is definitely wrong.
    Error,
    /// A warning - something is probably wrong or suboptimal.
    Warning,
    /// Additional context about another diagnostic.
    Note,
    /// Actionable suggestion to fix the issue.
    Help,
}

impl DiagnosticKind {
    /// Get the display prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Note => "note",
            DiagnosticKind::Help => "help",
        }
    }
}

/// A diagnostic message with code, message, and optional context.
///
/// Diagnostic codes follow the pattern:
/// - `CS0xx` - Annotation contract violations
/// - `CS1xx` - Shadow state inconsistencies
/// - `CS2xx` - Container buffer issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level.
    pub kind: DiagnosticKind,
    /// Diagnostic code (e.g., "CS101").
    pub code: &'static str,
    /// Primary message.
    pub message: &'static str,
    /// Optional additional context.
    pub note: Option<&'static str>,
    /// Optional fix suggestion.
    pub help: Option<&'static str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub const fn error(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Create a new warning diagnostic.
    pub const fn warning(code: &'static str, message: &'static str) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            code,
            message,
            note: None,
            help: None,
        }
    }

    /// Add a note to this diagnostic.
    pub const fn with_note(mut self, note: &'static str) -> Self {
        self.note = Some(note);
        self
    }

    /// Add a help message to this diagnostic.
    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// =============================================================================
// Predefined diagnostics (CS0xx - Annotation contract)
// =============================================================================

/// CS001: Boundaries passed to an annotation are out of order.
pub const CS001: Diagnostic = Diagnostic::error(
    "CS001",
    "container annotation bounds are not ordered beg <= mid <= end"
).with_note("both the old and the new boundary must lie inside [beg, end)")
 .with_help("pass the buffer start and end, then the size positions before and after the change");

/// CS002: Container start is not granule-aligned.
pub const CS002: Diagnostic = Diagnostic::error(
    "CS002",
    "container beginning is not 8-aligned"
).with_note("a granule split at beg cannot be represented in shadow memory")
 .with_help("allocate the backing buffer with at least 8-byte alignment");

// =============================================================================
// Predefined diagnostics (CS1xx - Shadow state)
// =============================================================================

/// CS101: Shadow state does not match the container's size.
pub const CS101: Diagnostic = Diagnostic::error(
    "CS101",
    "container shadow state is inconsistent with its size"
).with_note("[beg, mid) must be addressable and [mid, end) poisoned")
 .with_help("annotate every size change; nothing else may write this region's shadow");

// =============================================================================
// Predefined diagnostics (CS2xx - Container buffers)
// =============================================================================

/// CS201: Backing buffer could not be allocated.
pub const CS201: Diagnostic = Diagnostic::warning(
    "CS201",
    "shadowed container buffer allocation failed"
).with_note("the requested capacity overflowed or the allocator returned null")
 .with_help("request a smaller capacity");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_codes() {
        assert_eq!(CS001.code, "CS001");
        assert_eq!(CS001.kind, DiagnosticKind::Error);
        assert!(CS101.note.is_some());
        assert_eq!(CS201.kind.prefix(), "warning");
    }
}
