//! Diagnostic macros.
//!
//! Thin wrappers over [`emit`](super::emit::emit) that compile away in release
//! builds without the `diagnostics` feature.

/// Emit a predefined diagnostic by code, optionally with formatted context.
///
/// # Example
///
/// ```rust,ignore
/// cs_emit!(CS101);
/// cs_emit!(CS101, "region {} mid {:#x}", region, mid);
/// ```
#[macro_export]
macro_rules! cs_emit {
    ($code:ident) => {{
        #[cfg(any(debug_assertions, feature = "diagnostics"))]
        {
            $crate::diagnostics::emit::emit(&$crate::diagnostics::$code);
        }
    }};
    ($code:ident, $($ctx:tt)+) => {{
        #[cfg(any(debug_assertions, feature = "diagnostics"))]
        {
            $crate::diagnostics::emit::emit_with_context(
                &$crate::diagnostics::$code,
                &format!($($ctx)+),
            );
        }
    }};
}

// Re-export macros at crate root for convenience
pub use crate::cs_emit;
