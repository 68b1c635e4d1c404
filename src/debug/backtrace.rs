//! Annotation backtrace tracking.
//!
//! Records where each region's boundary was last moved, so a failed
//! verification can point at the code that left the shadow behind.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::sync::Mutex;

/// Capture the current stack trace as text.
pub fn capture_stack_trace() -> String {
    format!("{:?}\n", ::backtrace::Backtrace::new())
}

/// The last annotation seen for a region.
#[derive(Clone, Debug)]
pub struct AnnotationTrace {
    /// Start of the region
    pub beg: usize,

    /// End of the region
    pub end: usize,

    /// Boundary after the annotation
    pub mid: usize,

    /// Captured backtrace
    pub backtrace: String,

    /// Sequence number of the annotation
    pub sequence: u64,
}

/// Per-region record of the most recent annotation.
pub struct AnnotationTracker {
    traces: Mutex<HashMap<usize, AnnotationTrace>>,
    sequence: AtomicU64,
}

impl AnnotationTracker {
    /// Create a new tracker.
    pub fn new() -> Self {
        Self {
            traces: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Record an annotation of `[beg, end)` that moved the boundary to `mid`.
    pub fn record_annotation(&self, beg: usize, end: usize, mid: usize) {
        let trace = AnnotationTrace {
            beg,
            end,
            mid,
            backtrace: capture_stack_trace(),
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        };
        self.traces.lock().insert(beg, trace);
    }

    /// Forget a region once its buffer is released.
    pub fn forget(&self, beg: usize) {
        self.traces.lock().remove(&beg);
    }

    /// Get the last annotation of the region starting at `beg`.
    pub fn last_annotation(&self, beg: usize) -> Option<AnnotationTrace> {
        self.traces.lock().get(&beg).cloned()
    }

    /// Number of regions with a recorded annotation.
    pub fn tracked_regions(&self) -> usize {
        self.traces.lock().len()
    }

    /// Describe the last annotation of a region for a report.
    pub fn describe(&self, beg: usize) -> String {
        match self.last_annotation(beg) {
            Some(trace) => format!(
                "[contshadow] region [{:#x}, {:#x}) last annotated to mid {:#x} (#{}) at:\n{}",
                trace.beg, trace.end, trace.mid, trace.sequence, trace.backtrace
            ),
            None => format!("[contshadow] no annotation recorded for region at {:#x}\n", beg),
        }
    }
}

impl Default for AnnotationTracker {
    fn default() -> Self {
        Self::new()
    }
}
