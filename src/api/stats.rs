//! Annotation statistics.

use crate::sync::AtomicCounter;
use crate::util::layout::GRANULE;

/// Aggregated annotation statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowStats {
    /// Annotations that moved a boundary.
    pub annotations: u64,

    /// Granule writes those annotations performed.
    pub granules_written: u64,

    /// Annotations skipped because the arguments broke the contract.
    pub rejected_annotations: u64,

    /// Verifications run (explicit, checks, and after-annotate checks).
    pub verifications: u64,

    /// Verifications that found an inconsistent region.
    pub verify_failures: u64,
}

impl ShadowStats {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Average granule writes per annotation.
    pub fn granules_per_annotation(&self) -> f64 {
        if self.annotations == 0 {
            return 0.0;
        }
        self.granules_written as f64 / self.annotations as f64
    }
}

impl std::fmt::Display for ShadowStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Shadow Statistics:")?;
        writeln!(f, "  Annotations:      {}", self.annotations)?;
        writeln!(
            f,
            "  Granules written: {} ({} bytes of memory)",
            self.granules_written,
            self.granules_written * GRANULE as u64
        )?;
        writeln!(f, "  Rejected:         {}", self.rejected_annotations)?;
        writeln!(f, "  Verifications:    {}", self.verifications)?;
        writeln!(f, "  Failures:         {}", self.verify_failures)?;
        Ok(())
    }
}

/// Live counters behind [`ShadowStats`].
#[derive(Default)]
pub(crate) struct StatsCounters {
    pub annotations: AtomicCounter,
    pub granules_written: AtomicCounter,
    pub rejected_annotations: AtomicCounter,
    pub verifications: AtomicCounter,
    pub verify_failures: AtomicCounter,
}

impl StatsCounters {
    pub fn snapshot(&self) -> ShadowStats {
        ShadowStats {
            annotations: self.annotations.get(),
            granules_written: self.granules_written.get(),
            rejected_annotations: self.rejected_annotations.get(),
            verifications: self.verifications.get(),
            verify_failures: self.verify_failures.get(),
        }
    }

    pub fn reset(&self) {
        self.annotations.reset();
        self.granules_written.reset();
        self.rejected_annotations.reset();
        self.verifications.reset();
        self.verify_failures.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_display() {
        let counters = StatsCounters::default();
        counters.annotations.add(2);
        counters.granules_written.add(256);
        counters.verifications.increment();

        let stats = counters.snapshot();
        assert_eq!(stats.granules_per_annotation(), 128.0);
        let text = stats.to_string();
        assert!(text.contains("Granules written: 256 (2048 bytes of memory)"));

        counters.reset();
        assert_eq!(counters.snapshot(), ShadowStats::new());
    }
}
