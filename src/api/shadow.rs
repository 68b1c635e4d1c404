//! The main annotation handle.

use std::sync::Arc;

use crate::api::config::ShadowConfig;
use crate::api::stats::{ShadowStats, StatsCounters};
use crate::container::annotate::{annotate_contiguous_container, annotation_cost};
use crate::container::vec::ShadowedVec;
use crate::container::verify::{verify_contiguous_container_with, VerifyMode};
use crate::container::Region;
use crate::diagnostics::emit::{emit_with_context, DiagnosticSink};
use crate::diagnostics::{Diagnostic, CS001, CS002, CS101};
use crate::shadow::{SharedShadow, ShadowOwner, ShadowTable};
use crate::util::layout::is_granule_aligned;

#[cfg(feature = "debug")]
use crate::debug::AnnotationTracker;

/// A shadow table plus the policy for annotating and checking containers in it.
///
/// Cheap to clone (internally uses `Arc`); clones share the table, the
/// configuration and the statistics. Every annotation and verification holds
/// the table lock for its whole pass, so calls from different threads never
/// observe a torn granule.
///
/// # Example
///
/// ```rust
/// use contshadow::{ContainerShadow, MemoryShadow, ShadowConfig};
///
/// let shadow = ContainerShadow::new(MemoryShadow::new(), ShadowConfig::default());
///
/// // a 24-byte buffer at 0x1000 that now holds 10 live bytes
/// shadow.annotate(0x1000, 0x1018, 0x1018, 0x100a);
/// assert!(shadow.verify(0x1000, 0x100a, 0x1018));
/// assert!(!shadow.verify(0x1000, 0x1009, 0x1018));
/// ```
pub struct ContainerShadow<S> {
    table: SharedShadow<S>,
    config: Arc<ShadowConfig>,
    stats: Arc<StatsCounters>,
    sink: Option<Arc<dyn DiagnosticSink>>,
    #[cfg(feature = "debug")]
    tracker: Arc<AnnotationTracker>,
}

impl<S> Clone for ContainerShadow<S> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            config: Arc::clone(&self.config),
            stats: Arc::clone(&self.stats),
            sink: self.sink.clone(),
            #[cfg(feature = "debug")]
            tracker: Arc::clone(&self.tracker),
        }
    }
}

impl<S> ContainerShadow<S> {
    /// Wrap a table with the given configuration.
    pub fn new(table: S, config: ShadowConfig) -> Self {
        Self::from_shared(SharedShadow::new(table), config)
    }

    /// Wrap a table with the default configuration.
    pub fn with_defaults(table: S) -> Self {
        Self::new(table, ShadowConfig::default())
    }

    /// Use a table that is already shared with other code.
    pub fn from_shared(table: SharedShadow<S>, config: ShadowConfig) -> Self {
        Self {
            table,
            config: Arc::new(config),
            stats: Arc::new(StatsCounters::default()),
            sink: None,
            #[cfg(feature = "debug")]
            tracker: Arc::new(AnnotationTracker::new()),
        }
    }

    /// Also deliver this handle's diagnostics to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The shared table.
    pub fn table(&self) -> &SharedShadow<S> {
        &self.table
    }

    /// The active configuration.
    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    /// Run `f` with the table locked, e.g. to take a consistent snapshot.
    pub fn with_table<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        self.table.with(f)
    }

    /// Current statistics.
    pub fn stats(&self) -> ShadowStats {
        self.stats.snapshot()
    }

    /// Reset all statistics to zero.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    fn report(&self, diag: &Diagnostic, context: &str) {
        if let Some(sink) = &self.sink {
            sink.emit(diag);
        }
        emit_with_context(diag, context);
    }

    fn contract_holds(&self, beg: usize, end: usize, old_mid: usize, new_mid: usize) -> bool {
        let region = Region::new(beg, end);
        if beg > end
            || !region.contains_boundary(old_mid)
            || !region.contains_boundary(new_mid)
        {
            let context = format!(
                "region {} old_mid {:#x} new_mid {:#x}",
                region, old_mid, new_mid
            );
            self.report(&CS001, &context);
            return false;
        }
        if !is_granule_aligned(beg) {
            self.report(&CS002, &format!("region {}", region));
            return false;
        }
        true
    }

    fn record_verification(&self, consistent: bool, beg: usize, mid: usize, end: usize) {
        self.stats.verifications.increment();
        if consistent {
            return;
        }
        self.stats.verify_failures.increment();

        #[cfg(feature = "debug")]
        {
            if let Some(text) = self.last_annotation_report(beg) {
                crate::report::write_report(&text);
            }
        }

        let context = format!("region {} mid {:#x}", Region::new(beg, end), mid);
        self.report(&CS101, &context);
    }

    /// Where `beg` was last annotated, if reports are written at all.
    #[cfg(feature = "debug")]
    fn last_annotation_report(&self, beg: usize) -> Option<String> {
        if cfg!(any(debug_assertions, feature = "diagnostics"))
            && !crate::diagnostics::emit::is_suppressed()
        {
            Some(self.tracker.describe(beg))
        } else {
            None
        }
    }
}

impl<S: ShadowTable> ContainerShadow<S> {
    /// Move the boundary of `[beg, end)` from `old_mid` to `new_mid`.
    ///
    /// See [`annotate_contiguous_container`] for the exact shadow effect.
    /// With `contract_checks` on, out-of-order bounds (CS001) or an unaligned
    /// `beg` (CS002) are reported and the call does nothing. With
    /// `check_after_annotate` on, the region is verified afterwards and a
    /// mismatch is reported as CS101.
    pub fn annotate(&self, beg: usize, end: usize, old_mid: usize, new_mid: usize) {
        if self.config.contract_checks && !self.contract_holds(beg, end, old_mid, new_mid) {
            self.stats.rejected_annotations.increment();
            return;
        }

        let mut table = self.table.lock();
        annotate_contiguous_container(&mut *table, beg, end, old_mid, new_mid);

        if old_mid != new_mid {
            self.stats.annotations.increment();
            self.stats
                .granules_written
                .add(annotation_cost(old_mid, new_mid) as u64);

            #[cfg(feature = "log")]
            log::trace!(
                "annotate [{:#x}, {:#x}) mid {:#x} -> {:#x}",
                beg,
                end,
                old_mid,
                new_mid
            );

            #[cfg(feature = "debug")]
            self.tracker.record_annotation(beg, end, new_mid);
        }

        if self.config.check_after_annotate {
            let consistent = verify_contiguous_container_with(
                &*table,
                beg,
                new_mid,
                end,
                self.config.verify_mode,
            );
            drop(table);
            self.record_verification(consistent, beg, new_mid, end);
        }
    }

    /// Returns true if `[beg, mid)` is addressable and `[mid, end)` poisoned,
    /// using the configured [`VerifyMode`].
    pub fn verify(&self, beg: usize, mid: usize, end: usize) -> bool {
        self.verify_with(beg, mid, end, self.config.verify_mode)
    }

    /// Like [`verify`](Self::verify) with an explicit mode.
    ///
    /// Inconsistency is counted but not reported; use [`check`](Self::check)
    /// for that.
    pub fn verify_with(&self, beg: usize, mid: usize, end: usize, mode: VerifyMode) -> bool {
        let consistent = {
            let table = self.table.lock();
            verify_contiguous_container_with(&*table, beg, mid, end, mode)
        };

        #[cfg(feature = "log")]
        log::trace!(
            "verify [{:#x}, {:#x}) mid {:#x} ({}): {}",
            beg,
            end,
            mid,
            mode,
            consistent
        );

        self.stats.verifications.increment();
        if !consistent {
            self.stats.verify_failures.increment();
        }
        consistent
    }

    /// Verify and report CS101 if the region is inconsistent.
    pub fn check(&self, beg: usize, mid: usize, end: usize) -> bool {
        let consistent = {
            let table = self.table.lock();
            verify_contiguous_container_with(&*table, beg, mid, end, self.config.verify_mode)
        };
        self.record_verification(consistent, beg, mid, end);
        consistent
    }
}

impl<S: ShadowOwner> ContainerShadow<S> {
    /// Allocate a shadowed vector with room for `capacity` elements.
    ///
    /// Returns `None` if the buffer size overflows or the allocator fails.
    pub fn vec_with_capacity<T>(&self, capacity: usize) -> Option<ShadowedVec<T, S>> {
        ShadowedVec::with_capacity_in(capacity, self.clone())
    }

    /// Owner side: mark a fresh allocation addressable.
    pub(crate) fn adopt_allocation(&self, beg: usize, size: usize) {
        self.table.with(|table| table.unpoison_allocation(beg, size));
    }

    /// Owner side: forget a released allocation.
    pub(crate) fn release_allocation(&self, beg: usize, size: usize) {
        self.table.with(|table| table.discard(beg, size));

        #[cfg(feature = "debug")]
        self.tracker.forget(beg);
    }
}
