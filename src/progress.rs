//! Progress-callback trait for per-sub-document analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgress>`] via
//! [`crate::config::AnalysisConfigBuilder::progress`] to receive events as
//! the pipeline splits the source and analyzes each sub-document in order.
//!
//! Callbacks are the least-invasive integration point: callers can forward
//! events to a terminal progress bar, a channel, or a database record without
//! the library knowing how the host application communicates. Sub-documents
//! are processed strictly sequentially, so implementations never see
//! interleaved events for the same run.

use std::sync::Arc;

/// Called by the pipeline as it works through the split sub-documents.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AnalysisProgress: Send + Sync {
    /// Called once after splitting, before any analysis call.
    ///
    /// # Arguments
    /// * `subdocuments` — number of sub-documents the source was split into
    fn on_split(&self, subdocuments: usize) {
        let _ = subdocuments;
    }

    /// Called just before the analysis request for a sub-document is sent.
    ///
    /// # Arguments
    /// * `index` — 1-indexed sub-document number
    /// * `total` — total sub-documents
    fn on_subdocument_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a sub-document's sections have been extracted and merged.
    ///
    /// # Arguments
    /// * `index`    — 1-indexed sub-document number
    /// * `total`    — total sub-documents
    /// * `sections` — sections extracted from this sub-document
    fn on_subdocument_complete(&self, index: usize, total: usize, sections: usize) {
        let _ = (index, total, sections);
    }

    /// Called once after all sub-documents have been merged.
    ///
    /// # Arguments
    /// * `pages`    — reconciled total page count
    /// * `sections` — total merged sections
    fn on_analysis_complete(&self, pages: usize, sections: usize) {
        let _ = (pages, sections);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgress;

impl AnalysisProgress for NoopProgress {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgress>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Tracking {
        starts: AtomicUsize,
        completes: AtomicUsize,
        total_sections: AtomicUsize,
    }

    impl AnalysisProgress for Tracking {
        fn on_subdocument_start(&self, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_subdocument_complete(&self, _index: usize, _total: usize, sections: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.total_sections.fetch_add(sections, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_progress_does_not_panic() {
        let p = NoopProgress;
        p.on_split(4);
        p.on_subdocument_start(1, 4);
        p.on_subdocument_complete(1, 4, 12);
        p.on_analysis_complete(20, 48);
    }

    #[test]
    fn tracking_progress_receives_events() {
        let t = Tracking {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            total_sections: AtomicUsize::new(0),
        };
        t.on_split(2);
        t.on_subdocument_start(1, 2);
        t.on_subdocument_complete(1, 2, 7);
        t.on_subdocument_start(2, 2);
        t.on_subdocument_complete(2, 2, 5);
        assert_eq!(t.starts.load(Ordering::SeqCst), 2);
        assert_eq!(t.completes.load(Ordering::SeqCst), 2);
        assert_eq!(t.total_sections.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn arc_dyn_progress_works() {
        let p: Arc<dyn AnalysisProgress> = Arc::new(NoopProgress);
        p.on_split(1);
        p.on_subdocument_start(1, 1);
    }
}
