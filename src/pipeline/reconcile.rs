//! Page-offset reconciliation across split sub-documents.
//!
//! Each sub-document is analyzed in isolation, so the service reports page
//! numbers local to that sub-document (always restarting at 1). To merge the
//! results into one document-global sequence, a running offset is added to
//! every extracted page number, then advanced by the page count the service
//! *actually* reported — not by the requested split width. A service that
//! returns a different page count than requested therefore shifts subsequent
//! offsets correctly instead of corrupting global numbering.
//!
//! Correctness depends on sub-documents being processed in source page
//! order, which is why the pipeline is sequential per document.

/// Running page offset for merging sequentially analyzed sub-documents.
///
/// Offsets form a non-decreasing sequence; every merged section's final page
/// number is strictly greater than the offset in effect when its owning
/// sub-document was processed.
#[derive(Debug, Default)]
pub struct PageOffsetReconciler {
    offset: u32,
}

impl PageOffsetReconciler {
    /// Start at offset 0 (the first sub-document's pages are already global).
    pub fn new() -> Self {
        Self::default()
    }

    /// The offset to apply to the next sub-document's page numbers.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Advance past a processed sub-document by its actual reported page count.
    pub fn advance(&mut self, actual_pages: u32) {
        self.offset += actual_pages;
    }

    /// Total pages seen so far — equal to the current offset.
    pub fn total_pages(&self) -> u32 {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        assert_eq!(PageOffsetReconciler::new().offset(), 0);
    }

    #[test]
    fn advances_by_actual_page_counts() {
        let mut r = PageOffsetReconciler::new();
        r.advance(5);
        assert_eq!(r.offset(), 5);
        // Service returned fewer pages than the requested split width.
        r.advance(3);
        assert_eq!(r.offset(), 8);
        assert_eq!(r.total_pages(), 8);
    }

    #[test]
    fn offsets_are_non_decreasing() {
        let mut r = PageOffsetReconciler::new();
        let mut seen = vec![r.offset()];
        for pages in [4u32, 0, 2, 7] {
            r.advance(pages);
            seen.push(r.offset());
        }
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "offsets: {seen:?}");
    }
}
