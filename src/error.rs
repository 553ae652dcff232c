//! Error types for the pdf2chunks library.
//!
//! A single fatal error enum, [`AnalyzeError`], covers the whole pipeline:
//!
//! * **Input failures** — the source bytes are missing, unreadable, or not a
//!   page-addressable PDF. Surfaced immediately; no partial output exists.
//! * **Service failures** — the injected analysis capability failed for a
//!   sub-document. The whole operation aborts rather than returning a
//!   truncated document, because sections already merged from earlier
//!   sub-documents would silently misrepresent the source.
//! * **Output failures** — an artifact file could not be written.
//!
//! Classification-response parse failures are deliberately *not* represented
//! here: they are recovered locally in [`crate::classify`] by falling back to
//! the default classification, so a malformed model reply never fails a batch.
//! Chunking misconfiguration is clamped in [`crate::config::ChunkingConfig`],
//! never rejected.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2chunks library.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The bytes exist and were read, but do not start with the PDF magic.
    #[error("Not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The source bytes could not be parsed as a page-addressable document.
    #[error("PDF cannot be parsed: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    InvalidPdf { detail: String },

    /// A split sub-document could not be serialized back to bytes.
    #[error("Failed to write split sub-document for pages {start_page}-{end_page}: {detail}")]
    SplitFailed {
        start_page: u32,
        end_page: u32,
        detail: String,
    },

    // ── Service errors ────────────────────────────────────────────────────
    /// The injected analysis capability signalled failure for a sub-document.
    ///
    /// Propagated as a whole-operation failure: sections reconciled from
    /// earlier sub-documents are discarded, not partially merged.
    #[error("Document analysis failed on sub-document {subdocument}: {detail}")]
    ServiceFailed { subdocument: usize, detail: String },

    /// The analysis service is not configured (endpoint/key missing).
    #[error("Analysis service is not configured.\n{hint}")]
    ServiceNotConfigured { hint: String },

    /// The analysis call exceeded the configured timeout after all retries.
    #[error("Analysis call timed out after {elapsed_ms}ms (sub-document {subdocument})")]
    ServiceTimeout { subdocument: usize, elapsed_ms: u64 },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an artifact file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact could not be serialized.
    #[error("Failed to serialize {artifact}: {detail}")]
    SerializeFailed { artifact: String, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_failed_display_names_subdocument() {
        let e = AnalyzeError::ServiceFailed {
            subdocument: 3,
            detail: "HTTP 503".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("sub-document 3"), "got: {msg}");
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn not_a_pdf_display_shows_path() {
        let e = AnalyzeError::NotAPdf {
            path: PathBuf::from("/tmp/x.pdf"),
            magic: *b"PK\x03\x04",
        };
        assert!(e.to_string().contains("/tmp/x.pdf"));
    }

    #[test]
    fn output_write_failed_preserves_source() {
        use std::error::Error as _;
        let e = AnalyzeError::OutputWriteFailed {
            path: PathBuf::from("out.md"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("out.md"));
    }
}
