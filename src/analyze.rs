//! End-to-end document analysis: split, analyze, reconcile, chunk, render.
//!
//! [`analyze_bytes`] is the core entry point; [`analyze_file`] adds path
//! validation (existence, readability, PDF magic bytes) in front of it.
//! Sub-documents are processed strictly sequentially because page-offset
//! reconciliation depends on seeing them in source page order.

use crate::analysis::{AnalyzeRequest, DocumentAnalyzer};
use crate::config::AnalysisConfig;
use crate::error::AnalyzeError;
use crate::model::{AnalysisResult, DocumentChunk, Section};
use crate::pipeline::reconcile::PageOffsetReconciler;
use crate::pipeline::{chunk, extract, quality, render, split};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Everything one analysis run produces.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    /// Reconciled sections plus quality metrics.
    pub result: AnalysisResult,
    /// Bounded chunks assembled under the configured strategy.
    pub chunks: Vec<DocumentChunk>,
    /// Page-aware markdown reconstruction of the whole document.
    pub markdown: String,
}

/// Analyze in-memory PDF bytes.
///
/// The source is split into sub-documents of `chunking.pages_per_chunk`
/// pages, each analyzed through the injected `analyzer`, and the results
/// merged under a running page offset. A failed analysis aborts the whole
/// run: partially merged sections would silently misrepresent the source.
///
/// # Errors
/// [`AnalyzeError::InvalidPdf`] for unparseable bytes,
/// [`AnalyzeError::ServiceFailed`] (or `ServiceTimeout`) when the analyzer
/// fails on any sub-document.
pub async fn analyze_bytes(
    file_name: &str,
    bytes: &[u8],
    analyzer: &dyn DocumentAnalyzer,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalyzeError> {
    let started = Instant::now();
    let chunking = config.chunking.clamped();
    info!(
        "Analyzing '{}' ({} bytes, strategy {})",
        file_name,
        bytes.len(),
        chunking.strategy
    );

    let buffers = split::split_by_pages(bytes, chunking.pages_per_chunk)?;
    let total = buffers.len();
    if let Some(p) = &config.progress {
        p.on_split(total);
    }

    let mut reconciler = PageOffsetReconciler::new();
    let mut sections: Vec<Section> = Vec::new();

    for (i, buffer) in buffers.into_iter().enumerate() {
        let index = i + 1;
        if let Some(p) = &config.progress {
            p.on_subdocument_start(index, total);
        }
        debug!("Analyzing sub-document {}/{}", index, total);

        let request = AnalyzeRequest {
            document: buffer,
            model_id: config.model_id.clone(),
            locale: config.locale.clone(),
            features: config.features.clone(),
            output_format: config.output_format,
        };
        // Stamp the sub-document index onto service errors so the caller
        // knows where the run died.
        let response = analyzer.analyze(request).await.map_err(|e| match e {
            AnalyzeError::ServiceFailed { detail, .. } => AnalyzeError::ServiceFailed {
                subdocument: index,
                detail,
            },
            AnalyzeError::ServiceTimeout { elapsed_ms, .. } => AnalyzeError::ServiceTimeout {
                subdocument: index,
                elapsed_ms,
            },
            other => other,
        })?;

        let extracted = extract::extract_sections(&response, reconciler.offset());
        reconciler.advance(response.page_count);

        if let Some(p) = &config.progress {
            p.on_subdocument_complete(index, total, extracted.len());
        }
        sections.extend(extracted);
    }

    let page_count = reconciler.total_pages();
    let metrics = quality::score(&sections);
    if let Some(p) = &config.progress {
        p.on_analysis_complete(page_count as usize, sections.len());
    }

    let result = AnalysisResult {
        file_name: file_name.to_string(),
        page_count,
        sections,
        quality: metrics,
    };
    let chunks = chunk::assemble(&result, &chunking);
    let markdown = render::render_document(&result.sections);

    info!(
        "Analyzed '{}': {} pages, {} sections, {} chunks in {:.1}s",
        file_name,
        page_count,
        result.sections.len(),
        chunks.len(),
        started.elapsed().as_secs_f64()
    );

    Ok(AnalysisOutput {
        result,
        chunks,
        markdown,
    })
}

/// Analyze a PDF file on disk.
///
/// Validates the path and the `%PDF` magic before any expensive work, so a
/// mistyped path or a renamed zip file fails in microseconds instead of
/// after a network round-trip.
pub async fn analyze_file(
    path: impl AsRef<Path>,
    analyzer: &dyn DocumentAnalyzer,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalyzeError> {
    let path = path.as_ref();
    let bytes = read_pdf(path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    analyze_bytes(&file_name, &bytes, analyzer, config).await
}

/// Read a file and verify it carries the PDF magic bytes.
pub(crate) async fn read_pdf(path: &Path) -> Result<Vec<u8>, AnalyzeError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => AnalyzeError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => AnalyzeError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => AnalyzeError::Internal(format!("reading '{}': {e}", path.display())),
    })?;

    let mut magic = [0u8; 4];
    let head = bytes.get(..4).unwrap_or(&bytes);
    magic[..head.len()].copy_from_slice(head);
    if &magic != b"%PDF" {
        return Err(AnalyzeError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(bytes)
}
