//! The external analysis-service contract.
//!
//! The core pipeline never performs network I/O itself: "analyze these
//! bytes" is an injected capability behind [`DocumentAnalyzer`], returning
//! the fixed [`AnalyzeResponse`] shape below. Production code injects the
//! Azure Document Intelligence client from [`crate::remote`]; tests inject a
//! scripted mock. The seam also lets callers wrap the analyzer with their own
//! middleware (caching, rate limiting) without the library knowing.

use crate::error::AnalyzeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One analysis request: a sub-document's bytes plus service parameters.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    /// Raw PDF bytes of one independently valid (sub-)document.
    pub document: Vec<u8>,
    /// Service model identifier, e.g. `"prebuilt-layout"`.
    pub model_id: String,
    /// OCR locale hint, e.g. `"pl-PL"`.
    pub locale: Option<String>,
    /// Optional capability flags the service should enable.
    pub features: Vec<AnalysisFeature>,
    /// Requested shape of `raw_content` in the response.
    pub output_format: OutputFormat,
}

/// Capability flags understood by the analysis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisFeature {
    /// Font/style information (bold, italic, sizes).
    StyleFont,
    /// Key-value pair extraction.
    KeyValuePairs,
}

impl AnalysisFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisFeature::StyleFont => "styleFont",
            AnalysisFeature::KeyValuePairs => "keyValuePairs",
        }
    }
}

/// Format of the service-assembled `raw_content` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    #[default]
    Markdown,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Markdown => "markdown",
        }
    }
}

/// The service's page-position annotation for a structural element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingRegion {
    /// 1-indexed page number local to the analyzed (sub-)document.
    pub page_number: u32,
}

/// One paragraph-level element reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Paragraph {
    /// Free-form role string; absent means plain paragraph.
    pub role: Option<String>,
    pub content: Option<String>,
    pub bounding_regions: Vec<BoundingRegion>,
}

/// One table cell, addressed by row/column index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableCell {
    pub row_index: u32,
    pub column_index: u32,
    pub content: Option<String>,
}

/// One table reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Table {
    pub row_count: u32,
    pub column_count: u32,
    pub cells: Vec<TableCell>,
    pub bounding_regions: Vec<BoundingRegion>,
}

/// The fixed response shape of one analysis call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeResponse {
    /// Actual number of pages the service saw in the analyzed bytes.
    ///
    /// The page-offset reconciler advances by this value, not by the
    /// requested split size, so a service that reports a different count
    /// than expected cannot corrupt global page numbering.
    pub page_count: u32,
    pub paragraphs: Vec<Paragraph>,
    pub tables: Vec<Table>,
    /// Service-assembled full-text content, when requested.
    pub raw_content: Option<String>,
}

/// The injected "analyze these bytes" capability.
///
/// Implementations must be `Send + Sync`; the pipeline calls them
/// sequentially, one sub-document at a time, because page-offset
/// reconciliation depends on page order.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse, AnalyzeError>;
}
