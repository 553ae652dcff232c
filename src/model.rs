//! Domain types shared across the pipeline.
//!
//! Everything here is plain data: produced once by the extraction stage (or
//! the chunk assembler) and never mutated afterwards. Serde derives use
//! camelCase field names so the JSON artifact keys match the analysis-service
//! vocabulary (`pageNumber`, `chunkIndex`, …).

use crate::config::ChunkStrategy;
use serde::de::{Deserializer, Error as _};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural role of a section, as reported by the analysis service.
///
/// The service hands us free-form role strings; mapping them into a closed
/// enum at the extraction boundary keeps untyped strings out of the rendering
/// and assembly logic. Unknown roles are preserved verbatim in the
/// [`SectionRole::Other`] arm so a service-side vocabulary extension never
/// loses data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SectionRole {
    Title,
    SectionHeading,
    Paragraph,
    Footnote,
    PageHeader,
    PageFooter,
    PageNumber,
    /// Synthetic role for table sections materialized by the extractor.
    Table,
    /// Any role string this crate does not know about.
    Other(String),
}

impl SectionRole {
    /// Map a raw service role string into the closed role set.
    pub fn from_service(raw: &str) -> Self {
        match raw {
            "title" => SectionRole::Title,
            "sectionHeading" => SectionRole::SectionHeading,
            "paragraph" => SectionRole::Paragraph,
            "footnote" => SectionRole::Footnote,
            "pageHeader" => SectionRole::PageHeader,
            "pageFooter" => SectionRole::PageFooter,
            "pageNumber" => SectionRole::PageNumber,
            "table" => SectionRole::Table,
            other => SectionRole::Other(other.to_string()),
        }
    }

    /// The wire/service spelling of this role.
    pub fn as_str(&self) -> &str {
        match self {
            SectionRole::Title => "title",
            SectionRole::SectionHeading => "sectionHeading",
            SectionRole::Paragraph => "paragraph",
            SectionRole::Footnote => "footnote",
            SectionRole::PageHeader => "pageHeader",
            SectionRole::PageFooter => "pageFooter",
            SectionRole::PageNumber => "pageNumber",
            SectionRole::Table => "table",
            SectionRole::Other(s) => s.as_str(),
        }
    }

    /// Roles excluded from extraction entirely: page furniture that carries
    /// no document content.
    pub fn is_boilerplate(&self) -> bool {
        matches!(
            self,
            SectionRole::PageHeader | SectionRole::PageFooter | SectionRole::PageNumber
        )
    }
}

impl fmt::Display for SectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SectionRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SectionRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Err(D::Error::custom("section role must not be empty"));
        }
        Ok(SectionRole::from_service(&raw))
    }
}

/// One structural text unit (paragraph or table) with page and role metadata.
///
/// Immutable once created by the extraction stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub role: SectionRole,
    pub content: String,
    /// Document-global page number, 1-indexed. Always ≥ 1.
    pub page_number: u32,
    /// Per-element confidence in `[0, 1]`. The current analysis service does
    /// not expose per-element confidence, so the extractor fills in `1.0` as
    /// a documented approximation; `None` means a future source omitted it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Section {
    pub fn new(
        role: SectionRole,
        content: impl Into<String>,
        page_number: u32,
        confidence: Option<f64>,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            page_number,
            confidence,
        }
    }
}

/// A bounded aggregation of one or more sections' content — the unit handed
/// to downstream retrieval/embedding consumers.
///
/// Created only by the chunk assembler; never mutated after creation.
/// `chunk_index` values form a contiguous 0-based sequence in emission order,
/// and `content` is never empty after trimming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChunk {
    pub id: String,
    pub content: String,
    pub chunk_index: usize,
    /// Representative start page of the chunk.
    pub page_number: u32,
    pub metadata: ChunkMetadata,
}

/// Chunk provenance recorded alongside the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    pub file_name: String,
    pub start_page: u32,
    pub end_page: u32,
    pub section_count: usize,
    pub chunking_strategy: ChunkStrategy,
}

/// The reconciled result of analyzing one whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub file_name: String,
    pub page_count: u32,
    pub sections: Vec<Section>,
    pub quality: QualityMetrics,
}

/// Aggregate quality metrics over a section sequence.
///
/// Derived data, recomputable at any time via [`crate::pipeline::quality::score`];
/// never independently mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub avg_confidence: f64,
    pub total_paragraphs: usize,
    pub total_chars: usize,
    pub has_structure_markers: bool,
}

/// Classification verdict for a section, assigned by the LLM classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    /// Main document content (articles, paragraphs, definitions).
    Keep,
    /// Junk to drop (OCR artefacts, stray characters, markers).
    Remove,
    /// Auxiliary text (comments, explanations, side notes).
    Auxiliary,
}

impl Classification {
    /// Parse a classifier reply token, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "KEEP" => Some(Classification::Keep),
            "REMOVE" => Some(Classification::Remove),
            "AUXILIARY" => Some(Classification::Auxiliary),
            _ => None,
        }
    }
}

/// A section paired with its classification verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSection {
    pub role: SectionRole,
    pub content: String,
    pub page_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub classification: Classification,
}

impl EnrichedSection {
    pub fn from_section(section: Section, classification: Classification) -> Self {
        Self {
            role: section.role,
            content: section.content,
            page_number: section.page_number,
            confidence: section.confidence,
            classification,
        }
    }
}
