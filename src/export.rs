//! Artifact serialization and atomic file output.
//!
//! Three artifacts come out of a run: a human-readable markdown report, a
//! machine-readable JSON result (sections, chunks, metrics), and a compact
//! YAML listing of `role → content` entries for downstream ingestion.
//!
//! All writes go through [`write_text`], which writes to a `.tmp` sibling
//! and renames into place so a crash mid-write never leaves a truncated
//! artifact behind.

use crate::analyze::AnalysisOutput;
use crate::error::AnalyzeError;
use crate::model::{
    AnalysisResult, Classification, DocumentChunk, EnrichedSection, Section,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// The JSON artifact: the reconciled result plus the assembled chunks.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport<'a> {
    pub result: &'a AnalysisResult,
    pub chunks: &'a [DocumentChunk],
}

/// Render the human-readable markdown report for one run.
pub fn markdown_report(output: &AnalysisOutput) -> String {
    let result = &output.result;
    let strategy = output
        .chunks
        .first()
        .map(|c| c.metadata.chunking_strategy.as_str())
        .unwrap_or("n/a");
    let q = &result.quality;

    let mut md = String::new();
    md.push_str(&format!("# Analysis Report: {}\n\n", result.file_name));

    md.push_str("## Document Information\n\n");
    md.push_str(&format!("- **File**: {}\n", result.file_name));
    md.push_str(&format!("- **Pages**: {}\n", result.page_count));
    md.push_str(&format!("- **Sections**: {}\n", result.sections.len()));
    md.push_str(&format!(
        "- **Chunks**: {} ({})\n\n",
        output.chunks.len(),
        strategy
    ));

    md.push_str("## Quality Metrics\n\n");
    md.push_str("| Metric | Value |\n|--------|-------|\n");
    md.push_str(&format!(
        "| Average confidence | {:.2} |\n",
        q.avg_confidence
    ));
    md.push_str(&format!("| Paragraphs | {} |\n", q.total_paragraphs));
    md.push_str(&format!("| Characters | {} |\n", q.total_chars));
    md.push_str(&format!(
        "| Structure markers | {} |\n\n",
        if q.has_structure_markers { "yes" } else { "no" }
    ));

    md.push_str("## Content\n\n");
    md.push_str(&output.markdown);
    md
}

/// Serialize sections into the YAML ingestion artifact: a `chunks` list of
/// single-entry `role: content` mappings, in section order.
pub fn sections_to_yaml(sections: &[Section]) -> Result<String, AnalyzeError> {
    yaml_entries(
        sections
            .iter()
            .map(|s| (s.role.as_str().to_string(), s.content.clone())),
    )
}

/// Same artifact from classified sections, with `REMOVE` sections dropped.
pub fn enriched_to_yaml(sections: &[EnrichedSection]) -> Result<String, AnalyzeError> {
    yaml_entries(
        sections
            .iter()
            .filter(|s| s.classification != Classification::Remove)
            .map(|s| (s.role.as_str().to_string(), s.content.clone())),
    )
}

fn yaml_entries(
    entries: impl Iterator<Item = (String, String)>,
) -> Result<String, AnalyzeError> {
    #[derive(Serialize)]
    struct Artifact {
        chunks: Vec<BTreeMap<String, String>>,
    }

    let chunks = entries
        .map(|(role, content)| BTreeMap::from([(role, content)]))
        .collect();
    serde_yaml::to_string(&Artifact { chunks }).map_err(|e| AnalyzeError::SerializeFailed {
        artifact: "YAML section listing".to_string(),
        detail: e.to_string(),
    })
}

/// Write text atomically: `.tmp` sibling first, then rename into place.
pub async fn write_text(path: impl AsRef<Path>, contents: &str) -> Result<(), AnalyzeError> {
    let path = path.as_ref();
    let tmp = path.with_extension("tmp");

    let write_failed = |source: std::io::Error| AnalyzeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    tokio::fs::write(&tmp, contents).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp, path).await.map_err(write_failed)?;

    info!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically.
pub async fn write_json<T: Serialize>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), AnalyzeError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| AnalyzeError::SerializeFailed {
        artifact: "JSON analysis result".to_string(),
        detail: e.to_string(),
    })?;
    write_text(path, &json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QualityMetrics, SectionRole};

    fn output() -> AnalysisOutput {
        AnalysisOutput {
            result: AnalysisResult {
                file_name: "act.pdf".to_string(),
                page_count: 3,
                sections: vec![
                    Section::new(SectionRole::Title, "The Act", 1, Some(1.0)),
                    Section::new(SectionRole::Paragraph, "§ 1. Scope.", 1, Some(1.0)),
                ],
                quality: QualityMetrics {
                    avg_confidence: 1.0,
                    total_paragraphs: 2,
                    total_chars: 18,
                    has_structure_markers: true,
                },
            },
            chunks: vec![],
            markdown: "# The Act\n".to_string(),
        }
    }

    #[test]
    fn report_carries_document_info_and_metrics() {
        let md = markdown_report(&output());
        assert!(md.starts_with("# Analysis Report: act.pdf"));
        assert!(md.contains("- **Pages**: 3"));
        assert!(md.contains("| Average confidence | 1.00 |"));
        assert!(md.contains("| Structure markers | yes |"));
        assert!(md.contains("## Content\n\n# The Act"));
    }

    #[test]
    fn yaml_lists_single_entry_role_maps_in_order() {
        let sections = vec![
            Section::new(SectionRole::Title, "T", 1, None),
            Section::new(SectionRole::Paragraph, "P", 1, None),
        ];
        let yaml = sections_to_yaml(&sections).unwrap();
        assert!(yaml.contains("chunks:"));
        let title_at = yaml.find("- title: T").expect("title entry");
        let para_at = yaml.find("- paragraph: P").expect("paragraph entry");
        assert!(title_at < para_at, "section order preserved:\n{yaml}");
    }

    #[test]
    fn enriched_yaml_drops_removed_sections() {
        let sections = vec![
            EnrichedSection::from_section(
                Section::new(SectionRole::Paragraph, "keep", 1, None),
                Classification::Keep,
            ),
            EnrichedSection::from_section(
                Section::new(SectionRole::Paragraph, "junk", 1, None),
                Classification::Remove,
            ),
        ];
        let yaml = enriched_to_yaml(&sections).unwrap();
        assert!(yaml.contains("keep"));
        assert!(!yaml.contains("junk"));
    }

    #[tokio::test]
    async fn write_text_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.md");
        write_text(&path, "first").await.unwrap();
        write_text(&path, "second").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn write_to_missing_directory_is_output_error() {
        let err = write_text("/nonexistent-dir-xyz/out.md", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzeError::OutputWriteFailed { .. }));
    }

    #[tokio::test]
    async fn json_report_round_trips() {
        let out = output();
        let report = JsonReport {
            result: &out.result,
            chunks: &out.chunks,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &report).await.unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["result"]["fileName"], "act.pdf");
        assert_eq!(v["result"]["quality"]["hasStructureMarkers"], true);
    }
}
