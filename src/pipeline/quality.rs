//! Aggregate quality metrics over a section sequence.
//!
//! Pure derivation: the metrics can be recomputed from the sections at any
//! time and carry no state of their own. The structure-marker probe looks
//! for legal-citation tokens (`§ 1`, `Art. 2`, `pkt 3`) as a cheap signal
//! that the extraction preserved document structure rather than flattening
//! it into prose.

use crate::model::{QualityMetrics, Section};
use once_cell::sync::Lazy;
use regex::Regex;

static STRUCTURE_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"§\s*\d+|Art\.\s*\d+|pkt\s+\d+").expect("structure marker regex"));

/// Compute metrics for a section sequence. An empty sequence scores all
/// zeroes with no structure markers.
pub fn score(sections: &[Section]) -> QualityMetrics {
    if sections.is_empty() {
        return QualityMetrics {
            avg_confidence: 0.0,
            total_paragraphs: 0,
            total_chars: 0,
            has_structure_markers: false,
        };
    }

    // Absent confidence counts as 0 in the mean rather than being skipped.
    let confidence_sum: f64 = sections.iter().map(|s| s.confidence.unwrap_or(0.0)).sum();
    let total_chars = sections.iter().map(|s| s.content.len()).sum();
    let has_structure_markers = sections
        .iter()
        .any(|s| STRUCTURE_MARKERS.is_match(&s.content));

    QualityMetrics {
        avg_confidence: confidence_sum / sections.len() as f64,
        total_paragraphs: sections.len(),
        total_chars,
        has_structure_markers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SectionRole;

    fn section(content: &str, confidence: Option<f64>) -> Section {
        Section::new(SectionRole::Paragraph, content, 1, confidence)
    }

    #[test]
    fn empty_sequence_scores_zero() {
        let m = score(&[]);
        assert_eq!(m.avg_confidence, 0.0);
        assert_eq!(m.total_paragraphs, 0);
        assert_eq!(m.total_chars, 0);
        assert!(!m.has_structure_markers);
    }

    #[test]
    fn absent_confidence_counts_as_zero() {
        let m = score(&[section("ab", Some(1.0)), section("cd", None)]);
        assert_eq!(m.avg_confidence, 0.5);
        assert_eq!(m.total_paragraphs, 2);
        assert_eq!(m.total_chars, 4);
    }

    #[test]
    fn structure_markers_detected() {
        assert!(score(&[section("zgodnie z § 12 ustawy", Some(1.0))]).has_structure_markers);
        assert!(score(&[section("see Art. 5 below", Some(1.0))]).has_structure_markers);
        assert!(score(&[section("pkt 3 lit. a", Some(1.0))]).has_structure_markers);
        assert!(!score(&[section("plain prose only", Some(1.0))]).has_structure_markers);
    }

    #[test]
    fn article_without_number_is_not_a_marker() {
        assert!(!score(&[section("Art. next week", Some(1.0))]).has_structure_markers);
    }
}
