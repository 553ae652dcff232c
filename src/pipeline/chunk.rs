//! Chunk assembly: partition a flat section sequence into bounded chunks.
//!
//! Two mutually exclusive strategies, selected by
//! [`ChunkingConfig::strategy`]:
//!
//! * **Page-based** — sections are grouped by page and emitted per
//!   consecutive page window of `pages_per_chunk` width. Windows with no
//!   non-empty content are skipped entirely: no chunk, no index consumed.
//!   The emitted `[start_page, end_page]` ranges plus the skipped windows
//!   tile `[1, page_count]` exactly.
//!
//! * **Size-based with overlap** — a single accumulation buffer is filled in
//!   section order and flushed whenever the next section would push the
//!   joined length past `max_chunk_size`. After a flush, whole most-recent
//!   sections are greedily re-included within the `overlap` character budget
//!   to seed the next buffer, preserving context across chunk boundaries.
//!
//! The buffer is an explicit list of owned, trimmed section contents plus a
//! running joined length; the chunk string is materialized only at flush
//! time, so overlap seeds never alias a previous buffer.
//!
//! Configuration is clamped (`pages_per_chunk ≥ 1`, `max_chunk_size ≥ 1`,
//! `0 ≤ overlap < max_chunk_size`) rather than rejected, so no configuration
//! can stall the assembler.

use crate::config::{ChunkStrategy, ChunkingConfig};
use crate::model::{AnalysisResult, ChunkMetadata, DocumentChunk, Section};
use std::collections::BTreeMap;
use tracing::info;

/// Joined length contributed by two pieces separated by a blank line.
const SEPARATOR_LEN: usize = 2;

/// Partition `result.sections` into chunks under the configured strategy.
pub fn assemble(result: &AnalysisResult, config: &ChunkingConfig) -> Vec<DocumentChunk> {
    let config = config.clamped();
    info!(
        "Chunking '{}' with strategy {}",
        result.file_name, config.strategy
    );
    match config.strategy {
        ChunkStrategy::PageBased => assemble_by_pages(result, &config),
        ChunkStrategy::SizeBased => assemble_by_size(result, &config),
    }
}

/// Page-based assembly: one chunk per non-empty window of
/// `pages_per_chunk` consecutive pages.
pub fn assemble_by_pages(result: &AnalysisResult, config: &ChunkingConfig) -> Vec<DocumentChunk> {
    let width = config.pages_per_chunk;

    // BTreeMap keeps window iteration in page order while preserving the
    // original section order within each page.
    let mut by_page: BTreeMap<u32, Vec<&Section>> = BTreeMap::new();
    for section in &result.sections {
        by_page.entry(section.page_number).or_default().push(section);
    }

    let mut chunks = Vec::new();
    let mut chunk_index = 0usize;
    let mut current_page = 1u32;

    while current_page <= result.page_count {
        let start_page = current_page;
        let end_page = (current_page + width - 1).min(result.page_count);

        let mut parts: Vec<&str> = Vec::new();
        let mut section_count = 0usize;
        for page in start_page..=end_page {
            if let Some(sections) = by_page.get(&page) {
                for section in sections {
                    let text = section.content.trim();
                    if !text.is_empty() {
                        parts.push(text);
                        section_count += 1;
                    }
                }
            }
        }

        // An empty window consumes no chunk index.
        if !parts.is_empty() {
            chunks.push(build_chunk(
                &result.file_name,
                chunk_index,
                parts.join("\n\n"),
                start_page,
                end_page,
                section_count,
                ChunkStrategy::PageBased,
            ));
            chunk_index += 1;
        }

        current_page += width;
    }

    info!("Assembled {} page-based chunks", chunks.len());
    chunks
}

/// One buffered section: trimmed owned content plus its page.
#[derive(Debug, Clone)]
struct Piece {
    content: String,
    page: u32,
}

/// Size-based assembly with whole-section overlap between chunks.
///
/// Known discrepancy, preserved from the source behavior: when an overlap
/// seed is carried into a new buffer, the new chunk's start page is the
/// *previous* chunk's last page — not the page the overlapping content
/// actually began on. Content spanning a page boundary can therefore be
/// attributed to the later page.
pub fn assemble_by_size(result: &AnalysisResult, config: &ChunkingConfig) -> Vec<DocumentChunk> {
    let max_size = config.max_chunk_size;
    let overlap = config.overlap;

    let mut chunks = Vec::new();
    let mut chunk_index = 0usize;

    let mut buffer: Vec<Piece> = Vec::new();
    let mut buffer_len = 0usize; // joined length: sum of pieces + separators
    let mut start_page = 1u32;
    let mut end_page = 1u32;
    let mut section_count = 0usize;

    for section in &result.sections {
        let content = section.content.trim();
        if content.is_empty() {
            continue;
        }

        let incoming = content.len() + SEPARATOR_LEN;
        if !buffer.is_empty() && buffer_len + incoming > max_size {
            let flushed_end = end_page;
            chunks.push(build_chunk(
                &result.file_name,
                chunk_index,
                materialize(&buffer),
                start_page,
                end_page,
                section_count,
                ChunkStrategy::SizeBased,
            ));
            chunk_index += 1;

            let seed = overlap_seed(&buffer, overlap);
            if seed.is_empty() {
                buffer.clear();
                buffer_len = 0;
                section_count = 0;
            } else {
                section_count = seed.len();
                buffer_len = joined_len(&seed);
                buffer = seed;
                // Known discrepancy: the seeded buffer is attributed to the
                // flushed chunk's last page.
                start_page = flushed_end;
                end_page = flushed_end;
            }
        }

        if buffer.is_empty() {
            start_page = section.page_number;
            buffer_len = content.len();
        } else {
            buffer_len += SEPARATOR_LEN + content.len();
        }
        buffer.push(Piece {
            content: content.to_string(),
            page: section.page_number,
        });
        end_page = section.page_number;
        section_count += 1;
    }

    // The final buffer is flushed unconditionally, whatever its size.
    if !buffer.is_empty() {
        chunks.push(build_chunk(
            &result.file_name,
            chunk_index,
            materialize(&buffer),
            start_page,
            end_page,
            section_count,
            ChunkStrategy::SizeBased,
        ));
    }

    info!("Assembled {} size-based chunks", chunks.len());
    chunks
}

/// Greedily re-include as many whole, most-recent pieces as fit within the
/// overlap character budget without exceeding it.
fn overlap_seed(buffer: &[Piece], overlap: usize) -> Vec<Piece> {
    if overlap == 0 {
        return Vec::new();
    }
    let mut seed: Vec<Piece> = Vec::new();
    let mut seed_chars = 0usize;
    for piece in buffer.iter().rev() {
        if seed_chars + piece.content.len() > overlap {
            break;
        }
        seed_chars += piece.content.len();
        seed.push(piece.clone());
    }
    seed.reverse();
    seed
}

fn joined_len(pieces: &[Piece]) -> usize {
    let content: usize = pieces.iter().map(|p| p.content.len()).sum();
    content + SEPARATOR_LEN * pieces.len().saturating_sub(1)
}

fn materialize(pieces: &[Piece]) -> String {
    pieces
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn build_chunk(
    file_name: &str,
    chunk_index: usize,
    content: String,
    start_page: u32,
    end_page: u32,
    section_count: usize,
    strategy: ChunkStrategy,
) -> DocumentChunk {
    DocumentChunk {
        id: format!("{file_name}-chunk-{chunk_index}"),
        content,
        chunk_index,
        page_number: start_page,
        metadata: ChunkMetadata {
            file_name: file_name.to_string(),
            start_page,
            end_page,
            section_count,
            chunking_strategy: strategy,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QualityMetrics, SectionRole};

    fn section(content: &str, page: u32) -> Section {
        Section::new(SectionRole::Paragraph, content, page, Some(1.0))
    }

    fn result(sections: Vec<Section>, page_count: u32) -> AnalysisResult {
        AnalysisResult {
            file_name: "doc.pdf".to_string(),
            page_count,
            sections,
            quality: QualityMetrics {
                avg_confidence: 1.0,
                total_paragraphs: 0,
                total_chars: 0,
                has_structure_markers: false,
            },
        }
    }

    fn page_cfg(pages_per_chunk: u32) -> ChunkingConfig {
        ChunkingConfig {
            strategy: ChunkStrategy::PageBased,
            pages_per_chunk,
            ..Default::default()
        }
    }

    fn size_cfg(max_chunk_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            strategy: ChunkStrategy::SizeBased,
            max_chunk_size,
            overlap,
            ..Default::default()
        }
    }

    // ── Page-based ───────────────────────────────────────────────────────

    #[test]
    fn page_based_one_page_windows() {
        let r = result(
            vec![section("A", 1), section("B", 1), section("C", 2)],
            2,
        );
        let chunks = assemble_by_pages(&r, &page_cfg(1));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "A\n\nB");
        assert_eq!(chunks[0].page_number, 1);
        assert_eq!(chunks[0].metadata.start_page, 1);
        assert_eq!(chunks[0].metadata.section_count, 2);
        assert_eq!(chunks[1].content, "C");
        assert_eq!(chunks[1].page_number, 2);
    }

    #[test]
    fn page_based_empty_window_consumes_no_index() {
        // Page 2 has no content; page 3 does.
        let r = result(vec![section("A", 1), section("C", 3)], 3);
        let chunks = assemble_by_pages(&r, &page_cfg(1));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[1].chunk_index, 1, "skipped window must not consume an index");
        assert_eq!(chunks[1].metadata.start_page, 3);
    }

    #[test]
    fn page_based_windows_tile_page_range() {
        let r = result(
            (1..=7).map(|p| section(&format!("p{p}"), p)).collect(),
            7,
        );
        let chunks = assemble_by_pages(&r, &page_cfg(3));
        let ranges: Vec<(u32, u32)> = chunks
            .iter()
            .map(|c| (c.metadata.start_page, c.metadata.end_page))
            .collect();
        assert_eq!(ranges, vec![(1, 3), (4, 6), (7, 7)]);
    }

    #[test]
    fn page_based_skips_whitespace_only_sections() {
        let r = result(vec![section("   ", 1), section("real", 1)], 1);
        let chunks = assemble_by_pages(&r, &page_cfg(1));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "real");
        assert_eq!(chunks[0].metadata.section_count, 1);
    }

    // ── Size-based ───────────────────────────────────────────────────────

    #[test]
    fn size_based_flush_trace() {
        // Lengths 5, 4, 1 with max 10: 5+2+4=11 > 10 flushes after the first
        // section; 4+2+1=7 ≤ 10 keeps the last two together.
        let r = result(
            vec![section("aaaaa", 1), section("bbbb", 1), section("c", 1)],
            1,
        );
        let chunks = assemble_by_size(&r, &size_cfg(10, 0));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "aaaaa");
        assert_eq!(chunks[1].content, "bbbb\n\nc");
    }

    #[test]
    fn size_based_indices_are_contiguous() {
        let r = result(
            (0..6).map(|i| section("xxxxxxxx", i / 2 + 1)).collect(),
            3,
        );
        let chunks = assemble_by_size(&r, &size_cfg(20, 0));
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i);
            assert_eq!(c.id, format!("doc.pdf-chunk-{i}"));
        }
    }

    #[test]
    fn size_based_oversized_section_is_never_split() {
        let huge = "z".repeat(50);
        let r = result(vec![section("aa", 1), section(&huge, 1)], 1);
        let chunks = assemble_by_size(&r, &size_cfg(10, 0));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].content, huge, "oversized content stays whole");
        assert!(chunks[1].content.len() > 10);
    }

    #[test]
    fn size_based_overlap_reincludes_whole_recent_sections() {
        // Sections of 4 chars each; max 10 flushes after two; overlap 5
        // re-includes exactly the most recent section (4 ≤ 5 < 8).
        let r = result(
            vec![
                section("aaaa", 1),
                section("bbbb", 1),
                section("cccc", 1),
            ],
            1,
        );
        let chunks = assemble_by_size(&r, &size_cfg(10, 5));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "aaaa\n\nbbbb");
        assert_eq!(chunks[1].content, "bbbb\n\ncccc");
        assert_eq!(chunks[1].metadata.section_count, 2);
    }

    #[test]
    fn size_based_overlap_seed_page_is_previous_chunk_end() {
        // Documented discrepancy: the seeded chunk reports the previous
        // chunk's last page, even though the overlapping section started on
        // an earlier page.
        let r = result(
            vec![
                section("aaaa", 1),
                section("bbbb", 2),
                section("cccc", 3),
            ],
            3,
        );
        let chunks = assemble_by_size(&r, &size_cfg(10, 5));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.end_page, 2);
        assert_eq!(chunks[1].page_number, 2, "seeded chunk inherits the flushed end page");
        assert_eq!(chunks[1].metadata.start_page, 2);
        assert_eq!(chunks[1].metadata.end_page, 3);
    }

    #[test]
    fn size_based_no_fitting_seed_resumes_from_current_section() {
        // Overlap 3 cannot hold any whole 4-char section, so the next buffer
        // starts empty and takes the incoming section's page.
        let r = result(vec![section("aaaa", 1), section("bbbb", 5)], 5);
        let chunks = assemble_by_size(&r, &size_cfg(5, 3));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].page_number, 5);
        assert_eq!(chunks[1].metadata.section_count, 1);
    }

    #[test]
    fn size_based_final_buffer_always_flushes() {
        let r = result(vec![section("tail", 9)], 9);
        let chunks = assemble_by_size(&r, &size_cfg(100, 10));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "tail");
        assert_eq!(chunks[0].metadata.end_page, 9);
    }

    #[test]
    fn size_based_content_preserved_modulo_overlap() {
        let sections: Vec<Section> = (0..10)
            .map(|i| section(&format!("section-number-{i:02}"), i + 1))
            .collect();
        let expected: Vec<String> = sections.iter().map(|s| s.content.clone()).collect();
        let r = result(sections, 10);
        let chunks = assemble_by_size(&r, &size_cfg(40, 0));

        let rebuilt: Vec<String> = chunks
            .iter()
            .flat_map(|c| c.content.split("\n\n").map(str::to_string))
            .collect();
        assert_eq!(rebuilt, expected, "zero-overlap chunks must concatenate losslessly");
    }

    #[test]
    fn assembly_is_idempotent() {
        let r = result(
            (0..8).map(|i| section(&format!("s{i}{i}{i}"), i + 1)).collect(),
            8,
        );
        let cfg = size_cfg(15, 6);
        let first = assemble(&r, &cfg);
        let second = assemble(&r, &cfg);
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_config_is_clamped_not_rejected() {
        let r = result(vec![section("abc", 1)], 1);
        let cfg = ChunkingConfig {
            strategy: ChunkStrategy::SizeBased,
            pages_per_chunk: 0,
            max_chunk_size: 0,
            overlap: 9,
        };
        // max_chunk_size clamps to 1, overlap to 0; one chunk per section.
        let chunks = assemble(&r, &cfg);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "abc");
    }
}
