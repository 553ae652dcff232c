//! Section extraction: map one analysis response into ordered `Section`s.
//!
//! Two element families come back from the service: paragraph-level elements
//! (with free-form roles) and tables (as row/column-indexed cell lists).
//! Paragraphs become sections directly; tables are materialized into a grid,
//! serialized to markdown grid syntax, and emitted as synthetic sections with
//! the [`SectionRole::Table`] role. Boilerplate roles — page headers, footers,
//! and bare page numbers — are dropped at this boundary so nothing downstream
//! has to re-filter them.
//!
//! Every page number is shifted by the caller-supplied offset, which is how
//! sections from independently analyzed sub-documents end up with
//! document-global page numbers.

use crate::analysis::{AnalyzeResponse, BoundingRegion, Paragraph, Table};
use crate::model::{Section, SectionRole};
use tracing::debug;

/// Raw service role strings that never carry document content.
const EXCLUDED_ROLES: [&str; 3] = ["pageHeader", "pageFooter", "pageNumber"];

/// Extract all sections (paragraphs then tables) from one analysis response,
/// shifting every page number by `page_offset`.
pub fn extract_sections(response: &AnalyzeResponse, page_offset: u32) -> Vec<Section> {
    let mut sections = extract_paragraphs(response, page_offset);
    sections.extend(extract_tables(response, page_offset));
    debug!(
        "Extracted {} sections at page offset {}",
        sections.len(),
        page_offset
    );
    sections
}

/// Map paragraph elements into sections, dropping boilerplate roles.
pub fn extract_paragraphs(response: &AnalyzeResponse, page_offset: u32) -> Vec<Section> {
    response
        .paragraphs
        .iter()
        .filter(|p| !is_excluded_role(p.role.as_deref()))
        .map(|p| map_paragraph(p, page_offset))
        .collect()
}

/// Materialize each table into one synthetic section carrying grid markdown.
///
/// A table with zero rows, zero columns, or no cells yields no section.
pub fn extract_tables(response: &AnalyzeResponse, page_offset: u32) -> Vec<Section> {
    response
        .tables
        .iter()
        .filter_map(|table| {
            let markdown = table_markdown(table)?;
            let page = first_region_page(&table.bounding_regions) + page_offset;
            Some(Section::new(SectionRole::Table, markdown, page, Some(1.0)))
        })
        .collect()
}

fn is_excluded_role(role: Option<&str>) -> bool {
    role.is_some_and(|r| EXCLUDED_ROLES.contains(&r))
}

fn map_paragraph(paragraph: &Paragraph, page_offset: u32) -> Section {
    // Role defaults to plain paragraph when the service omits it.
    let role = paragraph
        .role
        .as_deref()
        .map(SectionRole::from_service)
        .unwrap_or(SectionRole::Paragraph);
    let content = paragraph.content.clone().unwrap_or_default();
    let page_number = first_region_page(&paragraph.bounding_regions) + page_offset;

    // The service does not expose per-element confidence; 1.0 is a documented
    // approximation, not a computed value.
    Section::new(role, content, page_number, Some(1.0))
}

/// Page of the first bounding region, defaulting to 1 when absent.
fn first_region_page(regions: &[BoundingRegion]) -> u32 {
    regions.first().map(|r| r.page_number.max(1)).unwrap_or(1)
}

/// Serialize a table into markdown grid syntax.
///
/// Row 0 becomes the header row, followed by a `|---|…` separator and the
/// remaining rows as body rows. Cells outside the reported row/column counts
/// are dropped; unreported cells render as empty strings. Returns `None` for
/// a degenerate table (zero rows, zero columns, or no cells).
pub fn table_markdown(table: &Table) -> Option<String> {
    let rows = table.row_count as usize;
    let cols = table.column_count as usize;
    if rows == 0 || cols == 0 || table.cells.is_empty() {
        return None;
    }

    let mut grid = vec![vec![String::new(); cols]; rows];
    for cell in &table.cells {
        let (r, c) = (cell.row_index as usize, cell.column_index as usize);
        if r < rows && c < cols {
            grid[r][c] = cell.content.clone().unwrap_or_default();
        }
    }

    let mut md = String::new();
    push_row(&mut md, &grid[0]);
    md.push('|');
    for _ in 0..cols {
        md.push_str("---|");
    }
    md.push('\n');
    for row in &grid[1..] {
        push_row(&mut md, row);
    }
    Some(md)
}

fn push_row(md: &mut String, row: &[String]) {
    md.push('|');
    for cell in row {
        md.push(' ');
        md.push_str(cell);
        md.push_str(" |");
    }
    md.push('\n');
}
