//! Deterministic section-to-markdown reconstruction.
//!
//! Rendering is stateless with respect to the input: the same section
//! sequence always produces byte-identical markdown. The renderer walks
//! sections in order and
//!
//! * inserts a `### Page N` heading whenever the page number changes,
//! * prefixes titles with `# ` and section headings with `## `,
//! * buffers consecutive bullet items into one list block, normalizing the
//!   leading glyph (`·`, `•`, `-`, `*`) to `"- "`,
//! * groups table grids under a `### Tables` subheading,
//! * skips sections that are empty after trimming (they do not even trigger
//!   a page heading).
//!
//! [`render_enriched`] is the classification-aware variant: sections judged
//! removable are dropped and auxiliary ones are demoted to a marked
//! blockquote instead of body text.

use crate::model::{Classification, EnrichedSection, Section, SectionRole};
use once_cell::sync::Lazy;
use regex::Regex;

/// Bullet glyph followed by whitespace, capturing the item text.
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[·•\-*]\s+(.*)$").expect("list item regex"));

/// Render a full section sequence into a markdown document.
pub fn render_document(sections: &[Section]) -> String {
    let mut renderer = Renderer::new();
    for section in sections {
        let text = section.content.trim();
        if text.is_empty() {
            continue;
        }
        renderer.page(section.page_number);
        if section.role == SectionRole::Table {
            renderer.table(text);
        } else {
            renderer.text(&section.role, text);
        }
    }
    renderer.finish()
}

/// Render classified sections: `REMOVE` sections are dropped, `AUXILIARY`
/// ones become `> **[AUXILIARY]** …` blockquotes, `KEEP` renders as in
/// [`render_document`].
pub fn render_enriched(sections: &[EnrichedSection]) -> String {
    let mut renderer = Renderer::new();
    for section in sections {
        if section.classification == Classification::Remove {
            continue;
        }
        let text = section.content.trim();
        if text.is_empty() {
            continue;
        }
        renderer.page(section.page_number);
        if section.classification == Classification::Auxiliary {
            renderer.line(format!("> **[AUXILIARY]** {text}"));
        } else if section.role == SectionRole::Table {
            renderer.table(text);
        } else {
            renderer.text(&section.role, text);
        }
    }
    renderer.finish()
}

/// Accumulates output plus the pending list block and table-group state.
struct Renderer {
    out: String,
    list: Vec<String>,
    last_page: Option<u32>,
    in_tables: bool,
}

impl Renderer {
    fn new() -> Self {
        Self {
            out: String::new(),
            list: Vec::new(),
            last_page: None,
            in_tables: false,
        }
    }

    /// Emit a page heading if `page` differs from the last emitted page.
    fn page(&mut self, page: u32) {
        if self.last_page != Some(page) {
            self.flush_list();
            self.in_tables = false;
            self.out.push_str(&format!("### Page {page}\n\n"));
            self.last_page = Some(page);
        }
    }

    /// Emit non-table content: heading prefix by role, otherwise bullet
    /// buffering or a bare paragraph line.
    ///
    /// Role comparison is case-insensitive on the raw tag so unknown
    /// spellings like `"Title"` still render as headings.
    fn text(&mut self, role: &SectionRole, text: &str) {
        let tag = role.as_str();
        if tag.eq_ignore_ascii_case("title") {
            self.line(format!("# {text}"));
        } else if tag.eq_ignore_ascii_case("sectionHeading") {
            self.line(format!("## {text}"));
        } else if let Some(caps) = LIST_ITEM.captures(text) {
            self.list.push(format!("- {}", &caps[1]));
        } else {
            self.line(text.to_string());
        }
    }

    /// Emit one formatted line followed by a blank line, flushing any
    /// pending list block first.
    fn line(&mut self, line: String) {
        self.flush_list();
        self.in_tables = false;
        self.out.push_str(&line);
        self.out.push_str("\n\n");
    }

    /// Emit a pre-built table grid verbatim, opening a `### Tables` group
    /// unless the previous emission was also a table.
    fn table(&mut self, grid: &str) {
        self.flush_list();
        if !self.in_tables {
            self.out.push_str("### Tables\n\n");
            self.in_tables = true;
        }
        self.out.push_str(grid);
        self.out.push_str("\n\n");
    }

    /// Flush buffered bullet items as a single list block.
    fn flush_list(&mut self) {
        if self.list.is_empty() {
            return;
        }
        for item in &self.list {
            self.out.push_str(item);
            self.out.push('\n');
        }
        self.out.push('\n');
        self.list.clear();
    }

    fn finish(mut self) -> String {
        self.flush_list();
        if self.out.is_empty() {
            return String::new();
        }
        format!("{}\n", self.out.trim_end())
    }
}
