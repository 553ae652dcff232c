//! Pipeline stages for document analysis and chunk assembly.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! split ──▶ (external analyze) ──▶ extract ──▶ reconcile ──▶ chunk ──▶ render
//! (lopdf)     (injected trait)     (sections)  (page offset)  (bounded)  (markdown)
//! ```
//!
//! 1. [`split`]     — cut the source PDF into page-bounded sub-documents
//! 2. [`extract`]   — map one analysis response into ordered `Section`s,
//!    filtering boilerplate and materializing tables as grid markdown
//! 3. [`reconcile`] — carry a running page offset so merged sections get
//!    document-global page numbers
//! 4. [`chunk`]     — partition the flat section sequence into bounded
//!    chunks (page-based or size-based-with-overlap)
//! 5. [`render`]    — deterministic section-to-markdown reconstruction
//! 6. [`quality`]   — aggregate metrics over the section sequence

pub mod chunk;
pub mod extract;
pub mod quality;
pub mod reconcile;
pub mod render;
pub mod split;
