//! # pdf2chunks
//!
//! Split, analyze, and chunk PDF documents into retrieval-ready content and
//! page-aware Markdown.
//!
//! ## Why this crate?
//!
//! Layout-analysis services cap upload sizes and bill per page, and their
//! results come back as flat element lists with page numbers local to
//! whatever bytes you sent. Feeding a large PDF to such a service naively
//! loses global page numbering, keeps page furniture (headers, footers,
//! page numbers) mixed into the content, and leaves you without
//! retrieval-sized units. This crate handles the whole round trip: it splits
//! the source into service-sized sub-documents, reconciles per-sub-document
//! results into one globally-paged section sequence, and assembles bounded,
//! overlap-aware chunks plus a faithful Markdown reconstruction.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Split      cut into sub-documents of N pages (lopdf)
//!  ├─ 2. Analyze    injected DocumentAnalyzer, one sub-document at a time
//!  ├─ 3. Extract    paragraphs + tables → Sections, boilerplate dropped
//!  ├─ 4. Reconcile  running page offset → document-global page numbers
//!  ├─ 5. Chunk      page-based windows, or size-bounded with overlap
//!  └─ 6. Render     page-aware Markdown (headings, lists, table grids)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2chunks::{analyze_file, AnalysisConfig, AzureAnalyzer, ChunkStrategy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::builder()
//!         .strategy(ChunkStrategy::SizeBased)
//!         .max_chunk_size(2000)
//!         .overlap(150)
//!         .build();
//!     // Reads AZURE_DI_ENDPOINT / AZURE_DI_KEY
//!     let analyzer = AzureAnalyzer::from_env(&config)?;
//!     let output = analyze_file("document.pdf", &analyzer, &config).await?;
//!     println!("{}", output.markdown);
//!     eprintln!("{} pages, {} chunks", output.result.page_count, output.chunks.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2chunks` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2chunks = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod analyze;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod remote;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::{
    AnalysisFeature, AnalyzeRequest, AnalyzeResponse, DocumentAnalyzer, OutputFormat,
};
pub use analyze::{analyze_bytes, analyze_file, AnalysisOutput};
pub use cache::AnalysisCache;
pub use classify::{classify_sections, ChatCompleter};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ChunkStrategy, ChunkingConfig};
pub use error::AnalyzeError;
pub use model::{
    AnalysisResult, ChunkMetadata, Classification, DocumentChunk, EnrichedSection,
    QualityMetrics, Section, SectionRole,
};
pub use progress::{AnalysisProgress, NoopProgress, ProgressCallback};
pub use remote::AzureAnalyzer;
