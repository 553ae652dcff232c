//! Configuration for document analysis and chunk assembly.
//!
//! All behaviour is controlled through [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across tasks, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! Chunking parameters are deliberately *clamped*, never rejected: a caller
//! cannot misconfigure the assembler into a non-terminating or zero-progress
//! state, so there is no configuration error to propagate.

use crate::analysis::{AnalysisFeature, OutputFormat};
use crate::progress::AnalysisProgress;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Which chunk-assembly strategy to run. The two are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChunkStrategy {
    /// Group sections by consecutive page windows of `pages_per_chunk` width.
    #[default]
    #[serde(rename = "page-based")]
    PageBased,
    /// Greedy size-bounded accumulation with a character-budget overlap
    /// carried between consecutive chunks.
    #[serde(rename = "size-based")]
    SizeBased,
}

impl ChunkStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkStrategy::PageBased => "page-based",
            ChunkStrategy::SizeBased => "size-based",
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "page-based" | "pages" => Ok(ChunkStrategy::PageBased),
            "size-based" | "size" => Ok(ChunkStrategy::SizeBased),
            other => Err(format!(
                "unknown chunking strategy '{other}' (expected 'page-based' or 'size-based')"
            )),
        }
    }
}

/// Chunk-assembly parameters.
///
/// `pages_per_chunk` doubles as the split width: the splitter cuts the source
/// PDF into sub-documents of this many pages, and the page-based assembler
/// walks page windows of the same width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub strategy: ChunkStrategy,
    /// Pages per split sub-document / page-based chunk window. Minimum 1.
    pub pages_per_chunk: u32,
    /// Character budget per size-based chunk. Minimum 1. A single section
    /// longer than this is still emitted whole — content integrity wins over
    /// strict size bounding.
    pub max_chunk_size: usize,
    /// Characters of trailing content repeated at the start of the next
    /// size-based chunk. Always kept below `max_chunk_size`.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::default(),
            pages_per_chunk: 5,
            max_chunk_size: 4000,
            overlap: 200,
        }
    }
}

impl ChunkingConfig {
    /// Return a copy with every parameter forced into its valid range:
    /// `pages_per_chunk ≥ 1`, `max_chunk_size ≥ 1`, `overlap < max_chunk_size`.
    pub fn clamped(&self) -> Self {
        let pages_per_chunk = self.pages_per_chunk.max(1);
        let max_chunk_size = self.max_chunk_size.max(1);
        let overlap = self.overlap.min(max_chunk_size - 1);
        Self {
            strategy: self.strategy,
            pages_per_chunk,
            max_chunk_size,
            overlap,
        }
    }
}

/// Configuration for one document analysis run.
///
/// Built via [`AnalysisConfig::builder()`] or [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2chunks::{AnalysisConfig, ChunkStrategy};
///
/// let config = AnalysisConfig::builder()
///     .strategy(ChunkStrategy::SizeBased)
///     .max_chunk_size(2000)
///     .overlap(150)
///     .locale("pl-PL")
///     .build();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Analysis-service model identifier. Default: `"prebuilt-layout"`.
    pub model_id: String,

    /// OCR locale hint forwarded to the service, e.g. `"pl-PL"`.
    pub locale: Option<String>,

    /// Capability flags forwarded to the service.
    /// Default: style/font info and key-value pairs.
    pub features: Vec<AnalysisFeature>,

    /// Requested format of the service-assembled raw content. Default: Markdown.
    pub output_format: OutputFormat,

    /// Chunk-assembly parameters.
    pub chunking: ChunkingConfig,

    /// Maximum retry attempts on a transient analysis failure. Default: 3.
    ///
    /// Retries are the remote client's concern; the core pipeline makes one
    /// logical attempt per sub-document and aborts on failure.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-analysis-call timeout in seconds. Default: 120.
    ///
    /// Layout analysis of a multi-page sub-document routinely takes tens of
    /// seconds; an unbounded wait would hang the whole run on one bad call.
    pub api_timeout_secs: u64,

    /// Optional per-sub-document progress callback.
    pub progress: Option<Arc<dyn AnalysisProgress>>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model_id: "prebuilt-layout".to_string(),
            locale: None,
            features: vec![AnalysisFeature::StyleFont, AnalysisFeature::KeyValuePairs],
            output_format: OutputFormat::default(),
            chunking: ChunkingConfig::default(),
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            progress: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model_id", &self.model_id)
            .field("locale", &self.locale)
            .field("features", &self.features)
            .field("output_format", &self.output_format)
            .field("chunking", &self.chunking)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn AnalysisProgress>"))
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.config.model_id = model_id.into();
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.config.locale = Some(locale.into());
        self
    }

    pub fn features(mut self, features: Vec<AnalysisFeature>) -> Self {
        self.config.features = features;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    pub fn strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.config.chunking.strategy = strategy;
        self
    }

    pub fn pages_per_chunk(mut self, n: u32) -> Self {
        self.config.chunking.pages_per_chunk = n.max(1);
        self
    }

    pub fn max_chunk_size(mut self, n: usize) -> Self {
        self.config.chunking.max_chunk_size = n.max(1);
        self
    }

    pub fn overlap(mut self, n: usize) -> Self {
        self.config.chunking.overlap = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress(mut self, progress: Arc<dyn AnalysisProgress>) -> Self {
        self.config.progress = Some(progress);
        self
    }

    /// Build the configuration. Chunking parameters are clamped into their
    /// valid ranges rather than rejected.
    pub fn build(mut self) -> AnalysisConfig {
        self.config.chunking = self.config.chunking.clamped();
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_defaults_are_valid() {
        let c = ChunkingConfig::default();
        assert_eq!(c.clamped(), c);
    }

    #[test]
    fn clamping_forces_minimums() {
        let c = ChunkingConfig {
            strategy: ChunkStrategy::SizeBased,
            pages_per_chunk: 0,
            max_chunk_size: 0,
            overlap: 10,
        }
        .clamped();
        assert_eq!(c.pages_per_chunk, 1);
        assert_eq!(c.max_chunk_size, 1);
        assert_eq!(c.overlap, 0, "overlap must stay below max_chunk_size");
    }

    #[test]
    fn clamping_keeps_overlap_below_max_size() {
        let c = ChunkingConfig {
            strategy: ChunkStrategy::SizeBased,
            pages_per_chunk: 2,
            max_chunk_size: 100,
            overlap: 100,
        }
        .clamped();
        assert_eq!(c.overlap, 99);
    }

    #[test]
    fn strategy_parses_config_keys() {
        assert_eq!(
            "page-based".parse::<ChunkStrategy>().unwrap(),
            ChunkStrategy::PageBased
        );
        assert_eq!(
            "SIZE-BASED".parse::<ChunkStrategy>().unwrap(),
            ChunkStrategy::SizeBased
        );
        assert!("semantic".parse::<ChunkStrategy>().is_err());
    }

    #[test]
    fn strategy_serde_uses_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ChunkStrategy::PageBased).unwrap(),
            "\"page-based\""
        );
        let s: ChunkStrategy = serde_json::from_str("\"size-based\"").unwrap();
        assert_eq!(s, ChunkStrategy::SizeBased);
    }

    #[test]
    fn builder_clamps_on_build() {
        let config = AnalysisConfig::builder()
            .strategy(ChunkStrategy::SizeBased)
            .max_chunk_size(50)
            .overlap(500)
            .build();
        assert_eq!(config.chunking.overlap, 49);
    }
}
