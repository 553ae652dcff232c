//! Content-addressed memoization of whole-document analysis results.
//!
//! Remote layout analysis is the expensive step of the pipeline (seconds per
//! sub-document, billed per page), so repeated analysis of identical bytes
//! should hit memory instead of the network. Entries are keyed by the
//! SHA-256 of the source bytes: two files with the same name and size but
//! different content never collide, and a re-saved identical file still hits.
//!
//! The cache does NOT coalesce concurrent misses: two tasks analyzing the
//! same bytes at the same time will both perform the remote analysis and the
//! second insert wins. That is accepted — a duplicate analysis is wasteful
//! but correct, and single-flight coordination is not worth holding a lock
//! across a multi-second network call.

use crate::model::AnalysisResult;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

type Key = [u8; 32];

/// In-memory analysis-result cache keyed by content hash.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: Mutex<HashMap<Key, Arc<AnalysisResult>>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the analysis result for these exact bytes.
    pub fn get(&self, bytes: &[u8]) -> Option<Arc<AnalysisResult>> {
        let key = content_key(bytes);
        let hit = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key)
            .cloned();
        if hit.is_some() {
            debug!("Analysis cache hit ({} bytes)", bytes.len());
        }
        hit
    }

    /// Store the analysis result for these bytes, replacing any previous
    /// entry (last writer wins under concurrent misses).
    pub fn insert(&self, bytes: &[u8], result: AnalysisResult) -> Arc<AnalysisResult> {
        let key = content_key(bytes);
        let result = Arc::new(result);
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key, Arc::clone(&result));
        result
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached result.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

fn content_key(bytes: &[u8]) -> Key {
    Sha256::digest(bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QualityMetrics;

    fn result(file_name: &str) -> AnalysisResult {
        AnalysisResult {
            file_name: file_name.to_string(),
            page_count: 1,
            sections: vec![],
            quality: QualityMetrics {
                avg_confidence: 1.0,
                total_paragraphs: 0,
                total_chars: 0,
                has_structure_markers: false,
            },
        }
    }

    #[test]
    fn identical_bytes_hit_regardless_of_name() {
        let cache = AnalysisCache::new();
        cache.insert(b"same bytes", result("a.pdf"));
        let hit = cache.get(b"same bytes").expect("content hit");
        assert_eq!(hit.file_name, "a.pdf");
    }

    #[test]
    fn different_bytes_of_equal_length_do_not_collide() {
        let cache = AnalysisCache::new();
        cache.insert(b"aaaa", result("a.pdf"));
        assert!(cache.get(b"bbbb").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reinsert_replaces_previous_entry() {
        let cache = AnalysisCache::new();
        cache.insert(b"doc", result("first.pdf"));
        cache.insert(b"doc", result("second.pdf"));
        assert_eq!(cache.get(b"doc").unwrap().file_name, "second.pdf");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = AnalysisCache::new();
        cache.insert(b"doc", result("a.pdf"));
        cache.clear();
        assert!(cache.is_empty());
    }
}
