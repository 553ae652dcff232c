//! LLM-assisted section classification.
//!
//! Each extracted section is judged `KEEP` (main document content),
//! `REMOVE` (OCR junk, stray characters, artefacts) or `AUXILIARY`
//! (comments, explanations, side notes). Classification is an enrichment,
//! never a gatekeeper: any failure — the completion call, a malformed
//! reply, a missing entry — degrades to `KEEP` for the affected sections
//! with a warning, so a flaky model can never fail a batch or drop content.
//!
//! Sections are submitted in batches bounded by the same character budget
//! as size-based chunking, with trailing sections re-sent as leading
//! context for the next batch. The model replies with a JSON object
//! mapping section numbers to verdicts; entries are parsed individually so
//! one bad value does not poison the rest of the reply.

use crate::config::ChunkingConfig;
use crate::error::AnalyzeError;
use crate::model::{Classification, EnrichedSection, Section};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

/// The injected chat-completion capability used for classification.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Send one prompt, return the model's raw text reply.
    async fn complete(&self, prompt: &str) -> Result<String, AnalyzeError>;
}

/// Classify every section, consuming them into [`EnrichedSection`]s.
///
/// Batch size and context overlap follow `config.max_chunk_size` and
/// `config.overlap` (clamped). Never fails: unclassifiable sections
/// default to [`Classification::Keep`].
pub async fn classify_sections(
    sections: Vec<Section>,
    completer: &dyn ChatCompleter,
    config: &ChunkingConfig,
) -> Vec<EnrichedSection> {
    if sections.is_empty() {
        return Vec::new();
    }
    let config = config.clamped();
    let batches = batch_indices(&sections, config.max_chunk_size, config.overlap);
    debug!(
        "Classifying {} sections in {} batches",
        sections.len(),
        batches.len()
    );

    let mut verdicts: Vec<Option<Classification>> = vec![None; sections.len()];
    for batch in batches {
        let prompt = build_prompt(&sections, &batch);
        let parsed = match completer.complete(&prompt).await {
            Ok(reply) => parse_classification(&reply),
            Err(e) => {
                warn!("Classification call failed, keeping batch as-is: {e}");
                HashMap::new()
            }
        };
        for (position, &section_index) in batch.iter().enumerate() {
            if verdicts[section_index].is_none() {
                if let Some(&verdict) = parsed.get(&position) {
                    verdicts[section_index] = Some(verdict);
                }
            }
        }
    }

    sections
        .into_iter()
        .zip(verdicts)
        .map(|(section, verdict)| {
            EnrichedSection::from_section(section, verdict.unwrap_or(Classification::Keep))
        })
        .collect()
}

/// Group section indices into batches whose content lengths fit the budget,
/// carrying whole trailing sections into the next batch as context.
fn batch_indices(sections: &[Section], max_size: usize, overlap: usize) -> Vec<Vec<usize>> {
    let mut batches: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut current_len = 0usize;

    for (i, section) in sections.iter().enumerate() {
        let len = section.content.trim().len();
        if !current.is_empty() && current_len + len > max_size {
            let seed = overlap_indices(sections, &current, overlap);
            batches.push(std::mem::replace(&mut current, seed));
            current_len = current
                .iter()
                .map(|&j| sections[j].content.trim().len())
                .sum();
        }
        current.push(i);
        current_len += len;
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

fn overlap_indices(sections: &[Section], batch: &[usize], overlap: usize) -> Vec<usize> {
    if overlap == 0 {
        return Vec::new();
    }
    let mut seed: Vec<usize> = Vec::new();
    let mut chars = 0usize;
    for &i in batch.iter().rev() {
        let len = sections[i].content.trim().len();
        if chars + len > overlap {
            break;
        }
        chars += len;
        seed.push(i);
    }
    seed.reverse();
    seed
}

/// Build one classification prompt over the batch's sections, numbered by
/// their position within the batch.
fn build_prompt(sections: &[Section], batch: &[usize]) -> String {
    let mut prompt = String::from(
        "You are reviewing sections extracted from a PDF document.\n\
         Classify each numbered section as one of:\n\
         - KEEP: main document content (articles, paragraphs, definitions)\n\
         - REMOVE: extraction junk (OCR artefacts, stray characters, markers)\n\
         - AUXILIARY: auxiliary text (comments, explanations, side notes)\n\n\
         Respond with a single JSON object mapping section numbers to verdicts,\n\
         for example: {\"0\": \"KEEP\", \"1\": \"REMOVE\"}. Respond with JSON only.\n\n",
    );
    for (position, &i) in batch.iter().enumerate() {
        let s = &sections[i];
        prompt.push_str(&format!(
            "[{position}] role={} page={}\n{}\n\n",
            s.role,
            s.page_number,
            s.content.trim()
        ));
    }
    prompt
}

/// Parse the model's reply into per-position verdicts.
///
/// Tolerates code fences and surrounding prose, and skips individual
/// entries with unparseable keys or unknown verdict tokens. An entirely
/// unusable reply yields an empty map (everything defaults to `KEEP`).
pub fn parse_classification(reply: &str) -> HashMap<usize, Classification> {
    let json = extract_json_object(reply);
    let Some(json) = json else {
        warn!("Classification reply contained no JSON object");
        return HashMap::new();
    };
    let map: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(json) {
        Ok(m) => m,
        Err(e) => {
            warn!("Classification reply is not a JSON object: {e}");
            return HashMap::new();
        }
    };

    let mut verdicts = HashMap::with_capacity(map.len());
    for (key, value) in map {
        let Ok(position) = key.trim().parse::<usize>() else {
            warn!("Skipping classification entry with non-numeric key '{key}'");
            continue;
        };
        let Some(verdict) = value.as_str().and_then(Classification::parse) else {
            warn!("Skipping classification entry {position} with verdict {value}");
            continue;
        };
        verdicts.insert(position, verdict);
    }
    verdicts
}

/// Slice out the first `{ … }` span, skipping markdown code fences.
fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end >= start).then(|| &reply[start..=end])
}
