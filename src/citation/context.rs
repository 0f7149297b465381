use super::{similarity_percent, Source};
use std::cmp::Ordering;

/// Sources scoring below this never reach the model.
pub const CONTEXT_THRESHOLD: f64 = super::MEDIUM_SIMILARITY;
pub const DEFAULT_TOP_K: usize = 5;

const SEPARATOR: &str = "\n\n---\n\n";

/// Keep the `top_k` most similar sources at or above `threshold`, best first.
/// Ties keep their input order.
pub fn select_sources(sources: &[Source], threshold: f64, top_k: usize) -> Vec<Source> {
    let mut selected: Vec<Source> = sources
        .iter()
        .filter(|source| source.similarity >= threshold)
        .cloned()
        .collect();
    selected.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    selected.truncate(top_k);
    selected
}

/// Render sources as a numbered context block for a system prompt.
///
/// Each entry reads `[Source N: name (relevance: P%)]` followed by its
/// passage; entries are separated by a `---` rule. No sources gives an
/// empty string.
pub fn format_context(sources: &[Source]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(idx, source)| {
            format!(
                "[Source {}: {} (relevance: {}%)]\n{}",
                idx + 1,
                source.source,
                similarity_percent(source.similarity),
                source.passage()
            )
        })
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}
