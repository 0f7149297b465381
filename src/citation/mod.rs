//! Confidence badges and grouping for the sources behind a finished answer.

mod context;
mod source;

pub use context::{format_context, select_sources, CONTEXT_THRESHOLD, DEFAULT_TOP_K};
pub use source::{parse_sources, Source, SourceType};

use serde::Serialize;

pub const HIGH_SIMILARITY: f64 = 0.85;
pub const MEDIUM_SIMILARITY: f64 = 0.65;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Bucket a retrieval similarity. Both thresholds are inclusive.
    pub fn from_similarity(similarity: f64) -> Self {
        if similarity >= HIGH_SIMILARITY {
            ConfidenceTier::High
        } else if similarity >= MEDIUM_SIMILARITY {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfidenceTier::High => "Alta",
            ConfidenceTier::Medium => "Média",
            ConfidenceTier::Low => "Baixa",
        }
    }

    /// Semantic intent a front-end maps to its own palette.
    pub fn intent(self) -> &'static str {
        match self {
            ConfidenceTier::High => "positive",
            ConfidenceTier::Medium => "caution",
            ConfidenceTier::Low => "negative",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            ConfidenceTier::High => "🟢",
            ConfidenceTier::Medium => "🟡",
            ConfidenceTier::Low => "🔴",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfidenceBadge {
    pub label: &'static str,
    pub intent: &'static str,
    pub tier: ConfidenceTier,
}

impl ConfidenceBadge {
    pub fn for_similarity(similarity: f64) -> Self {
        let tier = ConfidenceTier::from_similarity(similarity);
        Self {
            label: tier.label(),
            intent: tier.intent(),
            tier,
        }
    }
}

/// Similarity as a whole percentage, rounded to nearest.
pub fn similarity_percent(similarity: f64) -> u32 {
    (similarity * 100.0).round() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitationRow {
    pub source: String,
    pub source_type: SourceType,
    pub type_label: String,
    pub icon: &'static str,
    pub badge: ConfidenceBadge,
    pub percent: u32,
    pub preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitationGroup {
    pub source_type: SourceType,
    pub label: String,
    /// Indices into [`CitationView::rows`].
    pub rows: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitationView {
    pub header: String,
    /// One row per source, in input order.
    pub rows: Vec<CitationRow>,
    /// Rows grouped by source type, groups in first-seen order.
    pub groups: Vec<CitationGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CitationPanel {
    /// No sources: the panel is not drawn at all.
    Hidden,
    Shown(CitationView),
}

impl CitationPanel {
    pub fn is_hidden(&self) -> bool {
        matches!(self, CitationPanel::Hidden)
    }
}

pub fn classify(sources: &[Source]) -> CitationPanel {
    if sources.is_empty() {
        return CitationPanel::Hidden;
    }

    let rows: Vec<CitationRow> = sources
        .iter()
        .map(|source| CitationRow {
            source: source.source.clone(),
            source_type: source.source_type.clone(),
            type_label: source.source_type.label().to_string(),
            icon: source.source_type.icon(),
            badge: ConfidenceBadge::for_similarity(source.similarity),
            percent: similarity_percent(source.similarity),
            preview: source.preview.clone(),
        })
        .collect();

    let mut groups: Vec<CitationGroup> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        match groups
            .iter_mut()
            .find(|group| group.source_type == row.source_type)
        {
            Some(group) => group.rows.push(idx),
            None => groups.push(CitationGroup {
                source_type: row.source_type.clone(),
                label: row.type_label.clone(),
                rows: vec![idx],
            }),
        }
    }

    CitationPanel::Shown(CitationView {
        header: panel_header(rows.len()),
        rows,
        groups,
    })
}

fn panel_header(count: usize) -> String {
    if count == 1 {
        "1 fonte utilizada".to_string()
    } else {
        format!("{count} fontes utilizadas")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(ConfidenceTier::from_similarity(0.85), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_similarity(0.849999), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_similarity(0.65), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_similarity(0.649999), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::from_similarity(0.0), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::from_similarity(1.0), ConfidenceTier::High);
    }

    #[test]
    fn test_badge_labels() {
        assert_eq!(ConfidenceBadge::for_similarity(0.9).label, "Alta");
        assert_eq!(ConfidenceBadge::for_similarity(0.7).label, "Média");
        assert_eq!(ConfidenceBadge::for_similarity(0.1).label, "Baixa");
    }

    #[test]
    fn test_badge_carries_intent_for_serialized_views() {
        assert_eq!(ConfidenceBadge::for_similarity(0.9).intent, "positive");
        assert_eq!(ConfidenceBadge::for_similarity(0.7).intent, "caution");
        let badge = serde_json::to_value(ConfidenceBadge::for_similarity(0.2)).unwrap();
        assert_eq!(badge["intent"], "negative");
        assert_eq!(badge["tier"], "low");
    }

    #[test]
    fn test_percent_rounds_instead_of_truncating() {
        assert_eq!(similarity_percent(0.849), 85);
        assert_eq!(similarity_percent(0.844), 84);
        assert_eq!(similarity_percent(0.005), 1);
        assert_eq!(similarity_percent(1.0), 100);
    }

    #[test]
    fn test_empty_sources_hide_panel() {
        assert_eq!(classify(&[]), CitationPanel::Hidden);
    }

    #[test]
    fn test_groups_follow_first_seen_order() {
        let sources = vec![
            Source::new("Notes", "chat_analysis", 0.7),
            Source::new("Crunchbase", "competitor_discovery", 0.9),
            Source::new("Transcript", "chat_analysis", 0.5),
        ];
        let CitationPanel::Shown(view) = classify(&sources) else {
            panic!("expected a visible panel");
        };
        assert_eq!(view.header, "3 fontes utilizadas");
        assert_eq!(view.rows.len(), 3);
        assert_eq!(view.groups.len(), 2);
        assert_eq!(view.groups[0].label, "Research");
        assert_eq!(view.groups[0].rows, vec![0, 2]);
        assert_eq!(view.groups[1].label, "Competitor Intel");
        assert_eq!(view.rows[1].badge.tier, ConfidenceTier::High);
    }

    #[test]
    fn test_single_source_header_is_singular() {
        let panel = classify(&[Source::new("x", "unknown_type", 0.3)]);
        let CitationPanel::Shown(view) = panel else {
            panic!("expected a visible panel");
        };
        assert_eq!(view.header, "1 fonte utilizada");
        assert_eq!(view.rows[0].type_label, "unknown_type");
    }
}
