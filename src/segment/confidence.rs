use aho_corasick::AhoCorasick;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Confidence a section claims for itself through an explicit text marker.
/// Parses case-insensitively and serializes lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    const BY_PRIORITY: [Confidence; 3] = [Confidence::High, Confidence::Medium, Confidence::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Confidence::BY_PRIORITY
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| anyhow!("unknown confidence level '{value}'"))
    }
}

impl TryFrom<String> for Confidence {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// Grouped by tier in priority order, MARKERS_PER_TIER entries each.
const MARKERS: [&str; 9] = [
    "high confidence",
    "confidence: high",
    "**high**",
    "medium confidence",
    "confidence: medium",
    "**medium**",
    "low confidence",
    "confidence: low",
    "**low**",
];
const MARKERS_PER_TIER: usize = 3;

static MARKER_MATCHER: LazyLock<AhoCorasick> = LazyLock::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(MARKERS)
        .expect("confidence markers form a valid automaton")
});

/// Find the strongest confidence marker anywhere in `text`.
///
/// Priority is by tier, not by position: a "low confidence" early in the text
/// loses to a "high confidence" later on. Returns `None` when no marker is
/// present.
pub fn detect_confidence(text: &str) -> Option<Confidence> {
    let mut best: Option<usize> = None;
    for found in MARKER_MATCHER.find_overlapping_iter(text) {
        let tier = found.pattern().as_usize() / MARKERS_PER_TIER;
        if best.is_none_or(|current| tier < current) {
            best = Some(tier);
            if tier == 0 {
                break;
            }
        }
    }
    best.map(|tier| Confidence::BY_PRIORITY[tier])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_each_marker_form() {
        assert_eq!(detect_confidence("We have HIGH CONFIDENCE here"), Some(Confidence::High));
        assert_eq!(detect_confidence("Confidence: Medium"), Some(Confidence::Medium));
        assert_eq!(detect_confidence("rated **low** overall"), Some(Confidence::Low));
    }

    #[test]
    fn test_tier_priority_beats_position() {
        let text = "Low confidence on pricing. High confidence on demand.";
        assert_eq!(detect_confidence(text), Some(Confidence::High));
        let text = "confidence: low for churn, medium confidence for growth";
        assert_eq!(detect_confidence(text), Some(Confidence::Medium));
    }

    #[test]
    fn test_absent_marker_is_none() {
        assert_eq!(detect_confidence(""), None);
        assert_eq!(detect_confidence("The TAM is large."), None);
        assert_eq!(detect_confidence("confidence is high"), None);
    }

    #[test]
    fn test_levels_parse_in_any_case() {
        assert_eq!(" High ".parse::<Confidence>().unwrap(), Confidence::High);
        assert_eq!("MEDIUM".parse::<Confidence>().unwrap(), Confidence::Medium);
        let level: Confidence = serde_json::from_str("\"Low\"").unwrap();
        assert_eq!(level, Confidence::Low);
        assert_eq!(serde_json::to_string(&level).unwrap(), "\"low\"");
        assert!("certain".parse::<Confidence>().is_err());
    }
}
