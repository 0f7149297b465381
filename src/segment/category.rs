use serde::{Deserialize, Serialize};

/// Visual category of a timeline section, derived from its title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionCategory {
    Overview,
    Market,
    Trend,
    Competitive,
    Framework,
    Positive,
    Risk,
    Insight,
    Generic,
}

impl SectionCategory {
    /// Icon identifier a front-end draws next to the section title.
    pub fn icon(self) -> &'static str {
        match self {
            SectionCategory::Overview | SectionCategory::Generic => "file-text",
            SectionCategory::Market => "bar-chart",
            SectionCategory::Trend => "trending-up",
            SectionCategory::Competitive => "target",
            SectionCategory::Framework => "shield",
            SectionCategory::Positive => "check-circle",
            SectionCategory::Risk => "alert-triangle",
            SectionCategory::Insight => "lightbulb",
        }
    }

    /// Single-glyph stand-in for the icon on plain terminals.
    pub fn glyph(self) -> char {
        match self {
            SectionCategory::Overview | SectionCategory::Generic => '≡',
            SectionCategory::Market => '▤',
            SectionCategory::Trend => '↗',
            SectionCategory::Competitive => '◎',
            SectionCategory::Framework => '◆',
            SectionCategory::Positive => '✓',
            SectionCategory::Risk => '⚠',
            SectionCategory::Insight => '✦',
        }
    }
}

// Scanned in declaration order; keywords overlap ("market growth" is Market,
// not Trend), so this must stay an ordered list.
const KEYWORD_CATEGORIES: &[(&str, SectionCategory)] = &[
    ("summary", SectionCategory::Overview),
    ("overview", SectionCategory::Overview),
    ("market", SectionCategory::Market),
    ("size", SectionCategory::Market),
    ("trend", SectionCategory::Trend),
    ("growth", SectionCategory::Trend),
    ("competitor", SectionCategory::Competitive),
    ("player", SectionCategory::Competitive),
    ("swot", SectionCategory::Framework),
    ("strength", SectionCategory::Positive),
    ("weakness", SectionCategory::Risk),
    ("opportunit", SectionCategory::Insight),
    ("threat", SectionCategory::Risk),
    ("recommend", SectionCategory::Insight),
    ("insight", SectionCategory::Insight),
    ("conclusion", SectionCategory::Positive),
];

pub fn category_for_title(title: &str) -> SectionCategory {
    let lower = title.to_lowercase();
    KEYWORD_CATEGORIES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, category)| *category)
        .unwrap_or(SectionCategory::Generic)
}
