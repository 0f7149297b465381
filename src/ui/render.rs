//! Turn render plans, citation panels and structured results into styled
//! text lines. Nothing here touches the terminal; see `ui::terminal`.

use crate::citation::{CitationPanel, ConfidenceTier};
use crate::discovery::DiscoveryReport;
use crate::frameworks::{FrameworkKind, SwotAnalysis};
use crate::segment::{Confidence, RenderPlan, BULLET};
use crate::types::ChatMode;
use crate::ui::metrics::{display_width, fit_to_width, wrap_to_width};
use serde_json::Value;

pub const STREAMING_CURSOR: char = '▍';
const CONNECTOR: &str = "│ ";
const GAP: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Title,
    Muted,
    Accent,
    Positive,
    Caution,
    Negative,
}

impl From<Confidence> for Tone {
    fn from(confidence: Confidence) -> Self {
        match confidence {
            Confidence::High => Tone::Positive,
            Confidence::Medium => Tone::Caution,
            Confidence::Low => Tone::Negative,
        }
    }
}

impl From<ConfidenceTier> for Tone {
    fn from(tier: ConfidenceTier) -> Self {
        match tier {
            ConfidenceTier::High => Tone::Positive,
            ConfidenceTier::Medium => Tone::Caution,
            ConfidenceTier::Low => Tone::Negative,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub spans: Vec<Span>,
}

impl StyledLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn styled(text: impl Into<String>, tone: Tone) -> Self {
        Self::new().with(text, tone)
    }

    pub fn with(mut self, text: impl Into<String>, tone: Tone) -> Self {
        self.spans.push(Span {
            text: text.into(),
            tone,
        });
        self
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

pub fn plain_text(lines: &[StyledLine]) -> String {
    lines
        .iter()
        .map(StyledLine::plain_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_wrapped(out: &mut Vec<StyledLine>, prefix: &str, text: &str, tone: Tone, width: usize) {
    let inner = width.saturating_sub(display_width(prefix)).max(1);
    for row in wrap_to_width(text, inner) {
        out.push(StyledLine::styled(prefix, Tone::Muted).with(row, tone));
    }
}

fn append_cursor(lines: &mut [StyledLine]) {
    if let Some(last) = lines.last_mut() {
        last.spans.push(Span {
            text: STREAMING_CURSOR.to_string(),
            tone: Tone::Accent,
        });
    }
}

/// Lay out one assistant answer.
pub fn answer_lines(plan: &RenderPlan, width: usize) -> Vec<StyledLine> {
    let mut out = Vec::new();
    match plan {
        RenderPlan::Inline {
            text,
            streaming_cursor,
        } => {
            for row in wrap_to_width(text, width) {
                out.push(StyledLine::styled(row, Tone::Plain));
            }
            if *streaming_cursor {
                append_cursor(&mut out);
            }
        }
        RenderPlan::Timeline { entries } => {
            for entry in entries {
                let mut header = StyledLine::styled(format!("{} ", entry.category.glyph()), Tone::Accent)
                    .with(entry.section.title.clone(), Tone::Title);
                if let Some(confidence) = entry.section.confidence {
                    header = header.with(format!("  [{confidence}]"), confidence.into());
                }
                out.push(header);

                let prefix = if entry.connector { CONNECTOR } else { GAP };
                let start = out.len();
                if !entry.section.content.is_empty() {
                    push_wrapped(&mut out, prefix, &entry.section.content, Tone::Plain, width);
                }
                if entry.streaming_cursor {
                    if out.len() == start {
                        out.push(StyledLine::styled(prefix, Tone::Muted));
                    }
                    append_cursor(&mut out);
                }
                if entry.connector {
                    out.push(StyledLine::styled(CONNECTOR.trim_end(), Tone::Muted));
                }
            }
        }
    }
    out
}

/// Lay out the source panel. A hidden panel renders nothing.
pub fn citation_lines(panel: &CitationPanel, width: usize) -> Vec<StyledLine> {
    let CitationPanel::Shown(view) = panel else {
        return Vec::new();
    };

    let mut out = vec![StyledLine::styled(view.header.clone(), Tone::Title)];
    for group in &view.groups {
        out.push(StyledLine::styled(format!("  {}", group.label), Tone::Muted));
        for &idx in &group.rows {
            let Some(row) = view.rows.get(idx) else {
                continue;
            };
            let tail = format!(" {} {}%", row.badge.label, row.percent);
            let lead = format!("    {} ", row.badge.tier.emoji());
            let room = width.saturating_sub(display_width(&lead) + display_width(&tail));
            out.push(
                StyledLine::styled(lead, Tone::Plain)
                    .with(fit_to_width(&row.source, room.max(1)), Tone::Plain)
                    .with(tail, row.badge.tier.into()),
            );
            if let Some(preview) = row.preview.as_deref().filter(|p| !p.trim().is_empty()) {
                let indent = "      ";
                let room = width.saturating_sub(indent.len()).max(1);
                out.push(
                    StyledLine::styled(indent, Tone::Muted)
                        .with(fit_to_width(preview.trim(), room), Tone::Muted),
                );
            }
        }
    }
    out
}

pub fn mode_banner(mode: ChatMode) -> StyledLine {
    StyledLine::styled("Mode: ", Tone::Muted).with(mode.label(), Tone::Accent)
}

fn humanize_key(key: &str) -> String {
    let mut words = Vec::new();
    for word in key.split('_').filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            words.push(first.to_uppercase().chain(chars).collect::<String>());
        }
    }
    words.join(" ")
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn value_lines(value: &Value, indent: usize, width: usize, out: &mut Vec<StyledLine>) {
    let prefix = " ".repeat(indent);
    match value {
        Value::Array(items) => {
            for item in items {
                match scalar_text(item) {
                    Some(text) => push_wrapped(out, &format!("{prefix}{BULLET}"), &text, Tone::Plain, width),
                    None => value_lines(item, indent + 2, width, out),
                }
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let label = humanize_key(key);
                match scalar_text(item) {
                    Some(text) => out.push(
                        StyledLine::styled(format!("{prefix}{label}: "), Tone::Muted).with(text, Tone::Plain),
                    ),
                    None => {
                        out.push(StyledLine::styled(format!("{prefix}{label}"), Tone::Title));
                        value_lines(item, indent + 2, width, out);
                    }
                }
            }
        }
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                push_wrapped(out, &prefix, &text, Tone::Plain, width);
            }
        }
    }
}

pub fn swot_lines(swot: &SwotAnalysis, width: usize) -> Vec<StyledLine> {
    let mut out = Vec::new();
    for (name, items) in swot.quadrants() {
        let tone = match name {
            "strengths" | "opportunities" => Tone::Positive,
            _ => Tone::Negative,
        };
        out.push(StyledLine::styled(humanize_key(name), tone));
        for item in items {
            push_wrapped(&mut out, &format!("  {BULLET}"), item, Tone::Plain, width);
        }
    }
    out
}

/// Lay out a framework result. SWOT payloads get quadrant styling; anything
/// else is shown as a key/value outline.
pub fn framework_lines(kind: FrameworkKind, result: &Value, width: usize) -> Vec<StyledLine> {
    let mut out = vec![StyledLine::styled(kind.name(), Tone::Title)];
    if kind == FrameworkKind::Swot {
        if let Some(swot) = SwotAnalysis::from_result(result) {
            out.extend(swot_lines(&swot, width));
            return out;
        }
    }
    value_lines(result, 0, width, &mut out);
    out
}

pub fn discovery_lines(report: &DiscoveryReport, width: usize) -> Vec<StyledLine> {
    let mut out = vec![
        StyledLine::styled("Coverage: ", Tone::Muted).with(format!("{:.0}%", report.coverage), Tone::Accent),
    ];
    if report.is_empty() {
        out.push(StyledLine::styled("No competitors found.", Tone::Muted));
        return out;
    }
    for competitor in &report.competitors {
        out.push(
            StyledLine::styled(competitor.name.clone(), Tone::Title)
                .with(format!("  [{}]", competitor.confidence), competitor.confidence.into()),
        );
        for (label, text) in [
            ("Funding", &competitor.funding),
            ("Headcount", &competitor.headcount),
            ("Pricing", &competitor.pricing),
            ("Positioning", &competitor.positioning),
        ] {
            let prefix = format!("  {label}: ");
            push_wrapped(&mut out, &prefix, text, Tone::Plain, width);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::{classify, Source};
    use crate::discovery::Competitor;
    use serde_json::json;

    #[test]
    fn test_inline_answer_has_no_timeline_chrome() {
        let plan = RenderPlan::for_text("**Yes**, it grows.", true);
        let lines = answer_lines(&plan, 40);
        assert_eq!(plain_text(&lines), format!("Yes, it grows.{STREAMING_CURSOR}"));
    }

    #[test]
    fn test_timeline_draws_connectors_between_sections() {
        let text = "# Overview\nThe AI CRM market is growing fast across SMB segments worldwide today.\n# Risks\nHigh confidence the market will consolidate.";
        let plan = RenderPlan::for_text(text, false);
        let rendered = plain_text(&answer_lines(&plan, 200));
        let expected = [
            "≡ Overview",
            "│ The AI CRM market is growing fast across SMB segments worldwide today.",
            "│",
            "≡ Risks  [high]",
            "  High confidence the market will consolidate.",
        ]
        .join("\n");
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_streaming_cursor_follows_last_section_even_when_empty() {
        let text = "# Overview\nSome long enough content to force the timeline layout here.\n# Risks\n";
        let plan = RenderPlan::for_text(text, true);
        let lines = answer_lines(&plan, 200);
        let last = lines.last().unwrap().plain_text();
        assert!(last.ends_with(STREAMING_CURSOR));
        assert_eq!(
            lines.iter().filter(|l| l.plain_text().contains(STREAMING_CURSOR)).count(),
            1
        );
    }

    #[test]
    fn test_hidden_citation_panel_renders_nothing() {
        assert!(citation_lines(&classify(&[]), 80).is_empty());
    }

    #[test]
    fn test_citation_rows_show_badge_and_percent() {
        let sources = vec![
            Source::new("hubspot-pricing", "competitor_discovery", 0.912)
                .with_preview("HubSpot raised prices"),
            Source::new("swot-notion", "framework_analysis", 0.7),
            Source::new("legacy", "unknown_type", 0.3),
        ];
        let rendered = plain_text(&citation_lines(&classify(&sources), 80));
        assert!(rendered.starts_with("3 fontes utilizadas"));
        assert!(rendered.contains("🟢 hubspot-pricing Alta 91%"));
        assert!(rendered.contains("HubSpot raised prices"));
        assert!(rendered.contains("🟡 swot-notion Média 70%"));
        assert!(rendered.contains("  unknown_type\n"));
        assert!(rendered.contains("🔴 legacy Baixa 30%"));
    }

    #[test]
    fn test_long_source_names_are_fitted() {
        let sources = vec![Source::new("a".repeat(100), "chat_analysis", 0.9)];
        let lines = citation_lines(&classify(&sources), 40);
        let row = lines[2].plain_text();
        assert!(row.contains('…'));
        assert!(display_width(&row) <= 40);
    }

    #[test]
    fn test_framework_lines_outline_non_swot_payloads() {
        let result = json!({
            "tam": { "value": "$12B", "confidence": "medium" }
        });
        let rendered = plain_text(&framework_lines(FrameworkKind::Tam, &result, 80));
        assert_eq!(rendered, "TAM/SAM/SOM\nTam\n  Confidence: medium\n  Value: $12B");
    }

    #[test]
    fn test_framework_lines_use_swot_quadrants() {
        let result = json!({ "strengths": ["Brand"], "threats": ["Churn"] });
        let rendered = plain_text(&framework_lines(FrameworkKind::Swot, &result, 80));
        assert_eq!(
            rendered,
            "SWOT Analysis\nStrengths\n  • Brand\nWeaknesses\nOpportunities\nThreats\n  • Churn"
        );
    }

    #[test]
    fn test_discovery_lines_list_each_competitor() {
        let report = DiscoveryReport {
            competitors: vec![Competitor {
                name: "Pipedrive".to_string(),
                funding: "Acquired".to_string(),
                headcount: "1000+".to_string(),
                pricing: "$14-$99/user/mo".to_string(),
                positioning: "Sales-first CRM".to_string(),
                confidence: Confidence::Medium,
            }],
            coverage: 64.6,
        };
        let rendered = plain_text(&discovery_lines(&report, 80));
        assert!(rendered.starts_with("Coverage: 65%\nPipedrive  [medium]\n  Funding: Acquired"));
        assert!(rendered.ends_with("  Positioning: Sales-first CRM"));

        let empty = plain_text(&discovery_lines(&DiscoveryReport::default(), 80));
        assert_eq!(empty, "Coverage: 0%\nNo competitors found.");
    }
}
