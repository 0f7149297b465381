//! Splits an assistant answer into titled timeline sections.
//!
//! The whole buffer is re-parsed on every call. During streaming the caller
//! passes the accumulated text after each chunk; section boundaries are always
//! re-derived from scratch so a growing prefix never leaves stale state behind.

mod category;
mod confidence;
mod markdown;
mod render;

pub use category::{category_for_title, SectionCategory};
pub use confidence::{detect_confidence, Confidence};
pub use markdown::{clean_markdown, BULLET};
pub use render::{RenderPlan, TimelineEntry, INLINE_MAX_CHARS};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::LazyLock;

/// Title given to text that appears before the first heading.
pub const PREAMBLE_TITLE: &str = "Resumo";
/// Title given to an answer that has no headings at all.
pub const FALLBACK_TITLE: &str = "Resposta";

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,3}[ \t]+([^\n]+)$").expect("heading pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
    pub confidence: Option<Confidence>,
}

impl Section {
    fn from_raw(title: String, raw: &str) -> Self {
        let content = clean_markdown(raw.trim());
        let confidence = detect_confidence(&content);
        Self {
            title,
            content,
            confidence,
        }
    }

    pub fn category(&self) -> SectionCategory {
        category_for_title(&self.title)
    }
}

/// Uncleaned byte spans of one section inside the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    pub title: String,
    /// Span of the heading line, without its trailing newline. `None` for the
    /// preamble and for the headingless fallback.
    pub heading: Option<Range<usize>>,
    pub body: Range<usize>,
}

/// Locate section boundaries without cleaning anything.
///
/// A preamble span is reported whenever it is non-empty, even if it is only
/// whitespace, so the bodies together with the heading lines cover `text`
/// exactly.
pub fn raw_sections(text: &str) -> Vec<RawSection> {
    let headings: Vec<(Range<usize>, String)> = HEADING_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let line = caps.get(0)?;
            let title = caps.get(1)?.as_str().replace('*', "").trim().to_string();
            Some((line.range(), title))
        })
        .collect();

    let Some((first, _)) = headings.first() else {
        return vec![RawSection {
            title: FALLBACK_TITLE.to_string(),
            heading: None,
            body: 0..text.len(),
        }];
    };

    let mut sections = Vec::with_capacity(headings.len() + 1);
    if first.start > 0 {
        sections.push(RawSection {
            title: PREAMBLE_TITLE.to_string(),
            heading: None,
            body: 0..first.start,
        });
    }

    for (idx, (line, title)) in headings.iter().enumerate() {
        let end = headings
            .get(idx + 1)
            .map(|(next, _)| next.start)
            .unwrap_or(text.len());
        sections.push(RawSection {
            title: title.clone(),
            heading: Some(line.clone()),
            body: line.end..end,
        });
    }

    sections
}

/// Split `text` into cleaned, classified sections in order of appearance.
///
/// Never fails: headingless text becomes a single fallback section, and a
/// heading dangling at the end of a partial stream yields an empty section.
pub fn segment(text: &str) -> Vec<Section> {
    raw_sections(text)
        .into_iter()
        .filter_map(|raw| {
            let body = &text[raw.body.clone()];
            if raw.heading.is_none() && raw.title == PREAMBLE_TITLE && body.trim().is_empty() {
                return None;
            }
            Some(Section::from_raw(raw.title, body))
        })
        .collect()
}
