use super::{clean_markdown, segment, Section, SectionCategory};

/// Answers at or above this many characters always get timeline chrome.
pub const INLINE_MAX_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub section: Section,
    pub category: SectionCategory,
    /// Draw the vertical connector down to the next entry.
    pub connector: bool,
    /// Show the streaming cursor after this entry's content.
    pub streaming_cursor: bool,
}

/// How an assistant answer should be laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderPlan {
    /// Short single-section answer, shown as plain text.
    Inline { text: String, streaming_cursor: bool },
    Timeline { entries: Vec<TimelineEntry> },
}

impl RenderPlan {
    pub fn for_text(text: &str, streaming: bool) -> Self {
        Self::from_sections(text, segment(text), streaming)
    }

    pub fn from_sections(text: &str, sections: Vec<Section>, streaming: bool) -> Self {
        let short_single = match sections.as_slice() {
            [] => true,
            [only] => only.content.chars().count() < INLINE_MAX_CHARS,
            _ => false,
        };
        if short_single {
            return RenderPlan::Inline {
                text: clean_markdown(text),
                streaming_cursor: streaming,
            };
        }

        let last = sections.len() - 1;
        let entries = sections
            .into_iter()
            .enumerate()
            .map(|(idx, section)| TimelineEntry {
                category: section.category(),
                section,
                connector: idx != last,
                streaming_cursor: streaming && idx == last,
            })
            .collect();
        RenderPlan::Timeline { entries }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, RenderPlan::Inline { .. })
    }
}
