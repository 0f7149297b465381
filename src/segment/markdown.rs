use regex::Regex;
use std::sync::LazyLock;

static HEADER_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,4}[ \t]+").expect("header marker pattern"));
static BOLD_ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\*(.*?)\*\*\*").expect("bold-italic pattern"));
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern"));
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("italic pattern"));
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[-*][ \t]+").expect("bullet pattern"));
static EXTRA_NEWLINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline run pattern"));

pub const BULLET: &str = "• ";

/// Strip leftover markdown decoration so a section renders as plain text.
///
/// The passes run in a fixed order: emphasis is collapsed from the widest
/// marker down, so `***x***` never leaves a stray `*` behind, and bullets are
/// normalized only after inline emphasis is gone.
pub fn clean_markdown(text: &str) -> String {
    let text = HEADER_MARKER_RE.replace_all(text, "");
    let text = BOLD_ITALIC_RE.replace_all(&text, "${1}");
    let text = BOLD_RE.replace_all(&text, "${1}");
    let text = ITALIC_RE.replace_all(&text, "${1}");
    let text = BULLET_RE.replace_all(&text, BULLET);
    let text = EXTRA_NEWLINES_RE.replace_all(&text, "\n\n");
    text.trim().to_string()
}
