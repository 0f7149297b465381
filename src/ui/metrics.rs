use unicode_width::UnicodeWidthChar;

pub fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

pub fn display_width(text: &str) -> usize {
    text.chars().map(char_display_width).sum()
}

pub fn truncate_to_display_width(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > max_width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out
}

/// Fit `text` into `max_width` columns, ending with `…` when cut.
pub fn fit_to_width(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = truncate_to_display_width(text, max_width - 1);
    out.push('…');
    out
}

/// Hard-wrap each line of `text` at `width` columns. Wide characters are
/// never split across rows.
pub fn wrap_to_width(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = vec![String::new()];
    let mut current_width = 0usize;
    for ch in text.chars() {
        if ch == '\r' {
            continue;
        }
        if ch == '\n' {
            lines.push(String::new());
            current_width = 0;
            continue;
        }
        let ch_width = char_display_width(ch);
        if current_width + ch_width > width && current_width > 0 {
            lines.push(String::new());
            current_width = 0;
        }
        if let Some(line) = lines.last_mut() {
            line.push(ch);
        }
        current_width += ch_width;
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_to_width_counts_columns_not_chars() {
        assert_eq!(fit_to_width("short", 10), "short");
        assert_eq!(fit_to_width("relatório-anual", 8), "relatór…");
        // CJK glyphs take two columns each.
        assert_eq!(fit_to_width("市场研究报告", 7), "市场研…");
        assert_eq!(fit_to_width("abc", 0), "");
    }

    #[test]
    fn test_wrap_to_width_keeps_wide_chars_whole() {
        assert_eq!(wrap_to_width("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_to_width("市场研究", 3), vec!["市", "场", "研", "究"]);
        assert_eq!(wrap_to_width("a\r\nb", 4), vec!["a", "b"]);
        assert_eq!(wrap_to_width("", 4), vec![""]);
    }
}
