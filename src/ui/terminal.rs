use crate::ui::render::{StyledLine, Tone};
use crossterm::{
    cursor::{MoveToColumn, MoveUp},
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{size, Clear, ClearType},
};
use std::io::{self, Write};

const FALLBACK_WIDTH: usize = 80;
const MIN_WIDTH: usize = 20;

pub fn terminal_width() -> usize {
    size()
        .map(|(cols, _)| cols as usize)
        .unwrap_or(FALLBACK_WIDTH)
        .max(MIN_WIDTH)
}

fn tone_color(tone: Tone) -> Option<Color> {
    match tone {
        Tone::Plain | Tone::Title => None,
        Tone::Muted => Some(Color::DarkGrey),
        Tone::Accent => Some(Color::Cyan),
        Tone::Positive => Some(Color::Green),
        Tone::Caution => Some(Color::Yellow),
        Tone::Negative => Some(Color::Red),
    }
}

pub fn write_lines<W: Write>(out: &mut W, lines: &[StyledLine]) -> io::Result<()> {
    for line in lines {
        for span in &line.spans {
            if span.tone == Tone::Title {
                queue!(
                    out,
                    SetAttribute(Attribute::Bold),
                    Print(&span.text),
                    SetAttribute(Attribute::Reset)
                )?;
            } else if let Some(color) = tone_color(span.tone) {
                queue!(out, SetForegroundColor(color), Print(&span.text), ResetColor)?;
            } else {
                queue!(out, Print(&span.text))?;
            }
        }
        queue!(out, Print("\n"))?;
    }
    out.flush()
}

/// Overwrite the current row with a dim one-line status.
pub fn write_status<W: Write>(out: &mut W, status: &str) -> io::Result<()> {
    queue!(
        out,
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        SetAttribute(Attribute::Dim),
        Print(status),
        SetAttribute(Attribute::Reset)
    )?;
    out.flush()
}

pub fn clear_status<W: Write>(out: &mut W) -> io::Result<()> {
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    out.flush()
}

/// Block of rows at the bottom of the output that is rewritten in place,
/// used for an answer that is still streaming.
#[derive(Debug, Default)]
pub struct LiveRegion {
    rows: usize,
}

impl LiveRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Replace the previously drawn block with `lines`.
    pub fn redraw<W: Write>(&mut self, out: &mut W, lines: &[StyledLine]) -> io::Result<()> {
        if self.rows > 0 {
            queue!(out, MoveUp(self.rows.min(u16::MAX as usize) as u16))?;
        }
        queue!(out, MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
        write_lines(out, lines)?;
        self.rows = lines.len();
        Ok(())
    }

    /// Leave the drawn block in place; the next redraw starts below it.
    pub fn commit(&mut self) {
        self.rows = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_lines_colors_only_toned_spans() {
        let lines = vec![
            StyledLine::styled("plain", Tone::Plain),
            StyledLine::styled("ok", Tone::Positive),
        ];
        let mut out = Vec::new();
        write_lines(&mut out, &lines).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("plain\n"));
        assert!(text.contains("\u{1b}["));
        assert!(text.contains("ok"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_status_line_clears_row_first() {
        let mut out = Vec::new();
        write_status(&mut out, "Analyzing…").unwrap();
        let text = String::from_utf8(out).unwrap();
        let clear_at = text.find("\u{1b}[2K").expect("clear sequence");
        assert!(clear_at < text.find("Analyzing…").unwrap());
    }

    #[test]
    fn test_live_region_moves_up_over_previous_draw() {
        let mut region = LiveRegion::new();
        let mut out = Vec::new();
        region
            .redraw(&mut out, &[StyledLine::styled("one", Tone::Plain), StyledLine::styled("two", Tone::Plain)])
            .unwrap();
        let first = String::from_utf8(std::mem::take(&mut out)).unwrap();
        assert!(!first.contains("\u{1b}[2A"));
        assert!(first.contains("\u{1b}[J"));
        assert_eq!(region.rows(), 2);

        region.redraw(&mut out, &[StyledLine::styled("three", Tone::Plain)]).unwrap();
        let second = String::from_utf8(std::mem::take(&mut out)).unwrap();
        assert!(second.starts_with("\u{1b}[2A"));
        assert!(second.contains("three"));
        assert_eq!(region.rows(), 1);

        region.commit();
        region.redraw(&mut out, &[StyledLine::styled("four", Tone::Plain)]).unwrap();
        let third = String::from_utf8(out).unwrap();
        assert!(third.starts_with("\u{1b}[1G"));
    }
}
