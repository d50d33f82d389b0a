use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};

/// Highlight applied to a painted line. The viewer picks the style; how it
/// turns into escape sequences is this module's concern alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintStyle {
    Plain,
    /// The active line.
    Cursor,
    /// The active line while it is also in the selection set.
    CursorSelected,
    /// A selected, non-active line.
    Selected,
}

/// Receiver of positioned paint requests.
pub trait Canvas {
    /// Paint `text` with `style` starting at screen cell `(col, row)`,
    /// 0-indexed. Styled text must reset the style at end of line.
    fn put(&mut self, col: u16, row: u16, text: &str, style: PaintStyle) -> io::Result<()>;

    /// Push queued output to the terminal.
    fn flush(&mut self) -> io::Result<()>;
}

/// Canvas writing crossterm escape sequences to a `Write` sink.
pub struct TermCanvas<W: Write> {
    out: W,
}

impl TermCanvas<io::Stdout> {
    pub fn stdout() -> Self {
        TermCanvas { out: io::stdout() }
    }
}

impl<W: Write> TermCanvas<W> {
    pub fn new(out: W) -> Self {
        TermCanvas { out }
    }
}

impl<W: Write> Canvas for TermCanvas<W> {
    fn put(&mut self, col: u16, row: u16, text: &str, style: PaintStyle) -> io::Result<()> {
        queue!(self.out, MoveTo(col, row))?;
        match style {
            PaintStyle::Plain => queue!(self.out, Print(text))?,
            PaintStyle::Cursor => queue!(
                self.out,
                SetBackgroundColor(Color::DarkBlue),
                Print(text),
                ResetColor
            )?,
            PaintStyle::CursorSelected => queue!(
                self.out,
                SetBackgroundColor(Color::Blue),
                Print(text),
                ResetColor
            )?,
            PaintStyle::Selected => queue!(
                self.out,
                SetForegroundColor(Color::Black),
                SetBackgroundColor(Color::White),
                Print(text),
                ResetColor
            )?,
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styled_output_resets_at_end_of_line() {
        let mut buf = Vec::new();
        {
            let mut canvas = TermCanvas::new(&mut buf);
            canvas.put(2, 1, "hi", PaintStyle::Cursor).unwrap();
            canvas.flush().unwrap();
        }
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("hi"));
        // move to row 2, col 3 in 1-indexed ANSI coordinates
        assert!(out.contains("\u{1b}[2;3H"));
        assert!(out.ends_with("\u{1b}[0m"));
    }

    #[test]
    fn plain_output_carries_no_color_sequences() {
        let mut buf = Vec::new();
        {
            let mut canvas = TermCanvas::new(&mut buf);
            canvas.put(0, 0, "text", PaintStyle::Plain).unwrap();
            canvas.flush().unwrap();
        }
        let out = String::from_utf8(buf).unwrap();
        assert!(!out.contains("\u{1b}[0m"));
    }
}
