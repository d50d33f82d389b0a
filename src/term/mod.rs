//! Raw terminal control. Everything that writes escape sequences or touches
//! terminal modes lives here; the rest of the app issues logical requests.

mod canvas;

pub use canvas::{Canvas, PaintStyle, TermCanvas};

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType, SetTitle, disable_raw_mode, enable_raw_mode};

/// Current terminal size as (columns, rows).
pub fn size() -> io::Result<(u16, u16)> {
    terminal::size()
}

pub fn clear_screen() -> io::Result<()> {
    execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))
}

pub fn set_title(title: &str) -> io::Result<()> {
    execute!(io::stdout(), SetTitle(title))
}

/// Enter single-key input mode: raw terminal, hidden cursor.
pub fn enter_key_mode() -> io::Result<()> {
    enable_raw_mode()?;
    execute!(io::stdout(), Hide)
}

/// Back to line-buffered input with a visible cursor, for prompts and for
/// letting the task binary write directly to the terminal.
pub fn leave_key_mode() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), Show)
}

/// Restore the terminal even when the app dies mid-frame.
pub fn install_panic_hook() {
    let original = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), Show);
        original(info);
    }));
}

/// Block until one key press arrives and return it.
pub fn read_key() -> io::Result<event::KeyEvent> {
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(key);
            }
        }
    }
}

/// Print `message` and block until any key is pressed.
pub fn wait(message: &str) -> io::Result<()> {
    let mut out = io::stdout();
    write!(out, "{message}\r\n")?;
    out.flush()?;
    // transient raw read so the key itself does not echo
    let was_raw = terminal::is_raw_mode_enabled()?;
    if !was_raw {
        enable_raw_mode()?;
    }
    let result = read_key();
    if !was_raw {
        disable_raw_mode()?;
    }
    result.map(|_| ())
}

/// Print `message` and read one line of input. The trailing newline is
/// stripped. Callers must be in line-buffered mode.
pub fn prompt(message: &str) -> io::Result<String> {
    let mut out = io::stdout();
    write!(out, "{message}")?;
    out.flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}
