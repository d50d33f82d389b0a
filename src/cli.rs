use std::io;
use std::path::PathBuf;
use std::process::Command;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "td", version, about = "Interactive terminal frontend for Taskwarrior")]
pub struct Cli {
    /// Override the TASKDATA environment variable
    #[arg(long)]
    pub task_data: Option<String>,

    /// Initial report
    #[arg(short, long)]
    pub report: Option<String>,

    /// Initial filter, space separated
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Initial context
    #[arg(short, long)]
    pub context: Option<String>,

    /// Log file path (defaults to the XDG state directory)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print this month's calendar and exit
    Cal,
}

impl Cli {
    /// The initial filter as individual terms.
    pub fn filter_terms(&self) -> Option<Vec<String>> {
        self.filter
            .as_ref()
            .map(|f| f.split(' ').map(str::to_owned).collect())
    }
}

/// Re-run the same invocation inside `$TERMINAL`. Used when stdout is not a
/// terminal: the UI needs one, so spawn an emulator around ourselves.
pub fn reexec_in_terminal() -> io::Result<()> {
    let terminal = std::env::var("TERMINAL").unwrap_or_else(|_| "termite".to_owned());
    let argv: Vec<String> = std::env::args()
        .map(|arg| arg.replace(' ', "\\ "))
        .collect();
    Command::new(terminal)
        .arg("-e")
        .arg(argv.join(" "))
        .status()?;
    Ok(())
}
