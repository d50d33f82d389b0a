use std::io::IsTerminal;

use clap::Parser;
use taskdeck::cli::{self, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Cal) => {
            if let Err(e) = print_calendar() {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            if !std::io::stdout().is_terminal() {
                // The UI needs a terminal; spawn one around ourselves.
                if let Err(e) = cli::reexec_in_terminal() {
                    eprintln!("error: {}", e);
                    std::process::exit(1);
                }
                return;
            }
            if let Err(e) = run_ui(&cli) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_ui(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let log_file = cli
        .log_file
        .clone()
        .or_else(taskdeck::logging::default_log_file);
    if let Some(log_file) = log_file {
        taskdeck::logging::init(&log_file)?;
    }

    let keys = taskdeck::config::load()?;
    taskdeck::ui::launch(cli, &keys)?;
    Ok(())
}

fn print_calendar() -> Result<(), Box<dyn std::error::Error>> {
    let (cols, _) = taskdeck::term::size().unwrap_or((80, 24));
    let today = chrono::Local::now().date_naive();
    let view = taskdeck::calendar::CalendarView::new(taskdeck::calendar::Events::new());
    view.render(&mut std::io::stdout(), cols as usize, today)?;
    Ok(())
}
