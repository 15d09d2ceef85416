use anyhow::Result;

use court_slots::cli::Command;
use court_slots::{handle_fetch, handle_resolve, handle_serve, handle_show, interpret};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Fetch { sport } => handle_fetch(*sport),
        Command::Show { sport, venue } => handle_show(*sport, venue.as_deref()),
        Command::Resolve {
            text,
            debug,
            threshold,
        } => handle_resolve(text, *debug, *threshold),
        Command::Serve { port } => handle_serve(*port),
    }
}
