use std::fs::File;
use std::io::{self, BufReader, IsTerminal};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use todo_tracker::cli::{Cli, Entry};
use todo_tracker::cmd::cmd_completions;
use todo_tracker::config::Config;
use todo_tracker::session::{Clock, Session};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Completions need neither config nor a session.
    let entry = cli.entry.unwrap_or(Entry::Session);
    if let Entry::Completions { shell } = entry {
        cmd_completions(shell, &mut io::stdout());
        return;
    }

    let config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    let clock = cli.now.map_or(Clock::System, Clock::Fixed);
    let mut stdout = io::stdout();

    let result = match entry {
        Entry::Run { script } => {
            let file = File::open(&script).unwrap_or_else(|e| {
                eprintln!("Failed to open {}: {e}", script.display());
                std::process::exit(1);
            });
            Session::new(config, clock).run(BufReader::new(file), &mut stdout)
        }
        _ => {
            let stdin = io::stdin();
            let interactive = stdin.is_terminal();
            Session::new(config, clock)
                .with_prompt(interactive)
                .run(stdin.lock(), &mut stdout)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so they never mix with session output.
fn init_tracing(verbose: bool) {
    let default = if verbose { "todo_tracker=debug" } else { "todo_tracker=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
