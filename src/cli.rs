use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Interactive task tracker with recurring tasks and due-date reminders.
/// Tasks live for the length of one session; nothing is written to disk.
#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "Task tracker with recurring tasks and reminders")]
pub struct Cli {
    /// Path to a TOML config file. Defaults to ~/.todo/config.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Pin the session clock, "YYYY-MM-DD HH:MM". Uses local time otherwise.
    #[arg(long, global = true, value_parser = parse_now)]
    pub now: Option<NaiveDateTime>,

    /// Log debug events to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub entry: Option<Entry>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Read commands from stdin (the default).
    Session,

    /// Run the commands in a script file, one per line.
    Run {
        /// Script to execute.
        script: PathBuf,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_now(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M")
        .map_err(|e| format!("expected YYYY-MM-DD HH:MM ({e})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_defaults_to_session() {
        let cli = Cli::try_parse_from(["todo"]).unwrap();
        assert_eq!(cli.entry, None);
        assert!(!cli.verbose);
        assert!(cli.now.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["todo", "run", "plan.txt", "--now", "2024-03-15 09:30", "-v"]).unwrap();
        assert_eq!(cli.entry, Some(Entry::Run { script: PathBuf::from("plan.txt") }));
        assert!(cli.verbose);
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(9, 30, 0).unwrap();
        assert_eq!(cli.now, Some(expected));
    }

    #[test]
    fn test_bad_now_is_rejected() {
        assert!(Cli::try_parse_from(["todo", "--now", "noon"]).is_err());
    }
}
