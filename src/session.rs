//! Line-oriented interactive session.
//!
//! A [`Session`] owns the task store for its lifetime and reads one command per
//! line. Blank lines and `#` comments are skipped. A failing command prints
//! `Error: ...` and the session carries on with the next line.

use std::io::{BufRead, IsTerminal, Write};

use chrono::{Local, NaiveDateTime};
use crossterm::style::Stylize;
use tracing::debug;

use crate::cmd::{
    cmd_add, cmd_delete, cmd_list, cmd_recur, cmd_recurrence, cmd_remind, cmd_search, cmd_tags,
    cmd_toggle, cmd_update, cmd_view, parse_line, Commands, Parsed,
};
use crate::config::Config;
use crate::error::Result;
use crate::recurrence::RecurrenceEngine;
use crate::reminders::format_reminder_banner;
use crate::store::TaskStore;

/// Source of "now" for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    /// Local wall-clock time, read for every command.
    System,
    /// A pinned instant.
    Fixed(NaiveDateTime),
}

impl Clock {
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::System => Local::now().naive_local(),
            Clock::Fixed(at) => *at,
        }
    }
}

/// Whether the session should keep reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    store: TaskStore,
    config: Config,
    clock: Clock,
    color: bool,
    prompt: bool,
}

impl Session {
    /// New session with an empty store. Colour follows `display.color`, and only
    /// applies when stdout is a terminal.
    pub fn new(config: Config, clock: Clock) -> Self {
        let color = config.display.color && std::io::stdout().is_terminal();
        Self {
            store: TaskStore::new(),
            config,
            clock,
            color,
            prompt: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Print a `todo> ` prompt before each line.
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run until `quit`/`exit` or end of input.
    pub fn run<R: BufRead>(&mut self, mut input: R, out: &mut dyn Write) -> Result<()> {
        if self.config.reminders.show_on_startup {
            self.write_banner(out)?;
        }

        let mut line = String::new();
        loop {
            if self.prompt {
                write!(out, "todo> ")?;
                out.flush()?;
            }
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match self.execute_line(trimmed, out) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    debug!(line = trimmed, error = %e, "command failed");
                    writeln!(out, "Error: {e}")?;
                }
            }
        }
        debug!(tasks = self.store.len(), "session ended");
        Ok(())
    }

    /// Parse and execute a single command line.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> Result<Flow> {
        match parse_line(line)? {
            Parsed::Help(text) => {
                write!(out, "{text}")?;
                Ok(Flow::Continue)
            }
            Parsed::Command(command) => self.dispatch(command, out),
        }
    }

    fn dispatch(&mut self, command: Commands, out: &mut dyn Write) -> Result<Flow> {
        let now = self.clock.now();
        let engine = RecurrenceEngine::at(now);
        match command {
            Commands::Add { title, fields } => cmd_add(&mut self.store, &engine, title, fields, out)?,
            Commands::Recur { title, every, fields } => {
                cmd_recur(&mut self.store, &engine, title, every, fields, out)?
            }
            Commands::List(args) => cmd_list(&self.store, now, args, out)?,
            Commands::Search { keyword } => cmd_search(&self.store, now, keyword, out)?,
            Commands::View { id } => cmd_view(&self.store, now, id, out)?,
            Commands::Update(args) => cmd_update(&mut self.store, now, args, out)?,
            Commands::Toggle { id } => cmd_toggle(&mut self.store, &engine, id, out)?,
            Commands::Delete { id } => cmd_delete(&mut self.store, id, out)?,
            Commands::Recurrence { action } => cmd_recurrence(&mut self.store, &engine, action, out)?,
            Commands::Remind { json } => cmd_remind(&self.store, &self.config.reminders, now, json, out)?,
            Commands::Tags => cmd_tags(&self.store, out)?,
            Commands::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Write the one-line reminder banner, if anything needs attention.
    pub fn write_banner(&self, out: &mut dyn Write) -> Result<()> {
        let report = self
            .config
            .reminders
            .policy(self.clock.now())?
            .build_report(self.store.tasks());
        let banner = format_reminder_banner(&report);
        if banner.is_empty() {
            return Ok(());
        }
        if !self.color {
            writeln!(out, "{banner}")?;
        } else if report.overdue_count() > 0 {
            writeln!(out, "{}", banner.red().bold())?;
        } else {
            writeln!(out, "{}", banner.yellow())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn session() -> Session {
        let at = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(12, 0, 0).unwrap();
        Session::new(Config::default(), Clock::Fixed(at)).with_color(false)
    }

    fn run(session: &mut Session, script: &str) -> String {
        let mut out = Vec::new();
        session.run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_skips_blank_and_comment_lines() {
        let mut s = session();
        let text = run(&mut s, "\n# a comment\n   \nadd Buy milk\n");
        assert_eq!(text, "Added task 1\n");
        assert_eq!(s.store().len(), 1);
    }

    #[test]
    fn test_errors_do_not_stop_the_session() {
        let mut s = session();
        let text = run(&mut s, "add '   '\nbogus\nadd Real task\n");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Error: task title cannot be empty");
        assert!(lines[1].starts_with("Error: "));
        assert_eq!(lines[2], "Added task 1");
    }

    #[test]
    fn test_quit_stops_reading() {
        let mut s = session();
        let text = run(&mut s, "add a\nquit\nadd b\n");
        assert_eq!(text, "Added task 1\n");
        assert_eq!(s.store().len(), 1);
    }

    #[test]
    fn test_banner_respects_startup_setting() {
        let mut s = session();
        run(&mut s, "add Late --due '2024-03-15 08:00'\n");
        let mut out = Vec::new();
        s.write_banner(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "⚠️ REMINDERS: 1 OVERDUE\n");

        let mut quiet = Config::default();
        quiet.reminders.show_on_startup = false;
        let mut s = Session::new(quiet, Clock::Fixed(s.clock.now())).with_color(false);
        assert_eq!(run(&mut s, ""), "");
    }

    #[test]
    fn test_fixed_clock_is_stable() {
        let at = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(Clock::Fixed(at).now(), at);
    }
}
