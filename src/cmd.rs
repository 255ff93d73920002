//! Session commands and their handlers.
//!
//! Every input line is split into words, parsed into [`Commands`] with clap and
//! dispatched by the session to one of the `cmd_*` handlers below. Handlers write
//! their output to the writer they are given and report failures as
//! [`TaskError`]s. A missing task id is not an error, only a message.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::{NaiveDate, NaiveDateTime};
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use crate::config::ReminderSettings;
use crate::error::{Result, TaskError};
use crate::fields::{Priority, Recurrence, SortKey, StatusFilter};
use crate::query::{filter, search, sort, TaskFilter};
use crate::recurrence::RecurrenceEngine;
use crate::reminders::format_reminder_banner;
use crate::store::{
    format_due, format_due_relative, parse_date, parse_due_input, split_tags, write_table, TaskStore,
    TaskUpdate,
};
use crate::task::{RecurrenceRole, Task, TaskDraft};

/// One line of session input.
#[derive(Parser, Debug)]
#[command(
    name = "todo",
    no_binary_name = true,
    disable_version_flag = true,
    color = clap::ColorChoice::Never
)]
pub struct SessionLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a one-off task.
    Add {
        /// Short title for the task.
        #[arg(required = true)]
        title: Vec<String>,
        #[command(flatten)]
        fields: TaskFields,
    },

    /// Add a recurring task: a template plus its first occurrence.
    Recur {
        /// Short title for the series.
        #[arg(required = true)]
        title: Vec<String>,
        /// Interval: daily | weekly | monthly | yearly.
        #[arg(long)]
        every: Recurrence,
        #[command(flatten)]
        fields: TaskFields,
    },

    /// List tasks with optional filters.
    List(ListArgs),

    /// Search titles, descriptions and tags.
    Search {
        #[arg(required = true)]
        keyword: Vec<String>,
    },

    /// View a single task.
    View { id: u64 },

    /// Update fields on a task.
    Update(UpdateArgs),

    /// Toggle completion. Completing a recurring task schedules its next occurrence.
    Toggle { id: u64 },

    /// Delete a task.
    Delete { id: u64 },

    /// Manage the interval of a recurrence template.
    Recurrence {
        #[command(subcommand)]
        action: RecurrenceAction,
    },

    /// Show overdue, due-today and due-soon tasks.
    Remind {
        #[arg(long)]
        json: bool,
    },

    /// List distinct tags and counts.
    Tags,

    /// End the session.
    #[command(alias = "exit")]
    Quit,
}

#[derive(Subcommand, Debug)]
pub enum RecurrenceAction {
    /// Change the interval of a template.
    Set { id: u64, interval: Recurrence },
    /// Stop recurring. The template becomes an ordinary task.
    Disable { id: u64 },
}

/// Optional fields shared by `add` and `recur`.
#[derive(Args, Debug, Clone, Default)]
pub struct TaskFields {
    /// Optional longer description.
    #[arg(long)]
    pub desc: Option<String>,
    /// Due: "YYYY-MM-DD HH:MM", YYYY-MM-DD, today, tomorrow, a weekday, or "in N[h|d|w]".
    #[arg(long)]
    pub due: Option<String>,
    /// Date-only due date, YYYY-MM-DD.
    #[arg(long, value_parser = parse_date)]
    pub due_date: Option<NaiveDate>,
    /// Priority: high | medium | low.
    #[arg(long)]
    pub priority: Option<Priority>,
    /// Comma-separated tags. May be repeated.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

impl TaskFields {
    fn into_draft(self, title: &[String], now: NaiveDateTime) -> Result<TaskDraft> {
        let mut draft = TaskDraft::new(title.join(" "));
        draft.description = self.desc.filter(|d| !d.trim().is_empty());
        draft.due_datetime = self.due.as_deref().map(|s| parse_due_input(s, now)).transpose()?;
        draft.due_date = self.due_date;
        draft.priority = self.priority.unwrap_or_default();
        draft.tags = split_tags(&self.tags);
        Ok(draft)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Filter by status.
    #[arg(long, value_enum)]
    pub status: Option<StatusFilter>,
    /// Filter by priority.
    #[arg(long)]
    pub priority: Option<Priority>,
    /// Earliest due day, YYYY-MM-DD.
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,
    /// Latest due day, YYYY-MM-DD.
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDate>,
    /// Filter by tag. May be repeated. Accepts comma-separated.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Sort key.
    #[arg(long, value_enum, default_value_t = SortKey::DuePriority)]
    pub sort: SortKey,
    /// Reverse the sort order.
    #[arg(long)]
    pub desc: bool,
    /// Include recurrence templates.
    #[arg(long)]
    pub templates: bool,
    /// Limit number of rows printed.
    #[arg(long)]
    pub limit: Option<usize>,
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct UpdateArgs {
    /// Task ID to update
    pub id: u64,
    #[arg(long)]
    pub title: Option<String>,
    /// New description. An empty string clears it.
    #[arg(long)]
    pub desc: Option<String>,
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long, value_parser = parse_date)]
    pub due_date: Option<NaiveDate>,
    /// Clear both due fields.
    #[arg(long, conflicts_with_all = ["due", "due_date"])]
    pub clear_due: bool,
    #[arg(long)]
    pub priority: Option<Priority>,
    /// Replace all tags (comma-separated).
    #[arg(long)]
    pub tags: Option<String>,
}

/// Result of parsing one session line.
#[derive(Debug)]
pub enum Parsed {
    Command(Commands),
    /// Help text requested with `help` or `--help`.
    Help(String),
}

/// Parse a session line into a command.
pub fn parse_line(line: &str) -> Result<Parsed> {
    let args = split_args(line)?;
    match SessionLine::try_parse_from(args) {
        Ok(parsed) => Ok(Parsed::Command(parsed.command)),
        Err(e) if matches!(
            e.kind(),
            ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        ) =>
        {
            Ok(Parsed::Help(e.render().to_string()))
        }
        Err(e) => {
            let rendered = e.render().to_string();
            let first = rendered.lines().next().unwrap_or_default();
            Err(TaskError::InvalidCommand(
                first.trim_start_matches("error: ").to_string(),
            ))
        }
    }
}

/// Split a line into words, honouring single and double quotes.
///
/// A quote only opens a quoted section at the start of a word, so apostrophes
/// inside words ("don't") are kept as-is.
pub fn split_args(line: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None if !in_word && (ch == '"' || ch == '\'') => {
                quote = Some(ch);
                in_word = true;
            }
            None => {
                current.push(ch);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(TaskError::InvalidCommand("unterminated quote".into()));
    }
    if in_word {
        args.push(current);
    }
    Ok(args)
}

/// Add a new one-off task.
pub fn cmd_add(
    store: &mut TaskStore,
    engine: &RecurrenceEngine,
    title: Vec<String>,
    fields: TaskFields,
    out: &mut dyn Write,
) -> Result<()> {
    let draft = fields.into_draft(&title, engine.now())?;
    let id = store.add(draft)?.id;
    writeln!(out, "Added task {id}")?;
    Ok(())
}

/// Add a recurrence template and its first occurrence.
pub fn cmd_recur(
    store: &mut TaskStore,
    engine: &RecurrenceEngine,
    title: Vec<String>,
    every: Recurrence,
    fields: TaskFields,
    out: &mut dyn Write,
) -> Result<()> {
    let draft = fields.into_draft(&title, engine.now())?;
    let (template_id, instance_id) = store.add_recurring(draft, every, engine)?;
    let due = store.get(instance_id).map(format_due).unwrap_or_else(|| "-".into());
    writeln!(
        out,
        "Added {every} template {template_id}; first occurrence is task {instance_id} (due {due})"
    )?;
    Ok(())
}

/// List tasks with optional filtering and sorting.
pub fn cmd_list(store: &TaskStore, now: NaiveDateTime, args: ListArgs, out: &mut dyn Write) -> Result<()> {
    let criteria = TaskFilter {
        status: args.status,
        priority: args.priority,
        due_from: args.from,
        due_to: args.to,
        tags: split_tags(&args.tags),
    };
    let visible: Vec<&Task> = store
        .tasks()
        .iter()
        .filter(|t| args.templates || !t.is_template())
        .collect();
    let mut rows = filter(&visible, &criteria);
    sort(&mut rows, args.sort, !args.desc);
    if let Some(n) = args.limit {
        rows.truncate(n);
    }

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
    } else if rows.is_empty() {
        writeln!(out, "No tasks.")?;
    } else {
        write_table(out, &rows, now)?;
    }
    Ok(())
}

/// Keyword search across title, description and tags.
pub fn cmd_search(store: &TaskStore, now: NaiveDateTime, keyword: Vec<String>, out: &mut dyn Write) -> Result<()> {
    let all: Vec<&Task> = store.tasks().iter().collect();
    let hits = search(&all, &keyword.join(" "));
    if hits.is_empty() {
        writeln!(out, "No matching tasks.")?;
    } else {
        write_table(out, &hits, now)?;
    }
    Ok(())
}

/// View detailed information about a specific task.
pub fn cmd_view(store: &TaskStore, now: NaiveDateTime, id: u64, out: &mut dyn Write) -> Result<()> {
    let Some(task) = store.get(id) else {
        writeln!(out, "Task {id} not found.")?;
        return Ok(());
    };
    let role = match task.recurrence {
        None => "-".to_string(),
        Some(RecurrenceRole::TemplateDefinition { interval }) => format!("{interval} template"),
        Some(RecurrenceRole::ScheduledInstance { interval, template_id: Some(tid) }) => {
            if store.get(tid).is_some_and(Task::is_template) {
                format!("{interval}, from template {tid}")
            } else {
                format!("{interval}, follows task {tid}")
            }
        }
        Some(RecurrenceRole::ScheduledInstance { interval, template_id: None }) => {
            format!("{interval}, self-defined")
        }
    };
    writeln!(out, "ID:           {}", task.id)?;
    writeln!(out, "Title:        {}", task.title)?;
    writeln!(out, "Status:       {}", if task.completed { "done" } else { "pending" })?;
    writeln!(out, "Priority:     {}", task.priority)?;
    match task.due_day() {
        Some(day) => writeln!(
            out,
            "Due:          {} ({})",
            format_due(task),
            format_due_relative(Some(day), now.date())
        )?,
        None => writeln!(out, "Due:          -")?,
    }
    writeln!(out, "Recurrence:   {role}")?;
    writeln!(
        out,
        "Tags:         {}",
        if task.tags.is_empty() { "-".into() } else { task.tags.join(",") }
    )?;
    writeln!(out, "Description:\n{}", task.description.as_deref().unwrap_or("-"))?;
    Ok(())
}

/// Update an existing task's fields.
pub fn cmd_update(store: &mut TaskStore, now: NaiveDateTime, args: UpdateArgs, out: &mut dyn Write) -> Result<()> {
    let due_datetime = if args.clear_due {
        Some(None)
    } else {
        args.due.as_deref().map(|s| parse_due_input(s, now)).transpose()?.map(Some)
    };
    let due_date = if args.clear_due {
        Some(None)
    } else {
        args.due_date.map(Some)
    };
    let update = TaskUpdate {
        title: args.title,
        description: args
            .desc
            .map(|d| if d.trim().is_empty() { None } else { Some(d) }),
        due_date,
        due_datetime,
        priority: args.priority,
        tags: args.tags.map(|t| split_tags(&[t])),
    };
    if update.is_empty() {
        return Err(TaskError::InvalidCommand("nothing to update".into()));
    }

    if store.update(args.id, update)? {
        writeln!(out, "Updated task {}", args.id)?;
    } else {
        writeln!(out, "Task {} not found.", args.id)?;
    }
    Ok(())
}

/// Flip completion; report the next occurrence when one is scheduled.
pub fn cmd_toggle(store: &mut TaskStore, engine: &RecurrenceEngine, id: u64, out: &mut dyn Write) -> Result<()> {
    let Some(toggle) = store.toggle_completion(id, engine)? else {
        writeln!(out, "Task {id} not found.")?;
        return Ok(());
    };
    if toggle.completed {
        writeln!(out, "Completed task {id}")?;
    } else {
        writeln!(out, "Reopened task {id}")?;
    }
    if let Some(next) = toggle.spawned.and_then(|sid| store.get(sid)) {
        writeln!(out, "Next occurrence: task {} due {}", next.id, format_due(next))?;
    }
    Ok(())
}

/// Delete a task by ID.
pub fn cmd_delete(store: &mut TaskStore, id: u64, out: &mut dyn Write) -> Result<()> {
    if store.delete(id) {
        writeln!(out, "Deleted task {id}")?;
    } else {
        writeln!(out, "Task {id} not found.")?;
    }
    Ok(())
}

/// Change or disable the interval of a recurrence template.
pub fn cmd_recurrence(
    store: &mut TaskStore,
    engine: &RecurrenceEngine,
    action: RecurrenceAction,
    out: &mut dyn Write,
) -> Result<()> {
    let (id, interval) = match action {
        RecurrenceAction::Set { id, interval } => (id, Some(interval)),
        RecurrenceAction::Disable { id } => (id, None),
    };
    if !store.set_recurrence(id, interval, engine)? {
        writeln!(out, "Task {id} not found.")?;
        return Ok(());
    }
    match interval {
        Some(interval) => writeln!(out, "Task {id} now recurs {interval}")?,
        None => writeln!(out, "Task {id} no longer recurs")?,
    }
    Ok(())
}

/// Print the reminder report for `now`.
pub fn cmd_remind(
    store: &TaskStore,
    settings: &ReminderSettings,
    now: NaiveDateTime,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let report = settings.policy(now)?.build_report(store.tasks());
    if json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }
    if report.is_empty() {
        writeln!(out, "No reminders.")?;
        return Ok(());
    }

    writeln!(out, "{}", format_reminder_banner(&report))?;
    let sections = [
        ("Overdue", &report.overdue),
        ("Due today", &report.due_today),
        ("Due soon", &report.due_soon),
    ];
    for (label, tasks) in sections {
        if tasks.is_empty() {
            continue;
        }
        writeln!(out, "{label}:")?;
        for t in tasks {
            writeln!(out, "  {:<4} {} ({})", t.id, t.title, format_due(t))?;
        }
    }
    Ok(())
}

/// List all distinct tags with their usage counts.
pub fn cmd_tags(store: &TaskStore, out: &mut dyn Write) -> Result<()> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for t in store.tasks() {
        for tag in &t.tags {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }
    if counts.is_empty() {
        writeln!(out, "No tags.")?;
        return Ok(());
    }
    writeln!(out, "{:<16} Count", "Tag")?;
    for (tag, c) in counts {
        writeln!(out, "{tag:<16} {c}")?;
    }
    Ok(())
}

/// Generate shell completion scripts for the `todo` binary.
pub fn cmd_completions(shell: Shell, out: &mut dyn Write) {
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn command(line: &str) -> Commands {
        match parse_line(line).unwrap() {
            Parsed::Command(c) => c,
            Parsed::Help(h) => panic!("unexpected help: {h}"),
        }
    }

    fn output(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_split_args_handles_quotes() {
        assert_eq!(
            split_args(r#"add "Pay rent" --due '2024-04-01 09:00'"#).unwrap(),
            vec!["add", "Pay rent", "--due", "2024-04-01 09:00"]
        );
        assert_eq!(split_args("  add   don't  forget ").unwrap(), vec!["add", "don't", "forget"]);
        assert_eq!(split_args(r#"update 1 --desc """#).unwrap(), vec!["update", "1", "--desc", ""]);
        assert!(split_args(r#"add "open"#).is_err());
    }

    #[test]
    fn test_parse_add_with_fields() {
        let Commands::Add { title, fields } =
            command("add Buy milk --priority high --tag home,errand --tag home --due tomorrow")
        else {
            panic!("expected add");
        };
        assert_eq!(title, vec!["Buy", "milk"]);
        assert_eq!(fields.priority, Some(Priority::High));
        let draft = fields.into_draft(&title, now()).unwrap();
        assert_eq!(draft.title, "Buy milk");
        assert_eq!(draft.tags, vec!["home", "errand"]);
        assert_eq!(
            draft.due_datetime,
            NaiveDate::from_ymd_opt(2024, 3, 16).unwrap().and_hms_opt(23, 59, 0)
        );
    }

    #[test]
    fn test_parse_errors_and_help() {
        assert!(matches!(parse_line("frobnicate"), Err(TaskError::InvalidCommand(_))));
        assert!(matches!(parse_line("add x --priority urgent"), Err(TaskError::InvalidCommand(_))));
        assert!(matches!(parse_line("recur x --every fortnightly"), Err(TaskError::InvalidCommand(_))));
        assert!(matches!(parse_line("help"), Ok(Parsed::Help(h)) if h.contains("recur")));
        assert!(matches!(command("exit"), Commands::Quit));
    }

    #[test]
    fn test_add_then_list_and_view() {
        let mut store = TaskStore::new();
        let engine = RecurrenceEngine::at(now());
        let Commands::Add { title, fields } = command("add 'Write report' --due today --tag work") else {
            panic!("expected add");
        };
        let text = output(|out| cmd_add(&mut store, &engine, title, fields, out));
        assert_eq!(text, "Added task 1\n");

        let text = output(|out| cmd_list(&store, now(), ListArgs::default(), out));
        assert!(text.contains("Write report [work]"));
        assert!(text.contains("today"));

        let text = output(|out| cmd_view(&store, now(), 1, out));
        assert!(text.contains("Title:        Write report"));
        assert!(text.contains("Due:          2024-03-15 23:59 (today)"));

        let text = output(|out| cmd_view(&store, now(), 9, out));
        assert_eq!(text, "Task 9 not found.\n");
    }

    #[test]
    fn test_list_hides_templates_unless_asked() {
        let mut store = TaskStore::new();
        let engine = RecurrenceEngine::at(now());
        store.add_recurring(TaskDraft::new("Rent"), Recurrence::Monthly, &engine).unwrap();

        let text = output(|out| cmd_list(&store, now(), ListArgs { json: true, ..ListArgs::default() }, out));
        let rows: Vec<Task> = serde_json::from_str(&text).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_template());

        let args = ListArgs { json: true, templates: true, ..ListArgs::default() };
        let text = output(|out| cmd_list(&store, now(), args, out));
        let rows: Vec<Task> = serde_json::from_str(&text).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_update_requires_a_change() {
        let mut store = TaskStore::new();
        store.add(TaskDraft::new("a")).unwrap();
        let Commands::Update(args) = command("update 1") else {
            panic!("expected update");
        };
        let mut buf = Vec::new();
        assert!(matches!(
            cmd_update(&mut store, now(), args, &mut buf),
            Err(TaskError::InvalidCommand(_))
        ));

        let Commands::Update(args) = command("update 1 --tags x,y --due-date 2024-03-20") else {
            panic!("expected update");
        };
        let text = output(|out| cmd_update(&mut store, now(), args, out));
        assert_eq!(text, "Updated task 1\n");
        let task = store.get(1).unwrap();
        assert_eq!(task.tags, vec!["x", "y"]);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 3, 20));
    }

    #[test]
    fn test_toggle_reports_next_occurrence() {
        let mut store = TaskStore::new();
        let engine = RecurrenceEngine::at(now());
        let Commands::Recur { title, every, fields } = command("recur Standup --every daily --due '2024-03-15 09:00'")
        else {
            panic!("expected recur");
        };
        let text = output(|out| cmd_recur(&mut store, &engine, title, every, fields, out));
        assert!(text.contains("daily template 1; first occurrence is task 2 (due 2024-03-15 09:00)"));

        let text = output(|out| cmd_toggle(&mut store, &engine, 2, out));
        assert_eq!(text, "Completed task 2\nNext occurrence: task 3 due 2024-03-16 09:00\n");

        let mut buf = Vec::new();
        assert!(matches!(
            cmd_toggle(&mut store, &engine, 1, &mut buf),
            Err(TaskError::TemplateCompletion { id: 1 })
        ));
    }

    #[test]
    fn test_remind_sections() {
        let mut store = TaskStore::new();
        let mut late = TaskDraft::new("Late");
        late.due_datetime = now().checked_sub_signed(chrono::Duration::hours(3));
        store.add(late).unwrap();
        let mut soon = TaskDraft::new("Soon");
        soon.due_datetime = now().checked_add_signed(chrono::Duration::hours(1));
        store.add(soon).unwrap();

        let text = output(|out| cmd_remind(&store, &ReminderSettings::default(), now(), false, out));
        assert!(text.starts_with("⚠️ REMINDERS: 1 OVERDUE | 1 DUE TODAY | 1 DUE SOON\n"));
        assert!(text.contains("Overdue:\n  1    Late"));
        assert!(text.contains("Due soon:\n  2    Soon"));

        let empty = TaskStore::new();
        let text = output(|out| cmd_remind(&empty, &ReminderSettings::default(), now(), false, out));
        assert_eq!(text, "No reminders.\n");
    }

    #[test]
    fn test_tags_counts() {
        let mut store = TaskStore::new();
        let mut a = TaskDraft::new("a");
        a.tags = vec!["work".into(), "home".into()];
        store.add(a).unwrap();
        let mut b = TaskDraft::new("b");
        b.tags = vec!["work".into()];
        store.add(b).unwrap();
        let text = output(|out| cmd_tags(&store, out));
        assert!(text.contains("home             1"));
        assert!(text.contains("work             2"));
    }
}
