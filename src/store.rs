//! In-memory task store and utility functions for task management.
//!
//! This module provides the `TaskStore` struct that owns every task and allocates
//! ids, along with helpers for tag splitting, due date parsing, formatting and
//! table output used by the session commands.

use std::io::{self, Write};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{Result, TaskError};
use crate::fields::{Priority, Recurrence};
use crate::recurrence::RecurrenceEngine;
use crate::task::{dedupe_tags, validate_title, RecurrenceRole, Task, TaskDraft, END_OF_DAY};

/// Authoritative, in-memory collection of tasks.
#[derive(Debug)]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: u64,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Field changes applied by [`TaskStore::update`].
///
/// `None` leaves a field untouched. For optional fields, `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub due_datetime: Option<Option<NaiveDateTime>>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self == &TaskUpdate::default()
    }
}

/// Outcome of toggling a task's completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggle {
    pub id: u64,
    pub completed: bool,
    /// Id of the next occurrence spawned by completing a recurring instance.
    pub spawned: Option<u64>,
}

impl TaskStore {
    /// Create an empty store. The first task gets id 1.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// Id the next added task will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Validate a draft, give it the next id and store it.
    pub fn add(&mut self, draft: TaskDraft) -> Result<&Task> {
        let task = draft.into_task(self.next_id)?;
        self.next_id += 1;
        debug!(task_id = task.id, title = %task.title, "task added");
        self.tasks.push(task);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Store a task whose id was assigned elsewhere.
    ///
    /// Later ids are allocated past it so they never collide.
    pub fn insert(&mut self, task: Task) -> Result<&Task> {
        if self.get(task.id).is_some() {
            return Err(TaskError::DuplicateId(task.id));
        }
        validate_title(&task.title)?;
        self.next_id = self.next_id.max(task.id + 1);
        debug!(task_id = task.id, "task inserted");
        self.tasks.push(task);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Create a recurrence template from `draft` plus its first occurrence.
    ///
    /// Returns `(template_id, instance_id)`.
    pub fn add_recurring(
        &mut self,
        mut draft: TaskDraft,
        interval: Recurrence,
        engine: &RecurrenceEngine,
    ) -> Result<(u64, u64)> {
        draft.completed = false;
        draft.recurrence = Some(RecurrenceRole::TemplateDefinition { interval });
        let template = self.add(draft)?;
        let template_id = template.id;
        let first = engine.first_instance(template)?;
        let instance_id = self.add(first)?.id;
        Ok((template_id, instance_id))
    }

    /// Apply `update` to task `id`.
    ///
    /// Returns `Ok(false)` when there is no such task. Every field is validated
    /// before any is written, so a failed update leaves the task unchanged.
    pub fn update(&mut self, id: u64, update: TaskUpdate) -> Result<bool> {
        let title = update.title.as_deref().map(validate_title).transpose()?;
        let Some(task) = self.get_mut(id) else {
            return Ok(false);
        };

        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = due_date;
        }
        if let Some(due_datetime) = update.due_datetime {
            task.due_datetime = due_datetime;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(tags) = update.tags {
            task.tags = dedupe_tags(tags);
        }
        debug!(task_id = id, "task updated");
        Ok(true)
    }

    /// Remove task `id`. Occurrences of a removed template keep running as
    /// self-defining series.
    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return false;
        }
        for t in self.tasks.iter_mut() {
            if let Some(RecurrenceRole::ScheduledInstance { template_id, .. }) = &mut t.recurrence {
                if *template_id == Some(id) {
                    *template_id = None;
                }
            }
        }
        debug!(task_id = id, "task deleted");
        true
    }

    /// Flip the completion flag of task `id`.
    ///
    /// Completing a recurring occurrence stores its successor, under an id no
    /// lower than [`TaskStore::next_id`] so ids of deleted tasks stay retired.
    /// Templates cannot be toggled. Returns `Ok(None)` when there is no such task.
    pub fn toggle_completion(&mut self, id: u64, engine: &RecurrenceEngine) -> Result<Option<Toggle>> {
        let Some(task) = self.get(id) else {
            return Ok(None);
        };
        if task.is_template() {
            return Err(TaskError::TemplateCompletion { id });
        }
        let completing = !task.completed;
        let successor = if completing {
            engine.handle_completion(task, &self.tasks)?
        } else {
            None
        };

        let spawned = match successor {
            Some(mut next) => {
                next.id = next.id.max(self.next_id);
                Some(self.insert(next)?.id)
            }
            None => None,
        };
        let Some(task) = self.get_mut(id) else {
            return Ok(None);
        };
        task.completed = completing;
        Ok(Some(Toggle {
            id,
            completed: completing,
            spawned,
        }))
    }

    /// Change or clear the interval of template `id`.
    ///
    /// Returns `Ok(false)` when there is no such task.
    pub fn set_recurrence(
        &mut self,
        id: u64,
        interval: Option<Recurrence>,
        engine: &RecurrenceEngine,
    ) -> Result<bool> {
        let Some(task) = self.get_mut(id) else {
            return Ok(false);
        };
        engine.update_recurrence(task, interval)?;
        Ok(true)
    }
}

/// Split comma-separated tag strings, trimming and de-duplicating in order.
pub fn split_tags(inputs: &[String]) -> Vec<String> {
    dedupe_tags(inputs.iter().flat_map(|raw| raw.split(',')))
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| TaskError::InvalidDateTime(s.to_string()))
}

/// Parse human-readable due input relative to `now`.
///
/// Supports:
/// - "YYYY-MM-DD HH:MM"
/// - "YYYY-MM-DD" (end of that day, 23:59)
/// - "today", "tomorrow" (23:59)
/// - "in 3h", "in 2d", "in 1w" (from now)
/// - "monday", "next friday", ... (23:59)
pub fn parse_due_input(s: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let input = s.trim().to_lowercase();
    let today = now.date();
    let invalid = || TaskError::InvalidDateTime(s.to_string());

    match input.as_str() {
        "today" => return Ok(today.and_time(END_OF_DAY)),
        "tomorrow" => return Ok((today + Duration::days(1)).and_time(END_OF_DAY)),
        _ => {}
    }

    if let Some(rest) = input.strip_prefix("in ") {
        let rest = rest.trim();
        let (amount, step): (&str, fn(i64) -> Option<Duration>) = if let Some(n) = rest.strip_suffix('h') {
            (n, Duration::try_hours)
        } else if let Some(n) = rest.strip_suffix('d') {
            (n, Duration::try_days)
        } else if let Some(n) = rest.strip_suffix('w') {
            (n, Duration::try_weeks)
        } else {
            return Err(invalid());
        };
        let amount: i64 = amount.trim().parse().map_err(|_| invalid())?;
        return step(amount)
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or_else(invalid);
    }

    let weekdays = [
        ("monday", 0i64), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let (name, skip_week) = match input.strip_prefix("next ") {
        Some(name) => (name, true),
        None => (input.strip_prefix("this ").unwrap_or(&input), false),
    };
    if let Some(&(_, target)) = weekdays.iter().find(|(day, _)| *day == name) {
        let current = today.weekday().num_days_from_monday() as i64;
        let mut ahead = (target + 7 - current) % 7;
        if skip_week {
            ahead += 7;
        }
        return Ok((today + Duration::days(ahead)).and_time(END_OF_DAY));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(&input, "%Y-%m-%d %H:%M") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(&input, "%Y-%m-%d")
        .map(|d| d.and_time(END_OF_DAY))
        .map_err(|_| invalid())
}

/// Format a due day relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            if delta == 0 {
                "today".into()
            } else if delta == 1 {
                "tomorrow".into()
            } else if delta > 1 {
                format!("in {delta}d")
            } else {
                format!("{}d late", -delta)
            }
        }
    }
}

/// Absolute due display: date and time when known, date alone for legacy dates.
pub fn format_due(task: &Task) -> String {
    match (task.due_datetime, task.due_date) {
        (Some(dt), _) => dt.format("%Y-%m-%d %H:%M").to_string(),
        (None, Some(d)) => d.format("%Y-%m-%d").to_string(),
        (None, None) => "-".into(),
    }
}

/// Short label for a task's recurrence role.
pub fn format_role(task: &Task) -> String {
    match task.recurrence {
        None => "-".into(),
        Some(RecurrenceRole::TemplateDefinition { interval }) => format!("{interval}*"),
        Some(RecurrenceRole::ScheduledInstance { interval, .. }) => interval.to_string(),
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Write tasks as a table. Templates are marked with `*` after their interval.
pub fn write_table(out: &mut dyn Write, tasks: &[&Task], now: NaiveDateTime) -> io::Result<()> {
    writeln!(
        out,
        "{:<5} {:<4} {:<6} {:<16} {:<9} {:<8} {}",
        "ID", "Done", "Pri", "Due", "When", "Recur", "Title [tags]"
    )?;
    for t in tasks {
        let tags = if t.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags.join(","))
        };
        writeln!(
            out,
            "{:<5} {:<4} {:<6} {:<16} {:<9} {:<8} {}{}",
            t.id,
            if t.completed { "x" } else { " " },
            t.priority,
            format_due(t),
            format_due_relative(t.due_day(), now.date()),
            format_role(t),
            truncate(&t.title, 48),
            tags
        )?;
    }
    Ok(())
}
