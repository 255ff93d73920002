//! Task data structure and related functionality.
//!
//! This module defines the core `Task` struct, the id-less `TaskDraft` used to
//! create tasks, and `RecurrenceRole`, which tags a task as a recurrence template
//! or as a scheduled occurrence of one.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskError};
use crate::fields::{Priority, Recurrence};

/// Time of day given to due dates entered without a time.
pub const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 0) {
    Some(t) => t,
    None => panic!("23:59 is a valid time"),
};

/// The part a task plays in a recurring series.
///
/// Ordinary tasks carry no role at all (`Task::recurrence` is `None`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RecurrenceRole {
    /// Inert definition of a series. Never completed, never has a parent.
    TemplateDefinition { interval: Recurrence },
    /// A concrete, completable occurrence. `template_id` points at the task it
    /// was spawned from; `None` means the occurrence defines its own series.
    ScheduledInstance {
        interval: Recurrence,
        template_id: Option<u64>,
    },
}

impl RecurrenceRole {
    pub fn interval(self) -> Recurrence {
        match self {
            RecurrenceRole::TemplateDefinition { interval }
            | RecurrenceRole::ScheduledInstance { interval, .. } => interval,
        }
    }
}

/// A single to-do item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    /// Legacy date-only due date.
    pub due_date: Option<NaiveDate>,
    /// Due date and time. Takes precedence over `due_date` whenever set.
    pub due_datetime: Option<NaiveDateTime>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub recurrence: Option<RecurrenceRole>,
}

impl Task {
    /// Whether this task is a recurrence template.
    pub fn is_template(&self) -> bool {
        matches!(self.recurrence, Some(RecurrenceRole::TemplateDefinition { .. }))
    }

    /// Recurrence interval, if the task takes part in a series.
    pub fn interval(&self) -> Option<Recurrence> {
        self.recurrence.map(RecurrenceRole::interval)
    }

    /// Id of the template this occurrence was spawned from.
    pub fn parent_id(&self) -> Option<u64> {
        match self.recurrence {
            Some(RecurrenceRole::ScheduledInstance { template_id, .. }) => template_id,
            _ => None,
        }
    }

    /// The instant reminders are computed against. Only `due_datetime` counts.
    pub fn due_instant(&self) -> Option<NaiveDateTime> {
        self.due_datetime
    }

    /// Due day used for list filtering and sorting: the date of `due_datetime`,
    /// falling back to the legacy `due_date`.
    pub fn due_day(&self) -> Option<NaiveDate> {
        self.due_datetime.map(|dt| dt.date()).or(self.due_date)
    }

    /// Reference instant for recurrence stepping: `due_datetime`, or the legacy
    /// `due_date` at the end of that day.
    pub fn recurrence_anchor(&self) -> Option<NaiveDateTime> {
        self.due_datetime
            .or_else(|| self.due_date.map(|d| d.and_time(END_OF_DAY)))
    }
}

/// A task that has not been given an id yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub due_datetime: Option<NaiveDateTime>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub recurrence: Option<RecurrenceRole>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Validate the draft and turn it into a task with the given id.
    ///
    /// The title is trimmed and tags are normalised on the way in.
    pub fn into_task(self, id: u64) -> Result<Task> {
        let title = validate_title(&self.title)?;
        Ok(Task {
            id,
            title,
            description: self.description,
            completed: self.completed,
            due_date: self.due_date,
            due_datetime: self.due_datetime,
            priority: self.priority,
            tags: dedupe_tags(self.tags),
            recurrence: self.recurrence,
        })
    }
}

/// Trim a title and reject it if nothing is left.
pub fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Trim tags, drop blanks and duplicates, keep the order of first appearance.
pub fn dedupe_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
