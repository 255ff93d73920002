//! Reminder classification for due tasks.
//!
//! The predicates here are pure functions of a due instant and a reference instant.
//! A task without a due instant never lands in any reminder bucket.
//!
//! [`ReminderPolicy`] bundles the reference instant and the "due soon" window so
//! callers (and tests) decide both explicitly.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::task::Task;

/// Default look-ahead for "due soon" reminders, in hours.
pub const DEFAULT_DUE_SOON_HOURS: i64 = 2;

/// Due instant strictly before the reference instant.
pub fn is_overdue(due: Option<NaiveDateTime>, reference: NaiveDateTime) -> bool {
    matches!(due, Some(d) if d < reference)
}

/// Due instant within `[reference, reference + window]`, both ends inclusive.
pub fn is_due_soon(due: Option<NaiveDateTime>, reference: NaiveDateTime, window: Duration) -> bool {
    let Some(d) = due else {
        return false;
    };
    let horizon = reference.checked_add_signed(window).unwrap_or(NaiveDateTime::MAX);
    reference <= d && d <= horizon
}

/// Due instant on the same calendar date as the reference, whatever the time.
pub fn is_due_today(due: Option<NaiveDateTime>, reference: NaiveDateTime) -> bool {
    matches!(due, Some(d) if d.date() == reference.date())
}

/// Legacy check for date-only due dates: strictly before `today`.
pub fn is_overdue_date(due_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    matches!(due_date, Some(d) if d < today)
}

/// Reference instant and due-soon window used to build a [`ReminderReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPolicy {
    pub reference: NaiveDateTime,
    pub window: Duration,
}

impl ReminderPolicy {
    pub fn new(reference: NaiveDateTime, window: Duration) -> Self {
        Self { reference, window }
    }

    /// Policy with the default two-hour window.
    pub fn at(reference: NaiveDateTime) -> Self {
        Self::new(reference, Duration::hours(DEFAULT_DUE_SOON_HOURS))
    }

    /// Classify every open, non-template task.
    ///
    /// Overdue and due-soon are computed independently. Due-today leaves out
    /// anything already counted as overdue.
    pub fn build_report<'a>(&self, tasks: &'a [Task]) -> ReminderReport<'a> {
        let mut report = ReminderReport::default();
        for task in tasks.iter().filter(|t| !t.completed && !t.is_template()) {
            let due = task.due_instant();
            let overdue = is_overdue(due, self.reference);
            if overdue {
                report.overdue.push(task);
            }
            if is_due_soon(due, self.reference, self.window) {
                report.due_soon.push(task);
            }
            if !overdue && is_due_today(due, self.reference) {
                report.due_today.push(task);
            }
        }
        report
    }
}

/// Tasks needing attention, grouped by reminder bucket.
#[derive(Debug, Default, Serialize)]
pub struct ReminderReport<'a> {
    pub overdue: Vec<&'a Task>,
    pub due_soon: Vec<&'a Task>,
    pub due_today: Vec<&'a Task>,
}

impl ReminderReport<'_> {
    pub fn overdue_count(&self) -> usize {
        self.overdue.len()
    }

    pub fn due_soon_count(&self) -> usize {
        self.due_soon.len()
    }

    pub fn due_today_count(&self) -> usize {
        self.due_today.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.due_soon.is_empty() && self.due_today.is_empty()
    }
}

/// One-line summary of the non-zero buckets: Overdue, Due Today, Due Soon.
///
/// Returns an empty string when there is nothing to report.
pub fn format_reminder_banner(report: &ReminderReport<'_>) -> String {
    let parts: Vec<String> = [
        (report.overdue_count(), "OVERDUE"),
        (report.due_today_count(), "DUE TODAY"),
        (report.due_soon_count(), "DUE SOON"),
    ]
    .into_iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, label)| format!("{count} {label}"))
    .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!("⚠️ REMINDERS: {}", parts.join(" | "))
    }
}
