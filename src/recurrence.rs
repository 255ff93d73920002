//! Recurrence engine: next due dates, successor generation and completion handling.
//!
//! A task's role in a series is carried by [`RecurrenceRole`]:
//!
//! - `TemplateDefinition`: an inert definition. It can be edited or demoted but is
//!   never completed.
//! - `ScheduledInstance`: a concrete occurrence. Completing it produces the next
//!   occurrence, generated from its template when that template still exists, or
//!   from the occurrence itself when it has none.
//! - no role: an ordinary task, completion has no side effects.
//!
//! The engine holds the instant it treats as "now" so every computation can be
//! replayed with a fixed clock.

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::calendar::{add_interval, adjust_for_month_boundary};
use crate::error::{Result, TaskError};
use crate::fields::Recurrence;
use crate::task::{RecurrenceRole, Task, TaskDraft};

/// Generates and advances recurring tasks relative to a fixed "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceEngine {
    now: NaiveDateTime,
}

impl Default for RecurrenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecurrenceEngine {
    /// Engine using the local wall clock at the moment of construction.
    pub fn new() -> Self {
        Self::at(Local::now().naive_local())
    }

    /// Engine with an explicit current instant.
    pub fn at(now: NaiveDateTime) -> Self {
        Self { now }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// Next due instant of a recurring task.
    ///
    /// `reference` defaults to the task's own due instant, then to the engine's
    /// now. Monthly recurrence steps by calendar month; the other intervals use
    /// fixed-length steps. Returns `None` for tasks without recurrence.
    pub fn next_due_date(&self, task: &Task, reference: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
        let interval = task.interval()?;
        let reference = reference
            .or_else(|| task.recurrence_anchor())
            .unwrap_or(self.now);
        Some(next_due_from(reference, interval))
    }

    /// Draft of the next occurrence of a template.
    ///
    /// Fails with [`TaskError::NotATemplate`] unless `template` is a
    /// `TemplateDefinition`.
    pub fn generate_next_instance(
        &self,
        template: &Task,
        reference: Option<NaiveDateTime>,
    ) -> Result<TaskDraft> {
        let Some(RecurrenceRole::TemplateDefinition { interval }) = template.recurrence else {
            return Err(TaskError::NotATemplate {
                id: template.id,
                action: "generate an instance",
            });
        };
        let due = self.next_due_date(template, reference);
        Ok(occurrence_of(template, interval, due))
    }

    /// First occurrence created alongside a new template.
    ///
    /// Due at the template's own due instant (a date-only due date counts as the
    /// end of that day), or at the engine's now when the template has none.
    pub fn first_instance(&self, template: &Task) -> Result<TaskDraft> {
        let Some(RecurrenceRole::TemplateDefinition { interval }) = template.recurrence else {
            return Err(TaskError::NotATemplate {
                id: template.id,
                action: "create a first instance",
            });
        };
        let due = template.recurrence_anchor().unwrap_or(self.now);
        Ok(occurrence_of(template, interval, Some(due)))
    }

    /// Successor to spawn when `task` is marked completed.
    ///
    /// `all_tasks` is used to resolve the task's template and to pick an id one
    /// above the current maximum (1 for an empty collection). Templates cannot be
    /// completed; ordinary tasks have no successor.
    pub fn handle_completion(&self, task: &Task, all_tasks: &[Task]) -> Result<Option<Task>> {
        let draft = match task.recurrence {
            None => return Ok(None),
            Some(RecurrenceRole::TemplateDefinition { .. }) => {
                warn!(task_id = task.id, "rejected completion of a recurrence template");
                return Err(TaskError::TemplateCompletion { id: task.id });
            }
            Some(RecurrenceRole::ScheduledInstance { interval, template_id }) => {
                let template = template_id
                    .and_then(|tid| all_tasks.iter().find(|t| t.id == tid))
                    .filter(|t| t.is_template());
                match template {
                    Some(template) => {
                        // An undated occurrence steps from now, not from the template's due.
                        let reference = task.recurrence_anchor().unwrap_or(self.now);
                        self.generate_next_instance(template, Some(reference))?
                    }
                    None => self.self_defined_successor(task, interval),
                }
            }
        };

        let id = all_tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let successor = draft.into_task(id)?;
        info!(
            source_id = task.id,
            successor_id = successor.id,
            due = ?successor.due_datetime,
            "spawned next occurrence"
        );
        Ok(Some(successor))
    }

    /// Change or clear the interval of a template.
    ///
    /// Clearing demotes the template to an ordinary task.
    pub fn update_recurrence(&self, task: &mut Task, interval: Option<Recurrence>) -> Result<()> {
        if !task.is_template() {
            return Err(TaskError::NotATemplate {
                id: task.id,
                action: if interval.is_some() {
                    "update recurrence"
                } else {
                    "disable recurrence"
                },
            });
        }
        task.recurrence = interval.map(|interval| RecurrenceRole::TemplateDefinition { interval });
        debug!(task_id = task.id, interval = ?interval, "recurrence updated");
        Ok(())
    }

    /// Clear the interval of a template, turning it into an ordinary task.
    pub fn disable_recurrence(&self, task: &mut Task) -> Result<()> {
        self.update_recurrence(task, None)
    }

    /// Occurrence that acts as its own definition: the successor links back to it.
    fn self_defined_successor(&self, task: &Task, interval: Recurrence) -> TaskDraft {
        let due = self.next_due_date(task, None);
        occurrence_of(task, interval, due)
    }
}

/// Step `reference` by one `interval`; monthly uses calendar months.
pub fn next_due_from(reference: NaiveDateTime, interval: Recurrence) -> NaiveDateTime {
    match interval {
        Recurrence::Monthly => adjust_for_month_boundary(reference),
        other => add_interval(reference, other),
    }
}

fn occurrence_of(source: &Task, interval: Recurrence, due: Option<NaiveDateTime>) -> TaskDraft {
    TaskDraft {
        title: source.title.clone(),
        description: source.description.clone(),
        completed: false,
        due_date: None,
        due_datetime: due,
        priority: source.priority,
        tags: source.tags.clone(),
        recurrence: Some(RecurrenceRole::ScheduledInstance {
            interval,
            template_id: Some(source.id),
        }),
    }
}
