//! Error types for the task tracker.

/// Everything that can go wrong when validating or mutating tasks.
///
/// Lookups by id never produce an error: a missing task is reported through
/// `Option`/`bool` results by the store.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Title was empty or whitespace only.
    #[error("task title cannot be empty")]
    EmptyTitle,

    /// Priority string outside of High/Medium/Low.
    #[error("priority must be one of High, Medium or Low, got '{0}'")]
    InvalidPriority(String),

    /// Recurrence string outside of daily/weekly/monthly/yearly.
    #[error("recurrence must be one of daily, weekly, monthly or yearly, got '{0}'")]
    InvalidRecurrence(String),

    /// Unparsable date or date+time input.
    #[error("invalid date/time '{0}': expected YYYY-MM-DD HH:MM, YYYY-MM-DD, today, tomorrow, a weekday or 'in N[d|w|h]'")]
    InvalidDateTime(String),

    /// Templates are definitions and cannot be completed.
    #[error("task {id} is a recurrence template and cannot be marked completed directly")]
    TemplateCompletion { id: u64 },

    /// Operation reserved for recurrence templates.
    #[error("task {id} is not a recurrence template: cannot {action}")]
    NotATemplate { id: u64, action: &'static str },

    /// A task with this id already exists in the store.
    #[error("task id {0} is already in use")]
    DuplicateId(u64),

    /// Session line that does not form a valid command.
    #[error("{0}")]
    InvalidCommand(String),

    /// Configuration file could not be read or holds invalid values.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, TaskError>;
