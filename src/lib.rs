//! # todo - recurring tasks and reminders
//!
//! A line-oriented task tracker. Tasks live in memory for the length of a session
//! and can repeat daily, weekly, monthly or yearly.
//!
//! ## Key Features
//!
//! - **Recurring Tasks**: a recurrence template defines the series; completing an
//!   occurrence schedules the next one
//! - **Calendar-aware Monthly Steps**: Jan 31 is followed by the last day of February
//! - **Reminders**: overdue, due-today and due-soon classification with a startup banner
//! - **Queries**: keyword search, filtering and sorting on the effective due day
//!
//! ## Quick Start
//!
//! ```bash
//! # Interactive session
//! todo
//!
//! todo> recur "Pay rent" --every monthly --due 2024-01-31
//! todo> add "Call plumber" --due "in 3h" --priority high --tag home
//! todo> remind
//! todo> toggle 2
//! todo> list --sort due
//!
//! # Scripted session with a pinned clock
//! todo run plan.txt --now "2024-03-15 09:00"
//! ```
//!
//! ## Layout
//!
//! - [`calendar`], [`reminders`], [`recurrence`]: pure date logic
//! - [`task`], [`fields`], [`store`], [`query`]: the task model and its collection
//! - [`cmd`], [`session`], [`cli`], [`config`]: the interactive surface
//!
//! Reminder settings are read from `~/.todo/config.toml` when it exists.

pub mod calendar;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod query;
pub mod recurrence;
pub mod reminders;
pub mod session;
pub mod store;
pub mod task;

pub use error::{Result, TaskError};
pub use task::{RecurrenceRole, Task, TaskDraft};
