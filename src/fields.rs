//! Enumerations and field types for task management.
//!
//! This module defines the closed value sets tasks are built from: priority levels,
//! recurrence intervals, and the sort and status options used by list queries.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Priority classification for task importance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort rank, lowest importance first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        })
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    /// Case-insensitive: "high", "HIGH" and "High" are all accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "h" => Ok(Priority::High),
            "medium" | "m" => Ok(Priority::Medium),
            "low" | "l" => Ok(Priority::Low),
            _ => Err(TaskError::InvalidPriority(s.to_string())),
        }
    }
}

/// Recurrence interval for repeating tasks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Monthly => "monthly",
            Recurrence::Yearly => "yearly",
        })
    }
}

impl FromStr for Recurrence {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "d" => Ok(Recurrence::Daily),
            "weekly" | "w" => Ok(Recurrence::Weekly),
            "monthly" | "m" => Ok(Recurrence::Monthly),
            "yearly" | "y" => Ok(Recurrence::Yearly),
            _ => Err(TaskError::InvalidRecurrence(s.to_string())),
        }
    }
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum SortKey {
    /// Due day first, then priority.
    #[default]
    DuePriority,
    Due,
    Priority,
    /// Creation order (task id).
    Created,
    Title,
}

/// Completion status filter for task lists.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StatusFilter {
    Done,
    Pending,
}

impl StatusFilter {
    /// The `completed` flag a task must carry to pass this filter.
    pub fn completed(self) -> bool {
        matches!(self, StatusFilter::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parse_is_case_insensitive() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("MEDIUM".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!(" Low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!(matches!(
            "urgent".parse::<Priority>(),
            Err(TaskError::InvalidPriority(s)) if s == "urgent"
        ));
    }

    #[test]
    fn test_recurrence_parse_accepts_shortcuts() {
        assert_eq!("d".parse::<Recurrence>().unwrap(), Recurrence::Daily);
        assert_eq!("Weekly".parse::<Recurrence>().unwrap(), Recurrence::Weekly);
        assert_eq!("m".parse::<Recurrence>().unwrap(), Recurrence::Monthly);
        assert_eq!("yearly".parse::<Recurrence>().unwrap(), Recurrence::Yearly);
    }

    #[test]
    fn test_recurrence_parse_rejects_unknown_interval() {
        let err = "fortnightly".parse::<Recurrence>().unwrap_err();
        assert!(matches!(err, TaskError::InvalidRecurrence(_)));
        assert!(err.to_string().contains("fortnightly"));
    }

    #[test]
    fn test_priority_rank_orders_low_to_high() {
        assert!(Priority::Low.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::High.rank());
        assert_eq!(Priority::default(), Priority::Medium);
    }
}
