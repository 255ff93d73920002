//! Search, filtering and sorting over task lists.
//!
//! Due-day comparisons use [`Task::due_day`], so tasks with a due date and time
//! and legacy date-only tasks are filtered and ordered together.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::fields::{Priority, SortKey, StatusFilter};
use crate::task::Task;

/// Case-insensitive keyword search across title, description and tags.
///
/// An empty keyword matches everything.
pub fn search<'a>(tasks: &[&'a Task], keyword: &str) -> Vec<&'a Task> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return tasks.to_vec();
    }
    tasks
        .iter()
        .copied()
        .filter(|t| {
            t.title.to_lowercase().contains(&needle)
                || t.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || t.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Criteria for [`filter`]. Every criterion that is set must match.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<StatusFilter>,
    pub priority: Option<Priority>,
    /// Inclusive lower bound on the due day.
    pub due_from: Option<NaiveDate>,
    /// Inclusive upper bound on the due day.
    pub due_to: Option<NaiveDate>,
    /// Matches tasks carrying any of these tags.
    pub tags: Vec<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.completed != status.completed() {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if self.due_from.is_some() || self.due_to.is_some() {
            let Some(day) = task.due_day() else {
                return false;
            };
            if self.due_from.is_some_and(|from| day < from) {
                return false;
            }
            if self.due_to.is_some_and(|to| day > to) {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|tag| task.tags.contains(tag)) {
            return false;
        }
        true
    }
}

pub fn filter<'a>(tasks: &[&'a Task], criteria: &TaskFilter) -> Vec<&'a Task> {
    tasks.iter().copied().filter(|t| criteria.matches(t)).collect()
}

/// Sort tasks by `key`; `ascending = false` reverses the key order.
///
/// Ascending puts tasks without a due day last and ranks priority Low before
/// High. The sort is stable in both directions: tied tasks keep their input
/// order.
pub fn sort(tasks: &mut [&Task], key: SortKey, ascending: bool) {
    tasks.sort_by(|a, b| {
        if ascending {
            compare(key, a, b)
        } else {
            compare(key, b, a)
        }
    });
}

fn compare(key: SortKey, a: &Task, b: &Task) -> Ordering {
    match key {
        SortKey::DuePriority => {
            (due_key(a), a.priority.rank()).cmp(&(due_key(b), b.priority.rank()))
        }
        SortKey::Due => due_key(a).cmp(&due_key(b)),
        SortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
        SortKey::Created => a.id.cmp(&b.id),
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    }
}

fn due_key(task: &Task) -> NaiveDate {
    task.due_day().unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn sample() -> Vec<Task> {
        let mk = |id: u64, title: &str, pri: Priority, due: Option<u32>, tags: &[&str], done: bool| {
            let mut d = TaskDraft::new(title);
            d.priority = pri;
            d.due_date = due.map(day);
            d.tags = tags.iter().map(|s| s.to_string()).collect();
            d.completed = done;
            d.into_task(id).unwrap()
        };
        let mut v = vec![
            mk(1, "Write report", Priority::High, Some(10), &["work"], false),
            mk(2, "buy groceries", Priority::Low, None, &["home", "errand"], true),
            mk(3, "Call plumber", Priority::Medium, Some(5), &["home"], false),
            mk(4, "Archive mail", Priority::Low, Some(10), &[], false),
        ];
        v[3].description = Some("Clean up the WORK inbox".into());
        v[2].due_date = None;
        v[2].due_datetime = day(5).and_hms_opt(9, 0, 0);
        v
    }

    fn ids(tasks: &[&Task]) -> Vec<u64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_search_matches_title_description_and_tags() {
        let tasks = sample();
        let refs: Vec<&Task> = tasks.iter().collect();
        assert_eq!(ids(&search(&refs, "work")), vec![1, 4]);
        assert_eq!(ids(&search(&refs, "ERRAND")), vec![2]);
        assert_eq!(ids(&search(&refs, "plumb")), vec![3]);
        assert_eq!(ids(&search(&refs, "")), vec![1, 2, 3, 4]);
        assert!(search(&refs, "nothing").is_empty());
    }

    #[test]
    fn test_filter_combines_criteria() {
        let tasks = sample();
        let refs: Vec<&Task> = tasks.iter().collect();

        let pending = TaskFilter { status: Some(StatusFilter::Pending), ..Default::default() };
        assert_eq!(ids(&filter(&refs, &pending)), vec![1, 3, 4]);

        let low = TaskFilter { priority: Some(Priority::Low), ..Default::default() };
        assert_eq!(ids(&filter(&refs, &low)), vec![2, 4]);

        let range = TaskFilter { due_from: Some(day(6)), due_to: Some(day(10)), ..Default::default() };
        assert_eq!(ids(&filter(&refs, &range)), vec![1, 4]);

        let home = TaskFilter { tags: vec!["home".into(), "work".into()], ..Default::default() };
        assert_eq!(ids(&filter(&refs, &home)), vec![1, 2, 3]);

        let none = TaskFilter {
            status: Some(StatusFilter::Done),
            priority: Some(Priority::High),
            ..Default::default()
        };
        assert!(filter(&refs, &none).is_empty());
    }

    #[test]
    fn test_sort_keys() {
        let tasks = sample();
        let mut refs: Vec<&Task> = tasks.iter().collect();

        sort(&mut refs, SortKey::DuePriority, true);
        assert_eq!(ids(&refs), vec![3, 4, 1, 2]);

        sort(&mut refs, SortKey::Due, false);
        assert_eq!(ids(&refs)[0], 2);

        sort(&mut refs, SortKey::Priority, false);
        assert_eq!(ids(&refs)[0], 1);

        sort(&mut refs, SortKey::Title, true);
        assert_eq!(ids(&refs), vec![4, 2, 3, 1]);

        sort(&mut refs, SortKey::Created, true);
        assert_eq!(ids(&refs), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_descending_sort_keeps_ties_in_input_order() {
        let tasks = sample();
        let mut refs: Vec<&Task> = tasks.iter().collect();
        // 1 and 4 share a due day.
        sort(&mut refs, SortKey::Due, false);
        assert_eq!(ids(&refs), vec![2, 1, 4, 3]);

        let mut refs: Vec<&Task> = tasks.iter().rev().collect();
        sort(&mut refs, SortKey::Due, false);
        assert_eq!(ids(&refs), vec![2, 4, 1, 3]);
    }
}
