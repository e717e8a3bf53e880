use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{Task, TaskFilter};

/// Case-insensitive substring match on title, description, or external id.
/// A blank query matches everything; otherwise the query is matched as typed,
/// surrounding whitespace included.
pub fn matches_query(task: &Task, query: &str) -> bool {
    if query.trim().is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    let hit = |field: Option<&str>| field.is_some_and(|s| s.to_lowercase().contains(&needle));
    hit(Some(&task.title)) || hit(task.description.as_deref()) || hit(task.jira_id.as_deref())
}

/// Structured predicates only (status, priority, assigned-date range).
pub fn matches_filter(task: &Task, filter: &TaskFilter) -> bool {
    if filter.status.is_some_and(|s| s != task.status) {
        return false;
    }
    if filter.priority.is_some_and(|p| p != task.priority) {
        return false;
    }
    if filter.date_from.is_some() || filter.date_to.is_some() {
        let Some(assigned) = task.assigned_date else {
            return false;
        };
        if filter.date_from.is_some_and(|from| assigned < from) {
            return false;
        }
        if filter.date_to.is_some_and(|to| assigned > to) {
            return false;
        }
    }
    true
}

/// Stable filter: the result keeps the input's relative order.
///
/// `query` is ANDed with `filter`, including `filter.search` when both are set.
pub fn filter_tasks<'a>(tasks: &'a [Task], query: &str, filter: &TaskFilter) -> Vec<&'a Task> {
    let search = filter.search.as_deref().unwrap_or("");
    tasks
        .iter()
        .filter(|t| matches_query(t, query) && matches_query(t, search) && matches_filter(t, filter))
        .collect()
}

/// Calendar agenda: tasks assigned within `[from, to]`, grouped by day.
pub fn agenda(tasks: &[Task], from: NaiveDate, to: NaiveDate) -> BTreeMap<NaiveDate, Vec<&Task>> {
    let mut days: BTreeMap<NaiveDate, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        if let Some(day) = task.assigned_date {
            if day >= from && day <= to {
                days.entry(day).or_default().push(task);
            }
        }
    }
    days
}
