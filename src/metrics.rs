//! Derived state computed from task records: progress, overdue and
//! upcoming flags, and dashboard aggregates.
//!
//! Everything here is pure. `today` is passed in so callers control the
//! clock, and dates are compared as calendar days.

use chrono::{Days, NaiveDate};

use crate::models::{DashboardStats, Task, TaskStatus};

/// Days ahead (inclusive of today) that count as "upcoming".
pub const UPCOMING_WINDOW_DAYS: u64 = 7;

/// Checklist completion percentage in `[0, 100]`; 0 for an empty checklist.
pub fn progress(task: &Task) -> f64 {
    let (done, total) = task.checklist_totals();
    percentage(done as u64, total as u64)
}

/// True when the due date is strictly before `today` and the task is not done.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    match task.due_date {
        Some(due) => due < today && task.status != TaskStatus::Done,
        None => false,
    }
}

/// True when the task is assigned within the upcoming window starting today.
pub fn is_upcoming(task: &Task, today: NaiveDate) -> bool {
    let Some(assigned) = task.assigned_date else {
        return false;
    };
    let horizon = today
        .checked_add_days(Days::new(UPCOMING_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MAX);
    assigned >= today && assigned <= horizon
}

pub fn dashboard_stats(tasks: &[Task], today: NaiveDate) -> DashboardStats {
    let mut stats = DashboardStats {
        total_tasks: tasks.len() as u64,
        ..Default::default()
    };

    for task in tasks {
        match task.status {
            TaskStatus::Todo => stats.todo_tasks += 1,
            TaskStatus::InProgress => stats.in_progress_tasks += 1,
            TaskStatus::Done => stats.done_tasks += 1,
            TaskStatus::Blocked => stats.blocked_tasks += 1,
        }
        if is_overdue(task, today) {
            stats.overdue_tasks += 1;
        }
        if is_upcoming(task, today) {
            stats.upcoming_tasks += 1;
        }
        let (done, total) = task.checklist_totals();
        stats.completed_checklist_items += done as u64;
        stats.total_checklist_items += total as u64;
    }

    stats.checklist_completion_rate =
        percentage(stats.completed_checklist_items, stats.total_checklist_items);
    stats
}

fn percentage(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (100.0 * done.min(total) as f64 / total as f64).clamp(0.0, 100.0)
}
