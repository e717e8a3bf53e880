use chrono::{Days, NaiveDate};
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection};

use crate::error::WorktaskError;
use crate::filter;
use crate::metrics::UPCOMING_WINDOW_DAYS;
use crate::models::{DashboardStats, NewTask, Priority, Task, TaskFilter, TaskId, TaskPatch, TaskStatus};

use super::{checklist_repo, dependency_repo};

const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.assigned_date, t.due_date,
        t.priority, t.status, t.jira_id, t.jira_url, t.notes, t.created_at, t.updated_at,
        (SELECT COUNT(*) FROM checklist_items c WHERE c.task_id = t.id),
        (SELECT COUNT(*) FROM checklist_items c WHERE c.task_id = t.id AND c.completed = 1)";

pub fn validate_title(title: &str) -> Result<(), WorktaskError> {
    if title.trim().is_empty() {
        return Err(WorktaskError::validation("Task title is required"));
    }
    Ok(())
}

pub fn create_task(conn: &Connection, task: &NewTask) -> Result<Task, WorktaskError> {
    validate_title(&task.title)?;
    conn.execute(
        "INSERT INTO tasks (title, description, assigned_date, due_date, priority, status,
                            jira_id, jira_url, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            task.title.trim(),
            task.description,
            task.assigned_date,
            task.due_date,
            task.priority.unwrap_or_default().as_str(),
            task.status.unwrap_or_default().as_str(),
            task.jira_id,
            task.jira_url,
            task.notes,
        ],
    )?;
    get_task_by_id(conn, conn.last_insert_rowid())
}

/// A list-shaped record: counts but no nested collections.
pub fn get_task_by_id(conn: &Connection, id: TaskId) -> Result<Task, WorktaskError> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1"),
        params![id],
        row_to_task,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => WorktaskError::task_not_found(id),
        _ => WorktaskError::from(e),
    })
}

/// A detail record: checklist items (by order) and prerequisites.
pub fn get_task_detail(conn: &Connection, id: TaskId) -> Result<Task, WorktaskError> {
    let mut task = get_task_by_id(conn, id)?;
    task.checklist_items = checklist_repo::items_for_task(conn, id)?;
    task.dependencies = dependency_repo::dependencies_for_task(conn, id)?;
    task.sync_checklist_counts();
    Ok(task)
}

pub fn task_exists(conn: &Connection, id: TaskId) -> Result<bool, WorktaskError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Structured filters run in SQL; the text search reuses the client matcher
/// so both sides agree on case folding.
pub fn list_tasks(conn: &Connection, filter: &TaskFilter) -> Result<Vec<Task>, WorktaskError> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(status) = filter.status {
        values.push(Box::new(status.as_str()));
        clauses.push(format!("t.status = ?{}", values.len()));
    }
    if let Some(priority) = filter.priority {
        values.push(Box::new(priority.as_str()));
        clauses.push(format!("t.priority = ?{}", values.len()));
    }
    if let Some(from) = filter.date_from {
        values.push(Box::new(from));
        clauses.push(format!("t.assigned_date >= ?{}", values.len()));
    }
    if let Some(to) = filter.date_to {
        values.push(Box::new(to));
        clauses.push(format!("t.assigned_date <= ?{}", values.len()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks t {where_clause}
         ORDER BY t.assigned_date IS NULL, t.assigned_date,
                  CASE t.priority WHEN 'urgent' THEN 0 WHEN 'high' THEN 1
                                  WHEN 'medium' THEN 2 ELSE 3 END,
                  t.id"
    );

    let mut stmt = conn.prepare(&sql)?;
    let tasks = stmt
        .query_map(params_from_iter(values.iter()), row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;

    let search = filter.search.as_deref().unwrap_or("");
    Ok(tasks
        .into_iter()
        .filter(|t| filter::matches_query(t, search))
        .collect())
}

/// Merge `patch` over the stored row. Unset fields keep their value.
pub fn update_task(conn: &Connection, id: TaskId, patch: &TaskPatch) -> Result<Task, WorktaskError> {
    let mut task = get_task_by_id(conn, id)?;
    patch.apply_to(&mut task);
    validate_title(&task.title)?;

    conn.execute(
        "UPDATE tasks SET title = ?1, description = ?2, assigned_date = ?3, due_date = ?4,
                          priority = ?5, status = ?6, jira_id = ?7, jira_url = ?8, notes = ?9,
                          updated_at = datetime('now')
         WHERE id = ?10",
        params![
            task.title.trim(),
            task.description,
            task.assigned_date,
            task.due_date,
            task.priority.as_str(),
            task.status.as_str(),
            task.jira_id,
            task.jira_url,
            task.notes,
            id,
        ],
    )?;
    get_task_by_id(conn, id)
}

/// Checklist items and dependency edges on either end go with the task
/// (`ON DELETE CASCADE`).
pub fn delete_task(conn: &Connection, id: TaskId) -> Result<(), WorktaskError> {
    let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(WorktaskError::task_not_found(id));
    }
    Ok(())
}

pub fn dashboard_stats(conn: &Connection, today: NaiveDate) -> Result<DashboardStats, WorktaskError> {
    let mut stats = DashboardStats::default();

    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM tasks GROUP BY status")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))?;
    for row in rows {
        let (status, count) = row?;
        match TaskStatus::from_str(&status) {
            Some(TaskStatus::Todo) => stats.todo_tasks = count,
            Some(TaskStatus::InProgress) => stats.in_progress_tasks = count,
            Some(TaskStatus::Done) => stats.done_tasks = count,
            Some(TaskStatus::Blocked) => stats.blocked_tasks = count,
            None => {}
        }
        stats.total_tasks += count;
    }

    stats.overdue_tasks = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE due_date IS NOT NULL AND due_date < ?1 AND status != 'done'",
        params![today],
        |row| row.get(0),
    )?;

    let horizon = today
        .checked_add_days(Days::new(UPCOMING_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MAX);
    stats.upcoming_tasks = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE assigned_date >= ?1 AND assigned_date <= ?2",
        params![today, horizon],
        |row| row.get(0),
    )?;

    let (total, completed): (u64, u64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(completed), 0) FROM checklist_items",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    stats.total_checklist_items = total;
    stats.completed_checklist_items = completed;
    stats.checklist_completion_rate = if total > 0 {
        completed as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    Ok(stats)
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        assigned_date: row.get(3)?,
        due_date: row.get(4)?,
        priority: Priority::from_str(&row.get::<_, String>(5)?).unwrap_or_default(),
        status: TaskStatus::from_str(&row.get::<_, String>(6)?).unwrap_or_default(),
        jira_id: row.get(7)?,
        jira_url: row.get(8)?,
        notes: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        checklist_count: row.get(12)?,
        completed_checklist_count: row.get(13)?,
        checklist_items: Vec::new(),
        dependencies: Vec::new(),
    })
}
