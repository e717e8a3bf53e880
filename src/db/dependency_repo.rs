use rusqlite::{params, Connection};

use crate::error::WorktaskError;
use crate::models::{Dependency, DependencyId, DependencyRef, TaskId, TaskStatus};

use super::task_repo;

pub fn add_dependency(
    conn: &Connection,
    task_id: TaskId,
    depends_on_id: TaskId,
) -> Result<Dependency, WorktaskError> {
    if task_id == depends_on_id {
        return Err(WorktaskError::self_dependency(task_id));
    }
    for id in [task_id, depends_on_id] {
        if !task_repo::task_exists(conn, id)? {
            return Err(WorktaskError::task_not_found(id));
        }
    }
    if find_edge(conn, task_id, depends_on_id)?.is_some() {
        return Err(WorktaskError::dependency_exists(task_id, depends_on_id));
    }

    conn.execute(
        "INSERT INTO task_dependencies (task_id, depends_on_id) VALUES (?1, ?2)",
        params![task_id, depends_on_id],
    )?;
    Ok(Dependency {
        id: conn.last_insert_rowid(),
        task_id,
        depends_on_id,
    })
}

pub fn find_edge(
    conn: &Connection,
    task_id: TaskId,
    depends_on_id: TaskId,
) -> Result<Option<DependencyId>, WorktaskError> {
    let mut stmt = conn.prepare(
        "SELECT id FROM task_dependencies WHERE task_id = ?1 AND depends_on_id = ?2",
    )?;
    let mut rows = stmt.query(params![task_id, depends_on_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

pub fn remove_dependency(conn: &Connection, id: DependencyId) -> Result<(), WorktaskError> {
    let changed = conn.execute("DELETE FROM task_dependencies WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(WorktaskError::dependency_not_found(id));
    }
    Ok(())
}

/// Prerequisites of a task with their current title and status.
pub fn dependencies_for_task(conn: &Connection, task_id: TaskId) -> Result<Vec<DependencyRef>, WorktaskError> {
    let mut stmt = conn.prepare(
        "SELECT d.id, d.depends_on_id, t.title, t.status
         FROM task_dependencies d
         JOIN tasks t ON d.depends_on_id = t.id
         WHERE d.task_id = ?1
         ORDER BY d.id ASC",
    )?;
    let deps = stmt
        .query_map(params![task_id], |row| {
            Ok(DependencyRef {
                id: Some(row.get(0)?),
                depends_on_id: row.get(1)?,
                title: row.get(2)?,
                status: TaskStatus::from_str(&row.get::<_, String>(3)?).unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(deps)
}

/// Every edge as `(task_id, depends_on_id)`.
pub fn all_edges(conn: &Connection) -> Result<Vec<(TaskId, TaskId)>, WorktaskError> {
    let mut stmt = conn.prepare("SELECT task_id, depends_on_id FROM task_dependencies")?;
    let edges = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(edges)
}

/// Number of edges that mention `task_id` on either end.
pub fn edges_touching(conn: &Connection, task_id: TaskId) -> Result<i64, WorktaskError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM task_dependencies WHERE task_id = ?1 OR depends_on_id = ?1",
        params![task_id],
        |row| row.get(0),
    )?;
    Ok(count)
}
