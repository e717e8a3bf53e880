use std::collections::HashSet;

use rusqlite::{params, Connection};

use crate::error::WorktaskError;
use crate::models::{
    ChecklistItem, ChecklistItemId, ChecklistItemPatch, ChecklistOrder, NewChecklistItem, Stage,
    TaskId,
};

use super::task_repo;

const ITEM_COLUMNS: &str = "id, task_id, title, stage, git_branch, completed, sort_order";

fn validate_title(title: &str) -> Result<(), WorktaskError> {
    if title.trim().is_empty() {
        return Err(WorktaskError::validation("Checklist item title is required"));
    }
    Ok(())
}

/// Append an item to the end of the task's checklist.
pub fn add_item(
    conn: &Connection,
    task_id: TaskId,
    item: &NewChecklistItem,
) -> Result<ChecklistItem, WorktaskError> {
    validate_title(&item.title)?;
    if !task_repo::task_exists(conn, task_id)? {
        return Err(WorktaskError::task_not_found(task_id));
    }

    let next_order: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM checklist_items WHERE task_id = ?1",
        params![task_id],
        |row| row.get(0),
    )?;

    conn.execute(
        "INSERT INTO checklist_items (task_id, title, stage, git_branch, completed, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            task_id,
            item.title.trim(),
            item.stage.as_str(),
            item.git_branch,
            item.completed,
            next_order,
        ],
    )?;
    get_item(conn, conn.last_insert_rowid())
}

pub fn get_item(conn: &Connection, id: ChecklistItemId) -> Result<ChecklistItem, WorktaskError> {
    conn.query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM checklist_items WHERE id = ?1"),
        params![id],
        row_to_item,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => WorktaskError::checklist_item_not_found(id),
        _ => WorktaskError::from(e),
    })
}

pub fn items_for_task(conn: &Connection, task_id: TaskId) -> Result<Vec<ChecklistItem>, WorktaskError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM checklist_items WHERE task_id = ?1 ORDER BY sort_order ASC, id ASC"
    ))?;
    let items = stmt
        .query_map(params![task_id], row_to_item)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

pub fn update_item(
    conn: &Connection,
    id: ChecklistItemId,
    patch: &ChecklistItemPatch,
) -> Result<ChecklistItem, WorktaskError> {
    let mut item = get_item(conn, id)?;
    patch.apply_to(&mut item);
    validate_title(&item.title)?;

    conn.execute(
        "UPDATE checklist_items SET title = ?1, stage = ?2, git_branch = ?3, completed = ?4
         WHERE id = ?5",
        params![
            item.title.trim(),
            item.stage.as_str(),
            item.git_branch,
            item.completed,
            id,
        ],
    )?;
    get_item(conn, id)
}

pub fn delete_item(conn: &Connection, id: ChecklistItemId) -> Result<(), WorktaskError> {
    let changed = conn.execute("DELETE FROM checklist_items WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(WorktaskError::checklist_item_not_found(id));
    }
    Ok(())
}

/// Apply a full ordering in one transaction.
///
/// The batch must name every item of the task exactly once with distinct
/// orders; otherwise nothing is written.
pub fn reorder_items(
    conn: &Connection,
    task_id: TaskId,
    order: &[ChecklistOrder],
) -> Result<Vec<ChecklistItem>, WorktaskError> {
    if !task_repo::task_exists(conn, task_id)? {
        return Err(WorktaskError::task_not_found(task_id));
    }

    let current: HashSet<ChecklistItemId> =
        items_for_task(conn, task_id)?.iter().map(|i| i.id).collect();
    let requested: HashSet<ChecklistItemId> = order.iter().map(|o| o.id).collect();
    if requested.len() != order.len() || requested != current {
        return Err(WorktaskError::validation(format!(
            "Reorder must list each of the task's {} checklist items exactly once",
            current.len()
        )));
    }
    let positions: HashSet<i64> = order.iter().map(|o| o.order).collect();
    if positions.len() != order.len() {
        return Err(WorktaskError::validation("Reorder positions must be distinct"));
    }

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = (|| -> Result<(), WorktaskError> {
        for entry in order {
            conn.execute(
                "UPDATE checklist_items SET sort_order = ?1 WHERE id = ?2 AND task_id = ?3",
                params![entry.order, entry.id, task_id],
            )?;
        }
        Ok(())
    })();

    match result {
        Ok(()) => conn.execute_batch("COMMIT")?,
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e);
        }
    }

    items_for_task(conn, task_id)
}

fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<ChecklistItem> {
    Ok(ChecklistItem {
        id: row.get(0)?,
        task_id: row.get(1)?,
        title: row.get(2)?,
        stage: Stage::from_str(&row.get::<_, String>(3)?).unwrap_or_default(),
        git_branch: row.get(4)?,
        completed: row.get(5)?,
        order: row.get(6)?,
    })
}
