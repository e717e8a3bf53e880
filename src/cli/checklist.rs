use serde_json::json;

use crate::cli::commands::ChecklistCommands;
use crate::cli::{finish, Context};
use crate::error::WorktaskError;
use crate::models::{ChecklistItemId, ChecklistItemPatch, NewChecklistItem, TaskId};
use crate::output;

pub fn run(cmd: ChecklistCommands, ctx: &Context) -> i32 {
    finish(run_inner(cmd, ctx), ctx.json)
}

fn run_inner(cmd: ChecklistCommands, ctx: &Context) -> Result<i32, WorktaskError> {
    match cmd {
        ChecklistCommands::Add {
            task_id,
            title,
            stage,
            branch,
            done,
        } => {
            let item = NewChecklistItem {
                title,
                stage: stage.unwrap_or_default(),
                git_branch: branch,
                completed: done,
            };
            run_add(task_id, &item, ctx)
        }
        ChecklistCommands::Update {
            item_id,
            title,
            stage,
            branch,
            clear_branch,
            completed,
        } => {
            let patch = ChecklistItemPatch {
                title,
                stage,
                git_branch: if clear_branch { Some(None) } else { branch.map(Some) },
                completed,
            };
            run_update(item_id, &patch, ctx)
        }
        ChecklistCommands::Delete { item_id } => run_delete(item_id, ctx),
        ChecklistCommands::Move { task_id, from, to } => run_move(task_id, from, to, ctx),
    }
}

fn run_add(task_id: TaskId, item: &NewChecklistItem, ctx: &Context) -> Result<i32, WorktaskError> {
    let mut store = ctx.open_store()?;
    let created = store.add_checklist_item(task_id, item)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "item": output::json::checklist_item_json(&created)
        })));
    } else {
        println!("Added checklist item: {} (#{}) to task #{task_id}", created.title, created.id);
    }
    Ok(0)
}

fn run_update(item_id: ChecklistItemId, patch: &ChecklistItemPatch, ctx: &Context) -> Result<i32, WorktaskError> {
    if *patch == ChecklistItemPatch::default() {
        return Err(WorktaskError::validation("Nothing to update"));
    }
    let mut store = ctx.open_store()?;
    let updated = store.update_checklist_item(item_id, patch)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "item": output::json::checklist_item_json(&updated)
        })));
    } else {
        let mark = if updated.completed { "x" } else { " " };
        println!("Updated checklist item: [{mark}] {} (#{})", updated.title, updated.id);
    }
    Ok(0)
}

fn run_delete(item_id: ChecklistItemId, ctx: &Context) -> Result<i32, WorktaskError> {
    let mut store = ctx.open_store()?;
    store.delete_checklist_item(item_id)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({ "deleted": item_id })));
    } else {
        println!("Deleted checklist item #{item_id}");
    }
    Ok(0)
}

fn run_move(task_id: TaskId, from: usize, to: usize, ctx: &Context) -> Result<i32, WorktaskError> {
    let mut store = ctx.open_store()?;
    let items = store.reorder_checklist(task_id, from, to)?;

    if ctx.json {
        let items_json: Vec<_> = items.iter().map(output::json::checklist_item_json).collect();
        output::json::print(&output::json::success(json!({ "items": items_json })));
    } else {
        output::text::print_checklist(&items);
    }
    Ok(0)
}
