use serde_json::json;
use tracing::info;

use crate::cli::commands::{ClearField, TaskCommands};
use crate::cli::{finish, Context};
use crate::error::WorktaskError;
use crate::models::{NewTask, TaskFilter, TaskId, TaskPatch};
use crate::output;

pub fn run(cmd: TaskCommands, ctx: &Context) -> i32 {
    finish(run_inner(cmd, ctx), ctx.json)
}

fn run_inner(cmd: TaskCommands, ctx: &Context) -> Result<i32, WorktaskError> {
    match cmd {
        TaskCommands::Add {
            title,
            description,
            assigned,
            due,
            priority,
            status,
            jira_id,
            jira_url,
            notes,
        } => {
            let task = NewTask {
                title,
                description,
                assigned_date: assigned,
                due_date: due,
                priority,
                status,
                jira_id,
                jira_url,
                notes,
            };
            run_add(&task, ctx)
        }
        TaskCommands::List {
            status,
            priority,
            from,
            to,
            search,
        } => {
            let filter = TaskFilter {
                status,
                priority,
                date_from: from,
                date_to: to,
                search: None,
            };
            run_list(&filter, search.as_deref().unwrap_or(""), ctx)
        }
        TaskCommands::Show { id } => run_show(id, ctx),
        TaskCommands::Update {
            id,
            title,
            description,
            assigned,
            due,
            priority,
            status,
            jira_id,
            jira_url,
            notes,
            clear,
        } => {
            let mut patch = TaskPatch {
                title,
                description: description.map(Some),
                assigned_date: assigned.map(Some),
                due_date: due.map(Some),
                priority,
                status,
                jira_id: jira_id.map(Some),
                jira_url: jira_url.map(Some),
                notes: notes.map(Some),
            };
            for field in clear {
                match field {
                    ClearField::Description => patch.description = Some(None),
                    ClearField::Assigned => patch.assigned_date = Some(None),
                    ClearField::Due => patch.due_date = Some(None),
                    ClearField::JiraId => patch.jira_id = Some(None),
                    ClearField::JiraUrl => patch.jira_url = Some(None),
                    ClearField::Notes => patch.notes = Some(None),
                }
            }
            run_update(id, &patch, ctx)
        }
        TaskCommands::Delete { id } => run_delete(id, ctx),
    }
}

fn run_add(task: &NewTask, ctx: &Context) -> Result<i32, WorktaskError> {
    let mut store = ctx.open_store()?;
    let created = store.create(task)?;
    info!(id = created.id, "task created");

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "task": output::json::task_detail(&created, store.today())
        })));
    } else {
        println!("Added task: {} (#{})", created.title, created.id);
    }
    Ok(0)
}

fn run_list(filter: &TaskFilter, search: &str, ctx: &Context) -> Result<i32, WorktaskError> {
    let mut store = ctx.open_store()?;
    store.list(filter)?;
    let today = store.today();
    let tasks = store.visible(search, filter);

    if ctx.json {
        let tasks_json: Vec<_> = tasks
            .iter()
            .map(|t| output::json::task_summary(t, today))
            .collect();
        output::json::print(&output::json::success(json!({
            "tasks": tasks_json,
            "count": tasks.len()
        })));
    } else {
        output::text::print_task_list(&tasks, today);
    }
    Ok(0)
}

fn run_show(id: TaskId, ctx: &Context) -> Result<i32, WorktaskError> {
    let mut store = ctx.open_store()?;
    let today = store.today();
    let task = store.get_by_id(id)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "task": output::json::task_detail(task, today)
        })));
    } else {
        output::text::print_task(task, today);
        if !task.checklist_items.is_empty() {
            println!("\nChecklist:");
            output::text::print_checklist(&task.checklist_items);
        }
        if !task.dependencies.is_empty() {
            println!("\nDepends on:");
            output::text::print_dependencies(&task.dependencies);
        }
    }
    Ok(0)
}

fn run_update(id: TaskId, patch: &TaskPatch, ctx: &Context) -> Result<i32, WorktaskError> {
    if patch.is_empty() {
        return Err(WorktaskError::validation("Nothing to update"));
    }
    let mut store = ctx.open_store()?;
    let updated = store.update(id, patch)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "task": output::json::task_summary(&updated, store.today())
        })));
    } else {
        println!("Updated task: {} (#{})", updated.title, updated.id);
    }
    Ok(0)
}

fn run_delete(id: TaskId, ctx: &Context) -> Result<i32, WorktaskError> {
    let mut store = ctx.open_store()?;
    store.delete(id)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({ "deleted": id })));
    } else {
        println!("Deleted task #{id}");
    }
    Ok(0)
}
