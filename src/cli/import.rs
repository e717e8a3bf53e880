use serde_json::json;
use tracing::info;

use crate::cli::{finish, Context};
use crate::error::WorktaskError;
use crate::import::ImportRequest;
use crate::output;

pub fn run(request: ImportRequest, ctx: &Context) -> i32 {
    finish(run_inner(&request, ctx), ctx.json)
}

fn run_inner(request: &ImportRequest, ctx: &Context) -> Result<i32, WorktaskError> {
    let mut store = ctx.open_store()?;
    let task = store.import_issue(request)?;
    info!(id = task.id, jira_id = ?task.jira_id, "issue imported");

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "task": output::json::task_detail(&task, store.today())
        })));
    } else {
        println!("Imported {} as task #{}: {}", request.jira_id.trim(), task.id, task.title);
    }
    Ok(0)
}
