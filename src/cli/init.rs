use serde_json::json;

use crate::cli::{finish, Context};
use crate::config::Backend;
use crate::db::connection;
use crate::error::WorktaskError;
use crate::output;

pub fn run(ctx: &Context) -> i32 {
    finish(run_inner(ctx), ctx.json)
}

fn run_inner(ctx: &Context) -> Result<i32, WorktaskError> {
    let path = match ctx.settings()?.backend {
        Backend::Sqlite { path } => path,
        Backend::Http { base_url, .. } => {
            return Err(WorktaskError::config(format!(
                "Nothing to initialize: tasks are served by {base_url}"
            )));
        }
    };
    let path = connection::init_db(&path)?;

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "path": path.to_string_lossy()
        })));
    } else {
        println!("Initialized worktask at {}", path.display());
    }
    Ok(0)
}
