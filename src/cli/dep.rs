use serde_json::json;

use crate::cli::commands::DepCommands;
use crate::cli::{finish, Context};
use crate::error::WorktaskError;
use crate::output;

pub fn run(cmd: DepCommands, ctx: &Context) -> i32 {
    finish(run_inner(cmd, ctx), ctx.json)
}

fn run_inner(cmd: DepCommands, ctx: &Context) -> Result<i32, WorktaskError> {
    let mut store = ctx.open_store()?;

    match cmd {
        DepCommands::Add {
            task_id,
            depends_on_id,
        } => {
            let dep = store.add_dependency(task_id, depends_on_id)?;
            if ctx.json {
                output::json::print(&output::json::success(json!({
                    "dependency": output::json::dependency_json(&dep)
                })));
            } else {
                println!(
                    "Added dependency #{}: task #{task_id} depends on #{depends_on_id}",
                    dep.id
                );
            }
        }
        DepCommands::Remove { dependency_id } => {
            store.remove_dependency(dependency_id)?;
            if ctx.json {
                output::json::print(&output::json::success(json!({ "removed": dependency_id })));
            } else {
                println!("Removed dependency #{dependency_id}");
            }
        }
    }
    Ok(0)
}
