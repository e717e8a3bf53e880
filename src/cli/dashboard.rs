use serde_json::json;

use crate::cli::{finish, Context};
use crate::error::WorktaskError;
use crate::output;

pub fn run(ctx: &Context) -> i32 {
    finish(run_inner(ctx), ctx.json)
}

fn run_inner(ctx: &Context) -> Result<i32, WorktaskError> {
    let store = ctx.open_store()?;
    let stats = store.dashboard_stats()?;

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "stats": output::json::stats_json(&stats)
        })));
    } else {
        output::text::print_stats(&stats);
    }
    Ok(0)
}
