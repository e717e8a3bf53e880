use chrono::{Days, NaiveDate};
use serde_json::json;

use crate::cli::{finish, Context};
use crate::error::WorktaskError;
use crate::filter;
use crate::models::TaskFilter;
use crate::output;

const DEFAULT_SPAN_DAYS: u64 = 6;

pub fn run(from: Option<NaiveDate>, to: Option<NaiveDate>, ctx: &Context) -> i32 {
    finish(run_inner(from, to, ctx), ctx.json)
}

fn run_inner(from: Option<NaiveDate>, to: Option<NaiveDate>, ctx: &Context) -> Result<i32, WorktaskError> {
    let mut store = ctx.open_store()?;
    let today = store.today();
    let from = from.unwrap_or(today);
    let to = match to {
        Some(to) => to,
        None => from
            .checked_add_days(Days::new(DEFAULT_SPAN_DAYS))
            .ok_or_else(|| WorktaskError::validation("Date range out of bounds"))?,
    };
    if to < from {
        return Err(WorktaskError::validation(format!(
            "Calendar range is empty: {from} is after {to}"
        )));
    }

    let range = TaskFilter {
        date_from: Some(from),
        date_to: Some(to),
        ..Default::default()
    };
    let tasks = store.list(&range)?;
    let days = filter::agenda(tasks, from, to);

    if ctx.json {
        output::json::print(&output::json::success(json!({
            "from": from,
            "to": to,
            "days": output::json::agenda_json(&days, today)
        })));
    } else {
        output::text::print_agenda(&days, today);
    }
    Ok(0)
}
