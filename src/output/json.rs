use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::error::WorktaskError;
use crate::metrics;
use crate::models::{ChecklistItem, DashboardStats, Dependency, DependencyRef, Task};

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &WorktaskError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    })
}

pub fn print(value: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// List-view shape: scalar fields plus counts and derived flags.
pub fn task_summary(t: &Task, today: NaiveDate) -> Value {
    let (done, total) = t.checklist_totals();
    json!({
        "id": t.id,
        "title": t.title,
        "status": t.status.as_str(),
        "priority": t.priority.as_str(),
        "assigned_date": t.assigned_date,
        "due_date": t.due_date,
        "jira_id": t.jira_id,
        "checklist_count": total,
        "completed_checklist_count": done,
        "progress": round1(metrics::progress(t)),
        "overdue": metrics::is_overdue(t, today),
        "upcoming": metrics::is_upcoming(t, today)
    })
}

pub fn task_detail(t: &Task, today: NaiveDate) -> Value {
    let mut v = task_summary(t, today);
    v["description"] = json!(t.description);
    v["jira_url"] = json!(t.jira_url);
    v["notes"] = json!(t.notes);
    v["created_at"] = json!(t.created_at);
    v["updated_at"] = json!(t.updated_at);
    v["checklist_items"] = json!(t.checklist_items.iter().map(checklist_item_json).collect::<Vec<_>>());
    v["dependencies"] = json!(t.dependencies.iter().map(dependency_ref_json).collect::<Vec<_>>());
    v
}

pub fn checklist_item_json(i: &ChecklistItem) -> Value {
    json!({
        "id": i.id,
        "task_id": i.task_id,
        "title": i.title,
        "stage": i.stage.as_str(),
        "git_branch": i.git_branch,
        "completed": i.completed,
        "order": i.order
    })
}

pub fn dependency_json(d: &Dependency) -> Value {
    json!({
        "id": d.id,
        "task_id": d.task_id,
        "depends_on_id": d.depends_on_id
    })
}

pub fn dependency_ref_json(d: &DependencyRef) -> Value {
    json!({
        "id": d.id,
        "depends_on_id": d.depends_on_id,
        "title": d.title,
        "status": d.status.as_str()
    })
}

pub fn stats_json(s: &DashboardStats) -> Value {
    json!({
        "total_tasks": s.total_tasks,
        "todo_tasks": s.todo_tasks,
        "in_progress_tasks": s.in_progress_tasks,
        "done_tasks": s.done_tasks,
        "blocked_tasks": s.blocked_tasks,
        "overdue_tasks": s.overdue_tasks,
        "upcoming_tasks": s.upcoming_tasks,
        "total_checklist_items": s.total_checklist_items,
        "completed_checklist_items": s.completed_checklist_items,
        "checklist_completion_rate": round1(s.checklist_completion_rate)
    })
}

pub fn agenda_json(days: &BTreeMap<NaiveDate, Vec<&Task>>, today: NaiveDate) -> Value {
    let days: Vec<Value> = days
        .iter()
        .map(|(date, tasks)| {
            json!({
                "date": date,
                "tasks": tasks.iter().map(|t| task_summary(t, today)).collect::<Vec<_>>()
            })
        })
        .collect();
    json!(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_error_envelope() {
        let v = error(&WorktaskError::new(ErrorCode::TaskNotFound, "Task not found: 3"));
        assert_eq!(v["success"], false);
        assert_eq!(v["error"]["code"], "TASK_NOT_FOUND");
        assert_eq!(v["error"]["message"], "Task not found: 3");
    }

    #[test]
    fn test_stats_rate_rounded() {
        let s = DashboardStats {
            checklist_completion_rate: 100.0 / 3.0,
            ..Default::default()
        };
        assert_eq!(stats_json(&s)["checklist_completion_rate"], 33.3);
    }
}
