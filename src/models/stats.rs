use serde::{Deserialize, Serialize};

/// Aggregates served by `GET /dashboard/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_tasks: u64,
    pub todo_tasks: u64,
    pub in_progress_tasks: u64,
    pub done_tasks: u64,
    #[serde(default)]
    pub blocked_tasks: u64,
    pub overdue_tasks: u64,
    #[serde(default)]
    pub upcoming_tasks: u64,
    pub total_checklist_items: u64,
    pub completed_checklist_items: u64,
    pub checklist_completion_rate: f64,
}
