use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ChecklistItem, DependencyRef};

pub type TaskId = i64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Blocked,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [Self::Todo, Self::InProgress, Self::Done, Self::Blocked];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Blocked => "blocked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }

    /// Urgent sorts first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Urgent => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

/// A task as returned by the API.
///
/// List records carry the checklist counts but leave `checklist_items` and
/// `dependencies` empty; detail records carry both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub jira_id: Option<String>,
    #[serde(default)]
    pub jira_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub checklist_count: u32,
    #[serde(default)]
    pub completed_checklist_count: u32,
    #[serde(default)]
    pub checklist_items: Vec<ChecklistItem>,
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
}

impl Task {
    /// Checklist totals as `(completed, total)`, preferring the nested items
    /// when the record carries them.
    pub fn checklist_totals(&self) -> (u32, u32) {
        if self.checklist_items.is_empty() {
            let total = self.checklist_count;
            (self.completed_checklist_count.min(total), total)
        } else {
            let total = self.checklist_items.len() as u32;
            let done = self.checklist_items.iter().filter(|c| c.completed).count() as u32;
            (done, total)
        }
    }

    /// Stamp the owning task on nested checklist items, which the server
    /// sends without it.
    pub fn claim_checklist(&mut self) {
        for item in &mut self.checklist_items {
            item.task_id = self.id;
        }
    }

    /// Recompute the count fields from the nested checklist.
    pub fn sync_checklist_counts(&mut self) {
        self.checklist_count = self.checklist_items.len() as u32;
        self.completed_checklist_count =
            self.checklist_items.iter().filter(|c| c.completed).count() as u32;
    }
}

/// Payload for `POST /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Payload for `PUT /tasks/{id}`: only the fields that are `Some` change.
///
/// Clearable fields use `Option<Option<T>>`: `Some(None)` is sent as `null`
/// and clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge this patch into `task` in place.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(ref v) = self.description {
            task.description = v.clone();
        }
        if let Some(v) = self.assigned_date {
            task.assigned_date = v;
        }
        if let Some(v) = self.due_date {
            task.due_date = v;
        }
        if let Some(v) = self.priority {
            task.priority = v;
        }
        if let Some(v) = self.status {
            task.status = v;
        }
        if let Some(ref v) = self.jira_id {
            task.jira_id = v.clone();
        }
        if let Some(ref v) = self.jira_url {
            task.jira_url = v.clone();
        }
        if let Some(ref v) = self.notes {
            task.notes = v.clone();
        }
    }
}

/// Structured list query for `GET /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.search.as_deref().map_or(true, |s| s.trim().is_empty())
    }

    /// Query-string pairs in the order the server documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(s) = self.status {
            pairs.push(("status", s.as_str().to_string()));
        }
        if let Some(p) = self.priority {
            pairs.push(("priority", p.as_str().to_string()));
        }
        if let Some(d) = self.date_from {
            pairs.push(("date_from", d.to_string()));
        }
        if let Some(d) = self.date_to {
            pairs.push(("date_to", d.to_string()));
        }
        if let Some(ref q) = self.search {
            if !q.trim().is_empty() {
                pairs.push(("search", q.clone()));
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_wire_names() {
        for s in TaskStatus::ALL {
            assert_eq!(TaskStatus::from_str(s.as_str()), Some(s));
        }
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(TaskStatus::from_str("cancelled"), None);
    }

    #[test]
    fn test_defaults_on_missing_fields() {
        let t: Task = serde_json::from_str(r#"{"id": 3, "title": "x"}"#).unwrap();
        assert_eq!(t.status, TaskStatus::Todo);
        assert_eq!(t.priority, Priority::Medium);
        assert!(t.checklist_items.is_empty());
    }

    #[test]
    fn test_dates_parse_iso() {
        let t: Task =
            serde_json::from_str(r#"{"id": 1, "title": "x", "due_date": "2024-03-09"}"#).unwrap();
        assert_eq!(t.due_date, NaiveDate::from_ymd_opt(2024, 3, 9));
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = TaskPatch {
            status: Some(TaskStatus::Done),
            due_date: Some(None),
            ..Default::default()
        };
        let v = serde_json::to_value(&patch).unwrap();
        assert_eq!(v, serde_json::json!({"status": "done", "due_date": null}));
    }

    #[test]
    fn test_patch_apply_merges() {
        let mut t: Task = serde_json::from_str(
            r#"{"id": 1, "title": "a", "notes": "n", "due_date": "2024-01-01"}"#,
        )
        .unwrap();
        TaskPatch {
            title: Some("b".into()),
            due_date: Some(None),
            ..Default::default()
        }
        .apply_to(&mut t);
        assert_eq!(t.title, "b");
        assert_eq!(t.due_date, None);
        assert_eq!(t.notes.as_deref(), Some("n"));
    }

    #[test]
    fn test_filter_query_pairs_skip_blank_search() {
        let f = TaskFilter {
            priority: Some(Priority::High),
            search: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(f.query_pairs(), vec![("priority", "high".to_string())]);
        assert!(!f.is_empty());
        assert!(TaskFilter::default().is_empty());
    }
}
