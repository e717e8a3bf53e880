use serde::{Deserialize, Deserializer, Serialize};

use super::TaskId;

pub type ChecklistItemId = i64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Development,
    Testing,
    Merge,
    Deployment,
    #[default]
    Other,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Merge => "merge",
            Self::Deployment => "deployment",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "development" => Some(Self::Development),
            "testing" => Some(Self::Testing),
            "merge" => Some(Self::Merge),
            "deployment" => Some(Self::Deployment),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Stage as sent by the server: `null`, a missing field, or a name we do
/// not know all read as [`Stage::Other`].
fn stage_or_other<'de, D: Deserializer<'de>>(de: D) -> Result<Stage, D::Error> {
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.as_deref().and_then(Stage::from_str).unwrap_or_default())
}

/// The server omits `task_id` on item payloads; it reads as 0 until the
/// caller fills in the owning task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    #[serde(default)]
    pub task_id: TaskId,
    pub title: String,
    #[serde(default, deserialize_with = "stage_or_other")]
    pub stage: Stage,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub order: i64,
}

/// Payload for `POST /tasks/{id}/checklist`. The server assigns `order`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChecklistItem {
    pub title: String,
    #[serde(default)]
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl NewChecklistItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Payload for `PUT /checklist/{id}`. Positions are not patchable here;
/// they only change through the batch reorder, which keeps them unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChecklistItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ChecklistItemPatch {
    pub fn completed(done: bool) -> Self {
        Self {
            completed: Some(done),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, item: &mut ChecklistItem) {
        if let Some(ref title) = self.title {
            item.title = title.clone();
        }
        if let Some(stage) = self.stage {
            item.stage = stage;
        }
        if let Some(ref branch) = self.git_branch {
            item.git_branch = branch.clone();
        }
        if let Some(done) = self.completed {
            item.completed = done;
        }
    }
}

/// One entry of a batch reorder: `PUT /tasks/{id}/checklist/order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistOrder {
    pub id: ChecklistItemId,
    pub order: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_item_without_task_id() {
        let json = r#"{"id": 7, "title": "build image", "stage": "testing",
                       "git_branch": null, "completed": true, "order": 2}"#;
        let item: ChecklistItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, 7);
        assert_eq!(item.task_id, 0);
        assert_eq!(item.stage, Stage::Testing);
        assert!(item.completed);
        assert_eq!(item.order, 2);
    }

    #[test]
    fn test_null_or_unknown_stage_reads_as_other() {
        for stage in ["null", "\"etc\""] {
            let json = format!(r#"{{"id": 1, "title": "x", "stage": {stage}, "completed": false, "order": 0}}"#);
            let item: ChecklistItem = serde_json::from_str(&json).unwrap();
            assert_eq!(item.stage, Stage::Other, "stage {stage}");
        }
        let item: ChecklistItem = serde_json::from_str(r#"{"id": 1, "title": "x"}"#).unwrap();
        assert_eq!(item.stage, Stage::Other);
    }

    #[test]
    fn test_patch_has_no_position() {
        let patch = ChecklistItemPatch {
            title: Some("y".into()),
            ..ChecklistItemPatch::completed(true)
        };
        let v = serde_json::to_value(&patch).unwrap();
        assert_eq!(v, serde_json::json!({"title": "y", "completed": true}));
    }
}
