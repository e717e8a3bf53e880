use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WorktaskError};
use crate::models::{NewTask, Priority, TaskStatus};

pub const DEFAULT_TRACKER: &str = "Jira";

/// Body of `POST /jira/import`: an external reference plus an optional
/// task template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub jira_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl ImportRequest {
    pub fn new(jira_id: impl Into<String>) -> Self {
        Self {
            jira_id: jira_id.into(),
            ..Default::default()
        }
    }
}

/// Validate the reference and fill the template defaults: title
/// `"<tracker>: <id>"`, assigned today, medium priority.
pub fn prepare(request: &ImportRequest, tracker: &str, today: NaiveDate) -> Result<ImportRequest> {
    let id = request.jira_id.trim();
    if id.is_empty() {
        return Err(WorktaskError::validation("External issue id is required"));
    }

    let title = match request.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => format!("{tracker}: {id}"),
    };
    let url = request
        .jira_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    Ok(ImportRequest {
        jira_id: id.to_string(),
        jira_url: url,
        title: Some(title),
        description: request.description.clone(),
        priority: Some(request.priority.unwrap_or_default()),
        assigned_date: Some(request.assigned_date.unwrap_or(today)),
        due_date: request.due_date,
    })
}

/// The task an import creates. Imported tasks always start as `todo`.
pub fn to_new_task(request: &ImportRequest, tracker: &str, today: NaiveDate) -> Result<NewTask> {
    let prepared = prepare(request, tracker, today)?;
    Ok(NewTask {
        title: prepared.title.unwrap_or_default(),
        description: prepared.description,
        assigned_date: prepared.assigned_date,
        due_date: prepared.due_date,
        priority: prepared.priority,
        status: Some(TaskStatus::Todo),
        jira_id: Some(prepared.jira_id),
        jira_url: prepared.jira_url,
        notes: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    }

    #[test]
    fn test_defaults_filled() {
        let req = ImportRequest::new("OPS-7");
        let task = to_new_task(&req, DEFAULT_TRACKER, today()).unwrap();
        assert_eq!(task.title, "Jira: OPS-7");
        assert_eq!(task.assigned_date, Some(today()));
        assert_eq!(task.priority, Some(Priority::Medium));
        assert_eq!(task.status, Some(TaskStatus::Todo));
        assert_eq!(task.jira_id.as_deref(), Some("OPS-7"));
        assert_eq!(task.jira_url, None);
    }

    #[test]
    fn test_template_overrides_defaults() {
        let req = ImportRequest {
            jira_id: " OPS-8 ".into(),
            jira_url: Some("https://tracker.example/browse/OPS-8".into()),
            title: Some("Rotate keys".into()),
            priority: Some(Priority::Urgent),
            assigned_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        };
        let task = to_new_task(&req, "Linear", today()).unwrap();
        assert_eq!(task.title, "Rotate keys");
        assert_eq!(task.jira_id.as_deref(), Some("OPS-8"));
        assert_eq!(task.jira_url.as_deref(), Some("https://tracker.example/browse/OPS-8"));
        assert_eq!(task.priority, Some(Priority::Urgent));
        assert_eq!(task.assigned_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_tracker_name_in_default_title() {
        let prepared = prepare(&ImportRequest::new("ENG-1"), "Linear", today()).unwrap();
        assert_eq!(prepared.title.as_deref(), Some("Linear: ENG-1"));
    }

    #[test]
    fn test_blank_id_rejected() {
        let err = prepare(&ImportRequest::new("   "), DEFAULT_TRACKER, today()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ValidationError);
    }
}
