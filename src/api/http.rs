use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use crate::error::{Result, WorktaskError};
use crate::import::ImportRequest;
use crate::models::{
    ChecklistItem, ChecklistItemId, ChecklistItemPatch, ChecklistOrder, DashboardStats,
    Dependency, DependencyId, NewChecklistItem, NewTask, Task, TaskFilter, TaskId, TaskPatch,
};

use super::TaskApi;

const USER_AGENT: &str = concat!("worktask/", env!("CARGO_PKG_VERSION"));

/// Client for the task server's JSON API.
#[derive(Debug, Clone)]
pub struct HttpApi {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpApi {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn read<T: DeserializeOwned>(resp: ureq::Response) -> Result<T> {
        resp.into_json()
            .map_err(|e| WorktaskError::remote(format!("Invalid response body: {e}")))
    }
}

/// Map a failed call, turning 404 into the resource-specific error.
fn fail(e: ureq::Error, not_found: impl FnOnce() -> WorktaskError) -> WorktaskError {
    match e {
        ureq::Error::Status(404, _) => not_found(),
        other => WorktaskError::from(other),
    }
}

impl TaskApi for HttpApi {
    #[instrument(skip(self), level = "debug")]
    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut req = self.agent.get(&self.url("/tasks"));
        for (key, value) in filter.query_pairs() {
            req = req.query(key, &value);
        }
        let tasks: Vec<Task> = Self::read(req.call()?)?;
        debug!(count = tasks.len(), "listed tasks");
        Ok(tasks)
    }

    #[instrument(skip(self), level = "debug")]
    fn get_task(&self, id: TaskId) -> Result<Task> {
        let resp = self
            .agent
            .get(&self.url(&format!("/tasks/{id}")))
            .call()
            .map_err(|e| fail(e, || WorktaskError::task_not_found(id)))?;
        let mut task: Task = Self::read(resp)?;
        task.claim_checklist();
        Ok(task)
    }

    #[instrument(skip_all, level = "debug")]
    fn create_task(&self, task: &NewTask) -> Result<Task> {
        let resp = self.agent.post(&self.url("/tasks")).send_json(task)?;
        Self::read(resp)
    }

    #[instrument(skip(self, patch), level = "debug")]
    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        let resp = self
            .agent
            .put(&self.url(&format!("/tasks/{id}")))
            .send_json(patch)
            .map_err(|e| fail(e, || WorktaskError::task_not_found(id)))?;
        Self::read(resp)
    }

    #[instrument(skip(self), level = "debug")]
    fn delete_task(&self, id: TaskId) -> Result<()> {
        self.agent
            .delete(&self.url(&format!("/tasks/{id}")))
            .call()
            .map_err(|e| fail(e, || WorktaskError::task_not_found(id)))?;
        Ok(())
    }

    #[instrument(skip(self, item), level = "debug")]
    fn add_checklist_item(&self, task_id: TaskId, item: &NewChecklistItem) -> Result<ChecklistItem> {
        let resp = self
            .agent
            .post(&self.url(&format!("/tasks/{task_id}/checklist")))
            .send_json(item)
            .map_err(|e| fail(e, || WorktaskError::task_not_found(task_id)))?;
        let mut created: ChecklistItem = Self::read(resp)?;
        created.task_id = task_id;
        Ok(created)
    }

    #[instrument(skip(self, patch), level = "debug")]
    fn update_checklist_item(
        &self,
        item_id: ChecklistItemId,
        patch: &ChecklistItemPatch,
    ) -> Result<ChecklistItem> {
        let resp = self
            .agent
            .put(&self.url(&format!("/checklist/{item_id}")))
            .send_json(patch)
            .map_err(|e| fail(e, || WorktaskError::checklist_item_not_found(item_id)))?;
        Self::read(resp)
    }

    #[instrument(skip(self), level = "debug")]
    fn delete_checklist_item(&self, item_id: ChecklistItemId) -> Result<()> {
        self.agent
            .delete(&self.url(&format!("/checklist/{item_id}")))
            .call()
            .map_err(|e| fail(e, || WorktaskError::checklist_item_not_found(item_id)))?;
        Ok(())
    }

    #[instrument(skip(self, order), fields(items = order.len()), level = "debug")]
    fn reorder_checklist(
        &self,
        task_id: TaskId,
        order: &[ChecklistOrder],
    ) -> Result<Vec<ChecklistItem>> {
        let resp = self
            .agent
            .put(&self.url(&format!("/tasks/{task_id}/checklist/order")))
            .send_json(json!({ "items": order }))
            .map_err(|e| fail(e, || WorktaskError::task_not_found(task_id)))?;
        let mut items: Vec<ChecklistItem> = Self::read(resp)?;
        for item in &mut items {
            item.task_id = task_id;
        }
        Ok(items)
    }

    #[instrument(skip(self), level = "debug")]
    fn add_dependency(&self, task_id: TaskId, depends_on_id: TaskId) -> Result<Dependency> {
        let resp = self
            .agent
            .post(&self.url(&format!("/tasks/{task_id}/dependencies")))
            .send_json(json!({ "depends_on_id": depends_on_id }))
            .map_err(|e| fail(e, || WorktaskError::task_not_found(task_id)))?;
        Self::read(resp)
    }

    #[instrument(skip(self), level = "debug")]
    fn remove_dependency(&self, dependency_id: DependencyId) -> Result<()> {
        self.agent
            .delete(&self.url(&format!("/dependencies/{dependency_id}")))
            .call()
            .map_err(|e| fail(e, || WorktaskError::dependency_not_found(dependency_id)))?;
        Ok(())
    }

    // The server computes against its own clock.
    fn dashboard_stats(&self, _today: NaiveDate) -> Result<DashboardStats> {
        let resp = self.agent.get(&self.url("/dashboard/stats")).call()?;
        Self::read(resp)
    }

    #[instrument(skip_all, fields(jira_id = %request.jira_id), level = "debug")]
    fn import_issue(&self, request: &ImportRequest) -> Result<Task> {
        let resp = self.agent.post(&self.url("/jira/import")).send_json(request)?;
        Self::read(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = HttpApi::new("http://localhost:5000/api/", Duration::from_secs(1));
        assert_eq!(api.base_url(), "http://localhost:5000/api");
        assert_eq!(api.url("/tasks/3"), "http://localhost:5000/api/tasks/3");
    }

    #[test]
    fn test_unreachable_server_is_remote_error() {
        // Port 9 (discard) on localhost is not expected to serve HTTP.
        let api = HttpApi::new("http://127.0.0.1:9/api", Duration::from_millis(500));
        let err = api.list_tasks(&TaskFilter::default()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::RemoteError);
    }

    fn response(status: u16, body: &str) -> ureq::Response {
        ureq::Response::new(status, "OK", body).unwrap()
    }

    #[test]
    fn test_decodes_list_records_with_counts() {
        let body = r#"[{"id": 1, "title": "Deploy", "description": null,
            "assigned_date": "2024-06-15", "due_date": null, "priority": "high",
            "status": "in_progress", "jira_id": null, "jira_url": null, "notes": null,
            "created_at": "2024-06-01T10:00:00", "updated_at": "2024-06-02T10:00:00",
            "checklist_count": 3, "completed_checklist_count": 1}]"#;
        let tasks: Vec<Task> = HttpApi::read(response(200, body)).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, crate::models::TaskStatus::InProgress);
        assert_eq!(tasks[0].checklist_totals(), (1, 3));
        assert!(tasks[0].checklist_items.is_empty());
    }

    #[test]
    fn test_decodes_detail_record() {
        let body = r#"{"id": 5, "title": "Deploy", "priority": "medium", "status": "todo",
            "checklist_items": [
                {"id": 11, "title": "build", "stage": null, "git_branch": null,
                 "completed": true, "order": 0},
                {"id": 12, "title": "ship", "stage": "deployment", "git_branch": "main",
                 "completed": false, "order": 1}
            ],
            "dependencies": [{"id": 2, "title": "A", "status": "todo"}]}"#;
        let mut task: Task = HttpApi::read(response(200, body)).unwrap();
        task.claim_checklist();
        assert!(task.checklist_items.iter().all(|i| i.task_id == 5));
        assert_eq!(task.checklist_items[0].stage, crate::models::Stage::Other);
        assert_eq!(task.checklist_items[1].stage, crate::models::Stage::Deployment);
        assert_eq!(task.dependencies[0].depends_on_id, 2);
        assert_eq!(task.dependencies[0].id, None);
        assert_eq!(task.checklist_totals(), (1, 2));
    }

    #[test]
    fn test_decodes_partial_records() {
        let imported: Task = HttpApi::read(response(
            201,
            r#"{"id": 8, "title": "Jira: ENG-1", "jira_id": "ENG-1", "jira_url": null}"#,
        ))
        .unwrap();
        assert_eq!(imported.jira_id.as_deref(), Some("ENG-1"));
        assert_eq!(imported.status, crate::models::TaskStatus::Todo);

        let updated: Task = HttpApi::read(response(
            200,
            r#"{"id": 8, "title": "renamed", "status": "done", "updated_at": "2024-06-03T09:00:00"}"#,
        ))
        .unwrap();
        assert_eq!(updated.created_at, None);
        assert_eq!(updated.status, crate::models::TaskStatus::Done);

        let dep: Dependency = HttpApi::read(response(
            201,
            r#"{"id": 4, "task_id": 8, "depends_on_id": 2}"#,
        ))
        .unwrap();
        assert_eq!((dep.id, dep.task_id, dep.depends_on_id), (4, 8, 2));
    }

    #[test]
    fn test_malformed_body_is_remote_error() {
        let err = HttpApi::read::<Task>(response(200, "<html>")).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::RemoteError);
    }

    #[test]
    fn test_status_maps_to_resource_errors() {
        use crate::error::ErrorCode;

        let status = |code, body| ureq::Error::Status(code, response(code, body));
        let err = fail(status(404, "{}"), || WorktaskError::checklist_item_not_found(11));
        assert_eq!(err.code, ErrorCode::ChecklistItemNotFound);
        assert_eq!(err.message, "Checklist item not found: 11");

        let err = fail(status(400, r#"{"error": "Title is required"}"#), || {
            WorktaskError::task_not_found(1)
        });
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "Title is required");

        let err = fail(status(409, r#"{"error": "Dependency already exists"}"#), || {
            WorktaskError::task_not_found(1)
        });
        assert_eq!(err.code, ErrorCode::DependencyExists);

        let err = fail(status(500, "boom"), || WorktaskError::task_not_found(1));
        assert_eq!(err.code, ErrorCode::RemoteError);
        assert_eq!(err.message, "HTTP 500: boom");
    }
}
