//! The REST contract the store consumes, and its backends.
//!
//! [`TaskApi`] mirrors the server's resources one method per endpoint.
//! [`HttpApi`] talks to a running server; [`crate::db::SqliteApi`] serves
//! the same contract from a local database file.

pub mod http;

use chrono::NaiveDate;

use crate::error::Result;
use crate::import::ImportRequest;
use crate::models::{
    ChecklistItem, ChecklistItemId, ChecklistItemPatch, ChecklistOrder, DashboardStats,
    Dependency, DependencyId, NewChecklistItem, NewTask, Task, TaskFilter, TaskId, TaskPatch,
};

pub use http::HttpApi;

pub trait TaskApi {
    /// `GET /tasks`
    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>>;
    /// `GET /tasks/{id}`, with checklist items and dependencies.
    fn get_task(&self, id: TaskId) -> Result<Task>;
    /// `POST /tasks`
    fn create_task(&self, task: &NewTask) -> Result<Task>;
    /// `PUT /tasks/{id}`
    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task>;
    /// `DELETE /tasks/{id}`
    fn delete_task(&self, id: TaskId) -> Result<()>;

    /// `POST /tasks/{id}/checklist`
    fn add_checklist_item(&self, task_id: TaskId, item: &NewChecklistItem) -> Result<ChecklistItem>;
    /// `PUT /checklist/{id}`
    fn update_checklist_item(
        &self,
        item_id: ChecklistItemId,
        patch: &ChecklistItemPatch,
    ) -> Result<ChecklistItem>;
    /// `DELETE /checklist/{id}`
    fn delete_checklist_item(&self, item_id: ChecklistItemId) -> Result<()>;
    /// `PUT /tasks/{id}/checklist/order`: all or nothing.
    fn reorder_checklist(&self, task_id: TaskId, order: &[ChecklistOrder])
        -> Result<Vec<ChecklistItem>>;

    /// `POST /tasks/{id}/dependencies`
    fn add_dependency(&self, task_id: TaskId, depends_on_id: TaskId) -> Result<Dependency>;
    /// `DELETE /dependencies/{id}`
    fn remove_dependency(&self, dependency_id: DependencyId) -> Result<()>;

    /// `GET /dashboard/stats`
    fn dashboard_stats(&self, today: NaiveDate) -> Result<DashboardStats>;
    /// `POST /jira/import`
    fn import_issue(&self, request: &ImportRequest) -> Result<Task>;
}

impl<T: TaskApi + ?Sized> TaskApi for Box<T> {
    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        (**self).list_tasks(filter)
    }

    fn get_task(&self, id: TaskId) -> Result<Task> {
        (**self).get_task(id)
    }

    fn create_task(&self, task: &NewTask) -> Result<Task> {
        (**self).create_task(task)
    }

    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        (**self).update_task(id, patch)
    }

    fn delete_task(&self, id: TaskId) -> Result<()> {
        (**self).delete_task(id)
    }

    fn add_checklist_item(&self, task_id: TaskId, item: &NewChecklistItem) -> Result<ChecklistItem> {
        (**self).add_checklist_item(task_id, item)
    }

    fn update_checklist_item(
        &self,
        item_id: ChecklistItemId,
        patch: &ChecklistItemPatch,
    ) -> Result<ChecklistItem> {
        (**self).update_checklist_item(item_id, patch)
    }

    fn delete_checklist_item(&self, item_id: ChecklistItemId) -> Result<()> {
        (**self).delete_checklist_item(item_id)
    }

    fn reorder_checklist(
        &self,
        task_id: TaskId,
        order: &[ChecklistOrder],
    ) -> Result<Vec<ChecklistItem>> {
        (**self).reorder_checklist(task_id, order)
    }

    fn add_dependency(&self, task_id: TaskId, depends_on_id: TaskId) -> Result<Dependency> {
        (**self).add_dependency(task_id, depends_on_id)
    }

    fn remove_dependency(&self, dependency_id: DependencyId) -> Result<()> {
        (**self).remove_dependency(dependency_id)
    }

    fn dashboard_stats(&self, today: NaiveDate) -> Result<DashboardStats> {
        (**self).dashboard_stats(today)
    }

    fn import_issue(&self, request: &ImportRequest) -> Result<Task> {
        (**self).import_issue(request)
    }
}
