use std::path::Path;

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::api::TaskApi;
use crate::error::Result;
use crate::graph::cycle;
use crate::import::{self, ImportRequest, DEFAULT_TRACKER};
use crate::models::{
    ChecklistItem, ChecklistItemId, ChecklistItemPatch, ChecklistOrder, DashboardStats,
    Dependency, DependencyId, NewChecklistItem, NewTask, Task, TaskFilter, TaskId, TaskPatch,
};

use super::{checklist_repo, connection, dependency_repo, task_repo};

/// The task API served from a local SQLite file.
pub struct SqliteApi {
    conn: Connection,
    tracker: String,
}

impl SqliteApi {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_connection(connection::open_db(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            tracker: DEFAULT_TRACKER.to_string(),
        }
    }

    /// Tracker name used in default import titles.
    pub fn with_tracker(mut self, tracker: impl Into<String>) -> Self {
        self.tracker = tracker.into();
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl TaskApi for SqliteApi {
    fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        task_repo::list_tasks(&self.conn, filter)
    }

    fn get_task(&self, id: TaskId) -> Result<Task> {
        task_repo::get_task_detail(&self.conn, id)
    }

    fn create_task(&self, task: &NewTask) -> Result<Task> {
        let created = task_repo::create_task(&self.conn, task)?;
        debug!(id = created.id, "created task");
        Ok(created)
    }

    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        task_repo::update_task(&self.conn, id, patch)
    }

    fn delete_task(&self, id: TaskId) -> Result<()> {
        let edges = dependency_repo::edges_touching(&self.conn, id)?;
        task_repo::delete_task(&self.conn, id)?;
        debug!(id, edges, "deleted task");
        Ok(())
    }

    fn add_checklist_item(&self, task_id: TaskId, item: &NewChecklistItem) -> Result<ChecklistItem> {
        checklist_repo::add_item(&self.conn, task_id, item)
    }

    fn update_checklist_item(
        &self,
        item_id: ChecklistItemId,
        patch: &ChecklistItemPatch,
    ) -> Result<ChecklistItem> {
        checklist_repo::update_item(&self.conn, item_id, patch)
    }

    fn delete_checklist_item(&self, item_id: ChecklistItemId) -> Result<()> {
        checklist_repo::delete_item(&self.conn, item_id)
    }

    fn reorder_checklist(
        &self,
        task_id: TaskId,
        order: &[ChecklistOrder],
    ) -> Result<Vec<ChecklistItem>> {
        checklist_repo::reorder_items(&self.conn, task_id, order)
    }

    fn add_dependency(&self, task_id: TaskId, depends_on_id: TaskId) -> Result<Dependency> {
        let existing = dependency_repo::all_edges(&self.conn)?;
        let dep = dependency_repo::add_dependency(&self.conn, task_id, depends_on_id)?;
        // Cycles are allowed; surface them so the user can untangle them.
        if let Some(path) = cycle::would_create_cycle(&existing, task_id, depends_on_id) {
            warn!(task_id, depends_on_id, cycle = ?path, "dependency closes a cycle");
        }
        Ok(dep)
    }

    fn remove_dependency(&self, dependency_id: DependencyId) -> Result<()> {
        dependency_repo::remove_dependency(&self.conn, dependency_id)
    }

    fn dashboard_stats(&self, today: NaiveDate) -> Result<DashboardStats> {
        task_repo::dashboard_stats(&self.conn, today)
    }

    fn import_issue(&self, request: &ImportRequest) -> Result<Task> {
        let today = chrono::Local::now().date_naive();
        let task = import::to_new_task(request, &self.tracker, today)?;
        task_repo::create_task(&self.conn, &task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::metrics;
    use crate::models::{Priority, Stage, TaskStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn api() -> SqliteApi {
        SqliteApi::open_in_memory().unwrap()
    }

    fn add(api: &SqliteApi, title: &str) -> Task {
        api.create_task(&NewTask::new(title)).unwrap()
    }

    #[test]
    fn test_create_applies_defaults() {
        let api = api();
        let t = add(&api, "  Deploy v2 ");
        assert_eq!(t.title, "Deploy v2");
        assert_eq!(t.status, TaskStatus::Todo);
        assert_eq!(t.priority, Priority::Medium);
        assert!(t.created_at.is_some());
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let err = api().create_task(&NewTask::new(" ")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_get_missing_task() {
        let err = api().get_task(99).unwrap_err();
        assert_eq!(err.code, ErrorCode::TaskNotFound);
    }

    #[test]
    fn test_update_merges_partial_fields() {
        let api = api();
        let t = api
            .create_task(&NewTask {
                title: "A".into(),
                notes: Some("keep me".into()),
                due_date: Some(date(2024, 1, 2)),
                ..Default::default()
            })
            .unwrap();
        let updated = api
            .update_task(
                t.id,
                &TaskPatch {
                    status: Some(TaskStatus::InProgress),
                    due_date: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.due_date, None);
        assert_eq!(updated.notes.as_deref(), Some("keep me"));
        assert_eq!(updated.title, "A");
    }

    #[test]
    fn test_checklist_appends_in_order() {
        let api = api();
        let t = add(&api, "A");
        let first = api.add_checklist_item(t.id, &NewChecklistItem::new("build")).unwrap();
        let second = api
            .add_checklist_item(
                t.id,
                &NewChecklistItem {
                    title: "ship".into(),
                    stage: Stage::Deployment,
                    git_branch: Some("release/2".into()),
                    completed: false,
                },
            )
            .unwrap();
        assert_eq!(first.order, 0);
        assert_eq!(second.order, 1);
        assert_eq!(second.stage, Stage::Deployment);

        let detail = api.get_task(t.id).unwrap();
        assert_eq!(detail.checklist_count, 2);
        assert_eq!(detail.checklist_items[1].git_branch.as_deref(), Some("release/2"));
    }

    #[test]
    fn test_checklist_on_missing_task() {
        let err = api().add_checklist_item(5, &NewChecklistItem::new("x")).unwrap_err();
        assert_eq!(err.code, ErrorCode::TaskNotFound);
    }

    #[test]
    fn test_list_counts_completed_items() {
        let api = api();
        let t = add(&api, "A");
        let item = api.add_checklist_item(t.id, &NewChecklistItem::new("one")).unwrap();
        api.add_checklist_item(t.id, &NewChecklistItem::new("two")).unwrap();
        api.update_checklist_item(item.id, &ChecklistItemPatch::completed(true)).unwrap();

        let listed = api.list_tasks(&TaskFilter::default()).unwrap();
        assert_eq!(listed[0].checklist_count, 2);
        assert_eq!(listed[0].completed_checklist_count, 1);
        assert_eq!(metrics::progress(&listed[0]), 50.0);
    }

    #[test]
    fn test_list_filters_and_orders() {
        let api = api();
        for (title, assigned, priority) in [
            ("late", Some(date(2024, 3, 9)), Priority::Low),
            ("none", None, Priority::Urgent),
            ("early-low", Some(date(2024, 3, 1)), Priority::Low),
            ("early-high", Some(date(2024, 3, 1)), Priority::High),
        ] {
            api.create_task(&NewTask {
                title: title.into(),
                assigned_date: assigned,
                priority: Some(priority),
                ..Default::default()
            })
            .unwrap();
        }

        let all: Vec<String> = api
            .list_tasks(&TaskFilter::default())
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(all, vec!["early-high", "early-low", "late", "none"]);

        let ranged = api
            .list_tasks(&TaskFilter {
                date_from: Some(date(2024, 3, 2)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].title, "late");

        let searched = api
            .list_tasks(&TaskFilter {
                search: Some("EARLY".into()),
                priority: Some(Priority::Low),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].title, "early-low");
    }

    #[test]
    fn test_item_update_keeps_positions_unique() {
        let api = api();
        let t = add(&api, "A");
        let a = api.add_checklist_item(t.id, &NewChecklistItem::new("a")).unwrap();
        let b = api.add_checklist_item(t.id, &NewChecklistItem::new("b")).unwrap();

        let updated = api
            .update_checklist_item(
                b.id,
                &ChecklistItemPatch {
                    title: Some("b2".into()),
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.order, 1);

        let orders: Vec<_> = api
            .get_task(t.id)
            .unwrap()
            .checklist_items
            .iter()
            .map(|i| (i.id, i.order))
            .collect();
        assert_eq!(orders, vec![(a.id, 0), (b.id, 1)]);

        // Duplicate positions in a batch are refused outright.
        let err = api
            .reorder_checklist(
                t.id,
                &[ChecklistOrder { id: a.id, order: 0 }, ChecklistOrder { id: b.id, order: 0 }],
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_reorder_is_atomic() {
        let api = api();
        let t = add(&api, "A");
        let ids: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|n| api.add_checklist_item(t.id, &NewChecklistItem::new(*n)).unwrap().id)
            .collect();

        // Missing one item: rejected, nothing written.
        let err = api
            .reorder_checklist(
                t.id,
                &[ChecklistOrder { id: ids[2], order: 0 }, ChecklistOrder { id: ids[0], order: 1 }],
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let orders: Vec<_> = api.get_task(t.id).unwrap().checklist_items.iter().map(|i| i.id).collect();
        assert_eq!(orders, ids);

        let items = api
            .reorder_checklist(
                t.id,
                &[
                    ChecklistOrder { id: ids[2], order: 0 },
                    ChecklistOrder { id: ids[0], order: 1 },
                    ChecklistOrder { id: ids[1], order: 2 },
                ],
            )
            .unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_dependency_rules() {
        let api = api();
        let a = add(&api, "A");
        let b = add(&api, "B");

        let err = api.add_dependency(a.id, a.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = api.add_dependency(a.id, 404).unwrap_err();
        assert_eq!(err.code, ErrorCode::TaskNotFound);

        let dep = api.add_dependency(b.id, a.id).unwrap();
        assert_eq!(dep.task_id, b.id);
        assert_eq!(dep.depends_on_id, a.id);

        let err = api.add_dependency(b.id, a.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::DependencyExists);

        // A cycle is allowed.
        api.add_dependency(a.id, b.id).unwrap();

        let detail = api.get_task(b.id).unwrap();
        assert_eq!(detail.dependencies.len(), 1);
        assert_eq!(detail.dependencies[0].id, Some(dep.id));
        assert_eq!(detail.dependencies[0].depends_on_id, a.id);
        assert_eq!(detail.dependencies[0].title, "A");

        api.remove_dependency(dep.id).unwrap();
        let err = api.remove_dependency(dep.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::DependencyNotFound);
    }

    #[test]
    fn test_delete_cascades() {
        let api = api();
        let a = add(&api, "A");
        let b = add(&api, "B");
        let c = add(&api, "C");
        api.add_checklist_item(a.id, &NewChecklistItem::new("x")).unwrap();
        api.add_dependency(b.id, a.id).unwrap();
        api.add_dependency(a.id, c.id).unwrap();

        api.delete_task(a.id).unwrap();

        let conn = api.connection();
        let items: i64 = conn
            .query_row("SELECT COUNT(*) FROM checklist_items", [], |r| r.get(0))
            .unwrap();
        assert_eq!(items, 0);
        assert!(dependency_repo::all_edges(conn).unwrap().is_empty());
        assert!(api.get_task(b.id).unwrap().dependencies.is_empty());

        let err = api.delete_task(a.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::TaskNotFound);
    }

    #[test]
    fn test_dashboard_stats_matches_client_metrics() {
        let api = api();
        let today = date(2024, 6, 15);
        let overdue = api
            .create_task(&NewTask {
                title: "late".into(),
                due_date: Some(date(2024, 6, 1)),
                assigned_date: Some(date(2024, 6, 20)),
                ..Default::default()
            })
            .unwrap();
        api.create_task(&NewTask {
            title: "finished".into(),
            status: Some(TaskStatus::Done),
            due_date: Some(date(2024, 6, 1)),
            ..Default::default()
        })
        .unwrap();
        let item = api.add_checklist_item(overdue.id, &NewChecklistItem::new("x")).unwrap();
        api.add_checklist_item(overdue.id, &NewChecklistItem::new("y")).unwrap();
        api.update_checklist_item(item.id, &ChecklistItemPatch::completed(true)).unwrap();

        let server = api.dashboard_stats(today).unwrap();
        let tasks = api.list_tasks(&TaskFilter::default()).unwrap();
        let client = metrics::dashboard_stats(&tasks, today);
        assert_eq!(server, client);
        assert_eq!(server.overdue_tasks, 1);
        assert_eq!(server.upcoming_tasks, 1);
        assert_eq!(server.checklist_completion_rate, 50.0);
    }

    #[test]
    fn test_dashboard_stats_empty() {
        let stats = api().dashboard_stats(date(2024, 1, 1)).unwrap();
        assert_eq!(stats, DashboardStats::default());
    }

    #[test]
    fn test_import_creates_linked_task() {
        let api = api().with_tracker("Linear");
        let t = api
            .import_issue(&ImportRequest {
                jira_id: "ENG-5".into(),
                jira_url: Some("https://linear.example/ENG-5".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(t.title, "Linear: ENG-5");
        assert_eq!(t.jira_id.as_deref(), Some("ENG-5"));
        assert_eq!(t.status, TaskStatus::Todo);
        assert!(t.assigned_date.is_some());

        let err = api.import_issue(&ImportRequest::new("")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
