//! Client-side cache over a [`TaskApi`].
//!
//! One store backs every view. Mutations go to the backend first; only a
//! successful response touches the cache, so a failed call leaves the
//! store exactly as it was. After a mutation the store folds in what the
//! response tells it, marks the list snapshot stale, and notifies
//! subscribers so views can recompute their derived state.

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::api::TaskApi;
use crate::error::{Result, WorktaskError};
use crate::filter;
use crate::graph::cycle;
use crate::import::{self, ImportRequest, DEFAULT_TRACKER};
use crate::metrics;
use crate::models::{
    ChecklistItem, ChecklistItemId, ChecklistItemPatch, DashboardStats, Dependency,
    DependencyId, DependencyRef, NewChecklistItem, NewTask, Task, TaskFilter, TaskId, TaskPatch,
    TaskStatus,
};
use crate::reorder;

/// What changed, for subscribers deciding what to recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    ListRefreshed,
    TaskCreated(TaskId),
    TaskUpdated(TaskId),
    TaskDeleted(TaskId),
    ChecklistChanged(TaskId),
    DependenciesChanged(TaskId),
    /// A mutation succeeded on an entity this store had not loaded. Cached
    /// views may be out of date and should be refetched.
    CacheInvalidated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent)>;

struct ListSnapshot {
    filter: TaskFilter,
    tasks: Vec<Task>,
    stale: bool,
}

pub struct TaskStore<A: TaskApi> {
    api: A,
    tracker: String,
    today: Option<NaiveDate>,
    list: Option<ListSnapshot>,
    details: HashMap<TaskId, Task>,
    item_owner: HashMap<ChecklistItemId, TaskId>,
    /// Edge id to `(task, prerequisite)`.
    dependency_owner: HashMap<DependencyId, (TaskId, TaskId)>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<A: TaskApi> TaskStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            tracker: DEFAULT_TRACKER.to_string(),
            today: None,
            list: None,
            details: HashMap::new(),
            item_owner: HashMap::new(),
            dependency_owner: HashMap::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Tracker name used for default import titles.
    pub fn with_tracker(mut self, tracker: impl Into<String>) -> Self {
        self.tracker = tracker.into();
        self
    }

    /// Pin "today" instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    // --- subscriptions ---

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drop a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        before != self.listeners.len()
    }

    fn emit(&mut self, event: StoreEvent) {
        debug!(?event, listeners = self.listeners.len(), "store event");
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    // --- reads ---

    /// The task list for `filter`, served from cache while it is fresh.
    pub fn list(&mut self, filter: &TaskFilter) -> Result<&[Task]> {
        let fresh = self
            .list
            .as_ref()
            .is_some_and(|s| !s.stale && s.filter == *filter);
        if !fresh {
            self.refresh(filter)?;
        }
        Ok(self.list.as_ref().map(|s| s.tasks.as_slice()).unwrap_or_default())
    }

    /// Refetch the list unconditionally.
    pub fn refresh(&mut self, filter: &TaskFilter) -> Result<&[Task]> {
        let tasks = self.api.list_tasks(filter)?;
        debug!(count = tasks.len(), "list refreshed");
        self.list = Some(ListSnapshot {
            filter: filter.clone(),
            tasks,
            stale: false,
        });
        self.emit(StoreEvent::ListRefreshed);
        Ok(self.list.as_ref().map(|s| s.tasks.as_slice()).unwrap_or_default())
    }

    /// The last fetched list, even if stale.
    pub fn cached_list(&self) -> Option<&[Task]> {
        self.list.as_ref().map(|s| s.tasks.as_slice())
    }

    pub fn is_list_stale(&self) -> bool {
        self.list.as_ref().map_or(true, |s| s.stale)
    }

    /// A task with its checklist and dependencies.
    pub fn get_by_id(&mut self, id: TaskId) -> Result<&Task> {
        if !self.details.contains_key(&id) {
            match self.api.get_task(id) {
                Ok(task) => self.cache_detail(task),
                Err(e) => {
                    if e.code.is_not_found() {
                        self.mark_list_stale();
                    }
                    return Err(e);
                }
            }
        }
        self.details
            .get(&id)
            .ok_or_else(|| WorktaskError::task_not_found(id))
    }

    /// Locally filtered view of the cached list. Pure: no backend call.
    pub fn visible(&self, query: &str, filter: &TaskFilter) -> Vec<&Task> {
        self.cached_list()
            .map(|tasks| filter::filter_tasks(tasks, query, filter))
            .unwrap_or_default()
    }

    /// `GET /dashboard/stats`.
    pub fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.api.dashboard_stats(self.today())
    }

    /// Stats derived from the cached list, same semantics as the server's.
    pub fn local_stats(&self) -> Option<DashboardStats> {
        self.cached_list()
            .map(|tasks| metrics::dashboard_stats(tasks, self.today()))
    }

    // --- task mutations ---

    pub fn create(&mut self, task: &NewTask) -> Result<Task> {
        if task.title.trim().is_empty() {
            return Err(WorktaskError::validation("Task title is required"));
        }
        let created = self.api.create_task(task)?;
        self.cache_detail(created.clone());
        self.mark_list_stale();
        self.emit(StoreEvent::TaskCreated(created.id));
        Ok(created)
    }

    pub fn update(&mut self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(WorktaskError::validation("Task title cannot be empty"));
        }
        let updated = self.api.update_task(id, patch).map_err(|e| self.on_error(e))?;

        if let Some(cached) = self.details.get_mut(&id) {
            copy_scalars(&updated, cached);
        }
        if let Some(entry) = self.list_entry_mut(id) {
            copy_scalars(&updated, entry);
        }
        for detail in self.details.values_mut() {
            for dep in detail.dependencies.iter_mut().filter(|d| d.depends_on_id == id) {
                dep.title = updated.title.clone();
                dep.status = updated.status;
            }
        }
        self.mark_list_stale();
        self.emit(StoreEvent::TaskUpdated(id));
        Ok(updated)
    }

    pub fn delete(&mut self, id: TaskId) -> Result<()> {
        self.api.delete_task(id).map_err(|e| self.on_error(e))?;

        self.details.remove(&id);
        self.item_owner.retain(|_, owner| *owner != id);
        if let Some(snapshot) = self.list.as_mut() {
            snapshot.tasks.retain(|t| t.id != id);
        }
        // Details that point at the deleted task are refetched on next read.
        let referencing: Vec<TaskId> = self
            .details
            .values()
            .filter(|t| t.dependencies.iter().any(|d| d.depends_on_id == id))
            .map(|t| t.id)
            .collect();
        for task_id in referencing {
            self.details.remove(&task_id);
        }
        let details = &self.details;
        self.dependency_owner
            .retain(|_, (owner, _)| details.contains_key(owner));

        self.emit(StoreEvent::TaskDeleted(id));
        Ok(())
    }

    pub fn import_issue(&mut self, request: &ImportRequest) -> Result<Task> {
        let prepared = import::prepare(request, &self.tracker, self.today())?;
        let created = self.api.import_issue(&prepared)?;
        self.mark_list_stale();
        self.emit(StoreEvent::TaskCreated(created.id));
        Ok(created)
    }

    // --- checklist mutations ---

    pub fn add_checklist_item(&mut self, task_id: TaskId, item: &NewChecklistItem) -> Result<ChecklistItem> {
        if item.title.trim().is_empty() {
            return Err(WorktaskError::validation("Checklist item title is required"));
        }
        let mut created = self
            .api
            .add_checklist_item(task_id, item)
            .map_err(|e| self.on_error(e))?;
        created.task_id = task_id;

        self.item_owner.insert(created.id, task_id);
        if let Some(detail) = self.details.get_mut(&task_id) {
            detail.checklist_items.push(created.clone());
            reorder::sort_by_order(&mut detail.checklist_items);
        }
        self.sync_counts(task_id);
        self.emit(StoreEvent::ChecklistChanged(task_id));
        Ok(created)
    }

    pub fn update_checklist_item(
        &mut self,
        item_id: ChecklistItemId,
        patch: &ChecklistItemPatch,
    ) -> Result<ChecklistItem> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(WorktaskError::validation("Checklist item title cannot be empty"));
        }
        let updated = self
            .api
            .update_checklist_item(item_id, patch)
            .map_err(|e| self.on_error(e))?;

        // The server's item record does not name its task.
        let owner = self
            .item_owner
            .get(&item_id)
            .copied()
            .or((updated.task_id != 0).then_some(updated.task_id));
        let Some(task_id) = owner else {
            self.invalidate();
            return Ok(updated);
        };
        let mut updated = updated;
        updated.task_id = task_id;
        self.item_owner.insert(item_id, task_id);
        if let Some(detail) = self.details.get_mut(&task_id) {
            match detail.checklist_items.iter_mut().find(|i| i.id == item_id) {
                Some(existing) => *existing = updated.clone(),
                None => detail.checklist_items.push(updated.clone()),
            }
            reorder::sort_by_order(&mut detail.checklist_items);
        }
        self.sync_counts(task_id);
        self.emit(StoreEvent::ChecklistChanged(task_id));
        Ok(updated)
    }

    pub fn delete_checklist_item(&mut self, item_id: ChecklistItemId) -> Result<()> {
        self.api
            .delete_checklist_item(item_id)
            .map_err(|e| self.on_error(e))?;

        match self.item_owner.remove(&item_id) {
            Some(task_id) => {
                if let Some(detail) = self.details.get_mut(&task_id) {
                    detail.checklist_items.retain(|i| i.id != item_id);
                }
                self.sync_counts(task_id);
                self.emit(StoreEvent::ChecklistChanged(task_id));
            }
            None => self.invalidate(),
        }
        Ok(())
    }

    /// Move a checklist item and persist the new ordering in one batch.
    ///
    /// Returns the checklist in its new order. `from == to` is a no-op and
    /// makes no backend call.
    pub fn reorder_checklist(&mut self, task_id: TaskId, from: usize, to: usize) -> Result<Vec<ChecklistItem>> {
        let current = self.get_by_id(task_id)?.checklist_items.clone();
        let moved = reorder::move_item(&current, from, to)?;
        if from == to {
            return Ok(current);
        }

        let updates = reorder::order_updates(&moved);
        let saved = self
            .api
            .reorder_checklist(task_id, &updates)
            .map_err(|e| self.on_error(e))?;

        if let Some(detail) = self.details.get_mut(&task_id) {
            detail.checklist_items = saved.clone();
        }
        self.emit(StoreEvent::ChecklistChanged(task_id));
        Ok(saved)
    }

    // --- dependency mutations ---

    pub fn add_dependency(&mut self, task_id: TaskId, depends_on_id: TaskId) -> Result<Dependency> {
        if task_id == depends_on_id {
            return Err(WorktaskError::self_dependency(task_id));
        }
        let dep = self
            .api
            .add_dependency(task_id, depends_on_id)
            .map_err(|e| self.on_error(e))?;

        let known_edges: Vec<(TaskId, TaskId)> = self
            .details
            .values()
            .flat_map(|t| t.dependencies.iter().map(move |d| (t.id, d.depends_on_id)))
            .collect();
        if let Some(path) = cycle::would_create_cycle(&known_edges, task_id, depends_on_id) {
            warn!(task_id, depends_on_id, ?path, "dependency closes a cycle");
        }

        self.dependency_owner.insert(dep.id, (task_id, depends_on_id));
        match self.known_task(depends_on_id) {
            Some((title, status)) => {
                if let Some(detail) = self.details.get_mut(&task_id) {
                    detail.dependencies.push(DependencyRef {
                        id: Some(dep.id),
                        depends_on_id,
                        title,
                        status,
                    });
                }
            }
            // Unknown prerequisite: refetch the detail on next read.
            None => {
                self.details.remove(&task_id);
            }
        }
        self.emit(StoreEvent::DependenciesChanged(task_id));
        Ok(dep)
    }

    pub fn remove_dependency(&mut self, dependency_id: DependencyId) -> Result<()> {
        self.api
            .remove_dependency(dependency_id)
            .map_err(|e| self.on_error(e))?;

        let owner = self.dependency_owner.remove(&dependency_id).or_else(|| {
            self.details.values().find_map(|t| {
                t.dependencies
                    .iter()
                    .find(|d| d.id == Some(dependency_id))
                    .map(|d| (t.id, d.depends_on_id))
            })
        });
        match owner {
            Some((task_id, depends_on_id)) => {
                if let Some(detail) = self.details.get_mut(&task_id) {
                    // Edges are unique per pair; server refs carry no edge id.
                    detail.dependencies.retain(|d| d.depends_on_id != depends_on_id);
                }
                self.emit(StoreEvent::DependenciesChanged(task_id));
            }
            None => self.invalidate(),
        }
        Ok(())
    }

    // --- cache helpers ---

    fn cache_detail(&mut self, mut task: Task) {
        task.claim_checklist();
        for item in &task.checklist_items {
            self.item_owner.insert(item.id, task.id);
        }
        for dep in &task.dependencies {
            if let Some(id) = dep.id {
                self.dependency_owner.insert(id, (task.id, dep.depends_on_id));
            }
        }
        self.details.insert(task.id, task);
    }

    fn list_entry_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.list
            .as_mut()
            .and_then(|s| s.tasks.iter_mut().find(|t| t.id == id))
    }

    fn mark_list_stale(&mut self) {
        if let Some(snapshot) = self.list.as_mut() {
            snapshot.stale = true;
        }
    }

    /// The mutated entity is not in any cached view; drop what may be wrong.
    fn invalidate(&mut self) {
        debug!("mutation on an uncached entity; invalidating cache");
        self.mark_list_stale();
        self.details.clear();
        self.item_owner.clear();
        self.dependency_owner.clear();
        self.emit(StoreEvent::CacheInvalidated);
    }

    /// Refresh count fields on the cached list entry after a checklist change.
    fn sync_counts(&mut self, task_id: TaskId) {
        let counts = self.details.get_mut(&task_id).map(|detail| {
            detail.sync_checklist_counts();
            (detail.checklist_count, detail.completed_checklist_count)
        });
        let Some((total, done)) = counts else {
            self.mark_list_stale();
            return;
        };
        match self.list_entry_mut(task_id) {
            Some(entry) => {
                entry.checklist_count = total;
                entry.completed_checklist_count = done;
            }
            None => self.mark_list_stale(),
        }
    }

    fn known_task(&self, id: TaskId) -> Option<(String, TaskStatus)> {
        self.details
            .get(&id)
            .or_else(|| self.cached_list().and_then(|l| l.iter().find(|t| t.id == id)))
            .map(|t| (t.title.clone(), t.status))
    }

    /// A not-found from the backend means our view of that entity is stale.
    fn on_error(&mut self, e: WorktaskError) -> WorktaskError {
        if e.code.is_not_found() {
            warn!(error = %e.message, "backend reports a missing entity; marking list stale");
            self.mark_list_stale();
        }
        e
    }
}

/// Copy the server-owned scalar fields, keeping nested collections and counts.
fn copy_scalars(from: &Task, to: &mut Task) {
    to.title = from.title.clone();
    to.description = from.description.clone();
    to.assigned_date = from.assigned_date;
    to.due_date = from.due_date;
    to.priority = from.priority;
    to.status = from.status;
    to.jira_id = from.jira_id.clone();
    to.jira_url = from.jira_url.clone();
    to.notes = from.notes.clone();
    if from.updated_at.is_some() {
        to.updated_at = from.updated_at.clone();
    }
}
