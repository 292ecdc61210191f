//! Board state and the status transition controller.
//!
//! `Board` owns everything the Kanban view needs: the API handle, the acting
//! role, the task cache, per-column pagination, the drag session, the open
//! detail view with its field editor, and the pending notifications.
//!
//! Status moves are applied to the cache before the `PUT` goes out. When
//! the request fails the pre-change snapshot is put back.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::actor::Actor;
use crate::api::TaskApi;
use crate::cache::{fetch_all_tasks, TaskCache};
use crate::column::{derive_column, BoardPagination, ColumnView};
use crate::config::Config;
use crate::editor::{EditingField, FieldEditor};
use crate::error::{Error, Result};
use crate::filter::TaskFilter;
use crate::notify::{Notification, Notifications};
use crate::policy;
use crate::task::{
    FieldUpdate, ServiceRequestSummary, Task, TaskField, TaskPatch, TaskStatus, UserSummary,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Loaded { count: usize },
    AlreadyLoading,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    Moved {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
    Unchanged {
        task_id: String,
        status: TaskStatus,
    },
}

/// A task picked up from its column and not yet dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DragSession {
    pub task_id: String,
    pub from: TaskStatus,
}

pub struct Board<A> {
    api: A,
    actor: Actor,
    fetch_page_size: usize,
    filter: TaskFilter,
    cache: TaskCache,
    pagination: BoardPagination,
    loading: bool,
    drag: Option<DragSession>,
    detail: Option<Task>,
    editor: FieldEditor,
    notifications: Notifications,
    users: Vec<UserSummary>,
    service_requests: Vec<ServiceRequestSummary>,
}

impl<A: TaskApi> Board<A> {
    pub fn new(api: A, actor: Actor, config: &Config) -> Self {
        Self {
            api,
            actor,
            fetch_page_size: config.api.fetch_page_size,
            filter: TaskFilter::default(),
            cache: TaskCache::default(),
            pagination: BoardPagination::new(
                config.board.items_per_page,
                config.board.page_size_options.clone(),
            ),
            loading: false,
            drag: None,
            detail: None,
            editor: FieldEditor::new(),
            notifications: Notifications::new(),
            users: Vec::new(),
            service_requests: Vec::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn cache(&self) -> &TaskCache {
        &self.cache
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.cache.get(task_id)
    }

    pub fn pagination(&self) -> &BoardPagination {
        &self.pagination
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn users(&self) -> &[UserSummary] {
        &self.users
    }

    pub fn service_requests(&self) -> &[ServiceRequestSummary] {
        &self.service_requests
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Mark a refresh as started and return the filter to fetch with.
    ///
    /// Returns `None` while another refresh is still running, and an error
    /// when the actor cannot be scoped to its own tasks.
    pub fn begin_refresh(&mut self) -> Result<Option<TaskFilter>> {
        if self.loading {
            debug!("refresh skipped, already loading");
            return Ok(None);
        }
        let filter = self.filter.scoped_to(&self.actor)?;
        self.loading = true;
        Ok(Some(filter))
    }

    pub fn finish_refresh(&mut self, result: Result<Vec<Task>>) -> Result<RefreshOutcome> {
        self.loading = false;
        match result {
            Ok(tasks) => {
                let count = tasks.len();
                self.cache.replace_all(tasks);
                self.pagination.reset_all();
                self.sync_detail_from_cache();
                debug!(count, "task cache replaced");
                Ok(RefreshOutcome::Loaded { count })
            }
            Err(err) => {
                warn!(error = %err, "task refresh failed");
                self.notifications
                    .error(format!("Failed to load tasks: {err}"));
                Err(err)
            }
        }
    }

    pub async fn refresh(&mut self) -> Result<RefreshOutcome> {
        let Some(filter) = self.begin_refresh()? else {
            return Ok(RefreshOutcome::AlreadyLoading);
        };
        let result = fetch_all_tasks(&self.api, &filter, self.fetch_page_size).await;
        self.finish_refresh(result)
    }

    /// Replace the filter; every column goes back to its first page.
    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
        self.pagination.reset_all();
    }

    pub async fn load_lookups(&mut self) -> Result<()> {
        let loaded = futures::try_join!(self.api.list_users(), self.api.list_service_requests());
        match loaded {
            Ok((users, service_requests)) => {
                debug!(
                    users = users.len(),
                    service_requests = service_requests.len(),
                    "lookups loaded"
                );
                self.users = users;
                self.service_requests = service_requests;
                Ok(())
            }
            Err(err) => {
                self.notifications
                    .error(format!("Failed to load lookups: {err}"));
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Columns
    // ------------------------------------------------------------------

    pub fn column(&self, status: TaskStatus) -> Result<ColumnView> {
        let pagination = self.pagination.get(status)?;
        Ok(derive_column(self.cache.tasks(), status, &pagination))
    }

    pub fn columns(&self) -> Vec<ColumnView> {
        TaskStatus::BOARD
            .iter()
            .filter_map(|status| self.column(*status).ok())
            .collect()
    }

    pub fn set_page(&mut self, status: TaskStatus, page: usize) -> Result<()> {
        self.pagination.set_page(status, page)
    }

    pub fn set_items_per_page(&mut self, status: TaskStatus, items_per_page: usize) -> Result<()> {
        self.pagination.set_items_per_page(status, items_per_page)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Targets the current role may pick for `task_id`.
    pub fn allowed_targets(&self, task_id: &str) -> Result<Vec<TaskStatus>> {
        let status = self.status_of(task_id)?;
        Ok(policy::allowed_targets(self.actor.role, status))
    }

    pub async fn request_transition(
        &mut self,
        task_id: &str,
        target: TaskStatus,
    ) -> Result<TransitionOutcome> {
        let from = self.status_of(task_id)?;

        if let Err(rejection) = policy::check(self.actor.role, from, target) {
            warn!(task_id, %from, to = %target, role = %self.actor.role, "transition rejected");
            self.notifications.warning(rejection.to_string());
            return Err(rejection.into());
        }

        if from == target {
            debug!(task_id, status = %from, "transition is a no-op");
            return Ok(TransitionOutcome::Unchanged {
                task_id: task_id.to_string(),
                status: from,
            });
        }

        let task = self
            .cache
            .get_mut(task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
        let snapshot = task.clone();
        task.transition_to(target, Utc::now());
        let patch = TaskPatch::status_change(task, from);
        self.sync_detail(task_id);

        match self.api.update_task(&patch).await {
            Ok(()) => {
                info!(task_id, %from, to = %target, "task moved");
                self.notifications
                    .success(format!("Task moved to {target}"));
                Ok(TransitionOutcome::Moved {
                    task_id: task_id.to_string(),
                    from,
                    to: target,
                })
            }
            Err(err) => {
                warn!(task_id, error = %err, "status update failed, restoring snapshot");
                self.cache.restore(snapshot);
                self.sync_detail(task_id);
                self.notifications
                    .error(format!("Failed to update task status: {err}"));
                Err(err)
            }
        }
    }

    /// Move to the next board stage.
    pub async fn advance(&mut self, task_id: &str) -> Result<TransitionOutcome> {
        let from = self.status_of(task_id)?;
        match from.next() {
            Some(target) => self.request_transition(task_id, target).await,
            None => Err(self.no_adjacent_stage(format!("no stage after '{from}'"))),
        }
    }

    /// Move to the previous board stage.
    pub async fn retreat(&mut self, task_id: &str) -> Result<TransitionOutcome> {
        let from = self.status_of(task_id)?;
        match from.prev() {
            Some(target) => self.request_transition(task_id, target).await,
            None => Err(self.no_adjacent_stage(format!("no stage before '{from}'"))),
        }
    }

    fn no_adjacent_stage(&mut self, message: String) -> Error {
        self.notifications.warning(message.clone());
        Error::InvalidArgument(message)
    }

    // ------------------------------------------------------------------
    // Drag and drop
    // ------------------------------------------------------------------

    pub fn drag(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Pick up a task. Tasks frozen for the current role cannot be picked up.
    pub fn begin_drag(&mut self, task_id: &str) -> Result<&DragSession> {
        let from = self.status_of(task_id)?;
        if let Err(rejection) = policy::check_pickup(self.actor.role, from) {
            warn!(task_id, status = %from, "drag rejected");
            self.notifications.warning(rejection.to_string());
            return Err(rejection.into());
        }
        Ok(self.drag.insert(DragSession {
            task_id: task_id.to_string(),
            from,
        }))
    }

    /// Drop the dragged task on the column for `target`.
    pub async fn drop_on(&mut self, target: TaskStatus) -> Result<TransitionOutcome> {
        let session = self
            .drag
            .take()
            .ok_or_else(|| Error::InvalidArgument("no task is being dragged".to_string()))?;
        self.request_transition(&session.task_id, target).await
    }

    pub fn cancel_drag(&mut self) -> Option<DragSession> {
        self.drag.take()
    }

    // ------------------------------------------------------------------
    // Detail view and field editing
    // ------------------------------------------------------------------

    pub fn detail(&self) -> Option<&Task> {
        self.detail.as_ref()
    }

    pub fn editor(&self) -> &FieldEditor {
        &self.editor
    }

    pub fn open_detail(&mut self, task_id: &str) -> Result<&Task> {
        let task = self
            .cache
            .get(task_id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
        self.editor.finish();
        Ok(self.detail.insert(task))
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
        self.editor.finish();
    }

    /// Send a single-field update and apply it locally once accepted.
    pub async fn edit_field(&mut self, task_id: &str, update: FieldUpdate) -> Result<()> {
        if self.cache.get(task_id).is_none() {
            return Err(Error::TaskNotFound(task_id.to_string()));
        }
        let patch = TaskPatch::field(task_id, &update);

        if let Err(err) = self.api.update_task(&patch).await {
            warn!(task_id, field = %update.field(), error = %err, "field update failed");
            self.notifications
                .error(format!("Failed to update {}: {err}", update.field()));
            return Err(err);
        }

        if let Some(task) = self.cache.get_mut(task_id) {
            task.apply(&update);
        }
        self.sync_detail(task_id);
        info!(task_id, field = %update.field(), "task field updated");
        self.notifications
            .success(format!("Updated {}", update.field()));
        Ok(())
    }

    pub fn begin_edit(&mut self, field: TaskField) -> Result<&EditingField> {
        let detail = self
            .detail
            .as_ref()
            .ok_or_else(|| Error::InvalidArgument("no task detail is open".to_string()))?;
        Ok(self.editor.begin(detail, field))
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) -> bool {
        self.editor.set_draft(draft)
    }

    pub fn cancel_edit(&mut self) -> Option<EditingField> {
        self.editor.cancel()
    }

    /// Save the open edit. On failure the edit stays open with its draft.
    pub async fn save_edit(&mut self) -> Result<Option<FieldUpdate>> {
        let Some(task_id) = self.detail.as_ref().map(|task| task.id.clone()) else {
            return Ok(None);
        };
        let update = match self.editor.commit() {
            Ok(Some(update)) => update,
            Ok(None) => return Ok(None),
            Err(err) => {
                self.notifications.error(err.to_string());
                return Err(err);
            }
        };
        self.edit_field(&task_id, update.clone()).await?;
        self.editor.finish();
        Ok(Some(update))
    }

    // ------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------

    pub async fn delete_task(&mut self, task_id: &str) -> Result<()> {
        if !self.actor.role.is_admin() {
            let message = "only admins can delete tasks".to_string();
            self.notifications.warning(message.clone());
            return Err(Error::Forbidden(message));
        }

        if let Err(err) = self.api.delete_task(task_id).await {
            self.notifications
                .error(format!("Failed to delete task: {err}"));
            return Err(err);
        }

        self.cache.remove(task_id);
        if self.detail.as_ref().is_some_and(|task| task.id == task_id) {
            self.close_detail();
        }
        if self.drag.as_ref().is_some_and(|drag| drag.task_id == task_id) {
            self.drag = None;
        }
        info!(task_id, "task deleted");
        self.notifications.success("Task deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn status_of(&self, task_id: &str) -> Result<TaskStatus> {
        self.cache
            .get(task_id)
            .map(|task| task.status)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
    }

    fn sync_detail(&mut self, task_id: &str) {
        if let Some(detail) = self.detail.as_mut() {
            if detail.id == task_id {
                if let Some(task) = self.cache.get(task_id) {
                    *detail = task.clone();
                }
            }
        }
    }

    fn sync_detail_from_cache(&mut self) {
        let Some(id) = self.detail.as_ref().map(|task| task.id.clone()) else {
            return;
        };
        match self.cache.get(&id) {
            Some(task) => self.detail = Some(task.clone()),
            None => self.close_detail(),
        }
    }
}
