//! Client-side task cache and the paginated fetch-all loop.

use std::cmp::Ordering;

use futures::future::try_join_all;
use tracing::debug;

use crate::api::{TaskApi, TaskQuery};
use crate::error::Result;
use crate::filter::TaskFilter;
use crate::task::{Task, TaskStatus};

/// Fetch every task matching `filter`, newest `createdAt` first.
///
/// Pages after the first are requested concurrently. A failure on any page
/// fails the whole fetch.
pub async fn fetch_all_tasks<A: TaskApi + ?Sized>(
    api: &A,
    filter: &TaskFilter,
    page_size: usize,
) -> Result<Vec<Task>> {
    let page_size = page_size.max(1);
    let first = api
        .list_tasks(&TaskQuery::new(1, page_size, filter.clone()))
        .await?;
    let total_pages = first.pagination.total_pages;
    let mut tasks = first.tasks;

    if total_pages > 1 {
        debug!(total_pages, "fetching remaining task pages");
        let rest = try_join_all((2..=total_pages).map(|page| {
            let query = TaskQuery::new(page, page_size, filter.clone());
            async move { api.list_tasks(&query).await }
        }))
        .await?;
        for page in rest {
            tasks.extend(page.tasks);
        }
    }

    tasks.retain(|task| filter.matches_client_side(task));
    sort_newest_first(&mut tasks);
    Ok(tasks)
}

/// Stable sort by `created_at` descending; tasks without it go last.
pub fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|left, right| match (left.created_at, right.created_at) {
        (Some(left), Some(right)) => right.cmp(&left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Ordered in-memory copy of the tasks visible in the current view.
#[derive(Debug, Clone, Default)]
pub struct TaskCache {
    tasks: Vec<Task>,
}

impl TaskCache {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn get_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == task_id)
    }

    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    /// Put a snapshot back in place of the entry with the same id.
    ///
    /// Returns false when the entry has since left the cache.
    pub fn restore(&mut self, snapshot: Task) -> bool {
        match self.get_mut(&snapshot.id) {
            Some(entry) => {
                *entry = snapshot;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, task_id: &str) -> Option<Task> {
        let idx = self.tasks.iter().position(|task| task.id == task_id)?;
        Some(self.tasks.remove(idx))
    }

    pub fn with_status(&self, status: TaskStatus) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |task| task.status == status)
    }
}
