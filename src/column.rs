//! Kanban column derivation and per-column pagination.

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::task::{priority_weight, Task, TaskStatus};

pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnPagination {
    pub page: usize,
    pub items_per_page: usize,
}

impl Default for ColumnPagination {
    fn default() -> Self {
        Self {
            page: 1,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
        }
    }
}

/// Pagination state for every board column, keyed by board position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardPagination {
    columns: [ColumnPagination; 5],
    options: Vec<usize>,
}

impl BoardPagination {
    pub fn new(items_per_page: usize, options: Vec<usize>) -> Self {
        let column = ColumnPagination {
            page: 1,
            items_per_page,
        };
        Self {
            columns: [column; 5],
            options,
        }
    }

    pub fn options(&self) -> &[usize] {
        &self.options
    }

    pub fn get(&self, status: TaskStatus) -> Result<ColumnPagination> {
        Ok(self.columns[index(status)?])
    }

    pub fn set_page(&mut self, status: TaskStatus, page: usize) -> Result<()> {
        if page == 0 {
            return Err(Error::InvalidArgument("page must be >= 1".to_string()));
        }
        self.columns[index(status)?].page = page;
        Ok(())
    }

    /// Change one column's page size; its page goes back to 1.
    pub fn set_items_per_page(&mut self, status: TaskStatus, items_per_page: usize) -> Result<()> {
        if !self.options.contains(&items_per_page) {
            return Err(Error::InvalidArgument(format!(
                "items per page must be one of {:?}",
                self.options
            )));
        }
        let column = &mut self.columns[index(status)?];
        column.items_per_page = items_per_page;
        column.page = 1;
        Ok(())
    }

    pub fn reset_all(&mut self) {
        for column in &mut self.columns {
            column.page = 1;
        }
    }
}

impl Default for BoardPagination {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE, vec![5, 10, 20, 50])
    }
}

fn index(status: TaskStatus) -> Result<usize> {
    status
        .column_index()
        .ok_or_else(|| Error::NoColumn(status.to_string()))
}

/// One rendered column: the visible page plus its paging totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnView {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
    pub total_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub items_per_page: usize,
}

/// Higher priority first, then earliest due date; undated tasks go last.
pub fn column_order(left: &Task, right: &Task) -> Ordering {
    priority_weight(right.priority)
        .cmp(&priority_weight(left.priority))
        .then_with(|| match (left.due_date, right.due_date) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

pub fn sort_column(tasks: &mut [Task]) {
    tasks.sort_by(column_order);
}

pub fn derive_column(
    tasks: &[Task],
    status: TaskStatus,
    pagination: &ColumnPagination,
) -> ColumnView {
    let mut matching: Vec<Task> = tasks
        .iter()
        .filter(|task| task.status == status)
        .cloned()
        .collect();
    sort_column(&mut matching);

    let items_per_page = pagination.items_per_page.max(1);
    let total_count = matching.len();
    let total_pages = total_count.div_ceil(items_per_page).max(1);
    let current_page = pagination.page.clamp(1, total_pages);
    let start = (current_page - 1).saturating_mul(items_per_page);
    let page_tasks = matching
        .into_iter()
        .skip(start)
        .take(items_per_page)
        .collect();

    ColumnView {
        status,
        tasks: page_tasks,
        total_count,
        total_pages,
        current_page,
        items_per_page,
    }
}
