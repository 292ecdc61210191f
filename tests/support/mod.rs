#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use taskboard::actor::Actor;
use taskboard::api::{Pagination, TaskApi, TaskPage, TaskQuery};
use taskboard::board::Board;
use taskboard::config::Config;
use taskboard::task::{
    Priority, ServiceRequestSummary, Task, TaskPatch, TaskStatus, UserRef, UserSummary,
};
use taskboard::{Error, Result};

/// One request seen by [`FakeTaskApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListTasks {
        page: usize,
        limit: usize,
        assigned_user_id: Option<String>,
    },
    UpdateTask(TaskPatch),
    DeleteTask(String),
    ListUsers,
    ListServiceRequests,
}

/// In-memory task collection that pages like the real endpoint and
/// records every call.
#[derive(Default)]
pub struct FakeTaskApi {
    tasks: Mutex<Vec<Task>>,
    users: Vec<UserSummary>,
    service_requests: Vec<ServiceRequestSummary>,
    calls: Mutex<Vec<Call>>,
    fail_updates: Mutex<bool>,
    fail_page: Mutex<Option<usize>>,
}

impl FakeTaskApi {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            ..Self::default()
        }
    }

    pub fn with_lookups(
        mut self,
        users: Vec<UserSummary>,
        service_requests: Vec<ServiceRequestSummary>,
    ) -> Self {
        self.users = users;
        self.service_requests = service_requests;
        self
    }

    pub fn fail_updates(&self, fail: bool) {
        *self.fail_updates.lock().expect("lock") = fail;
    }

    pub fn fail_page(&self, page: Option<usize>) {
        *self.fail_page.lock().expect("lock") = page;
    }

    pub fn set_tasks(&self, tasks: Vec<Task>) {
        *self.tasks.lock().expect("lock") = tasks;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn updates(&self) -> Vec<TaskPatch> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::UpdateTask(patch) => Some(patch),
                _ => None,
            })
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::ListTasks { .. }))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().expect("lock").clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("lock").push(call);
    }
}

#[async_trait]
impl TaskApi for FakeTaskApi {
    async fn list_tasks(&self, query: &TaskQuery) -> Result<TaskPage> {
        self.record(Call::ListTasks {
            page: query.page,
            limit: query.limit,
            assigned_user_id: query.filter.assigned_user_id.clone(),
        });
        if *self.fail_page.lock().expect("lock") == Some(query.page) {
            return Err(Error::Api {
                status: 500,
                message: format!("page {} unavailable", query.page),
            });
        }

        let matching: Vec<Task> = self
            .tasks
            .lock()
            .expect("lock")
            .iter()
            .filter(|task| query.filter.status.map_or(true, |status| task.status == status))
            .filter(|task| {
                query
                    .filter
                    .assigned_user_id
                    .as_deref()
                    .map_or(true, |user| task.assigned_user() == Some(user))
            })
            .cloned()
            .collect();

        let limit = query.limit.max(1);
        let total_pages = matching.len().div_ceil(limit).max(1);
        let tasks = matching
            .iter()
            .skip((query.page - 1) * limit)
            .take(limit)
            .cloned()
            .collect();

        Ok(TaskPage {
            tasks,
            pagination: Pagination {
                total_pages,
                page: query.page,
                total: Some(matching.len() as u64),
                limit: Some(limit),
            },
        })
    }

    async fn update_task(&self, patch: &TaskPatch) -> Result<()> {
        self.record(Call::UpdateTask(patch.clone()));
        if *self.fail_updates.lock().expect("lock") {
            return Err(Error::Api {
                status: 500,
                message: "update failed".to_string(),
            });
        }
        Ok(())
    }

    async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.record(Call::DeleteTask(task_id.to_string()));
        self.tasks
            .lock()
            .expect("lock")
            .retain(|task| task.id != task_id);
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>> {
        self.record(Call::ListUsers);
        Ok(self.users.clone())
    }

    async fn list_service_requests(&self) -> Result<Vec<ServiceRequestSummary>> {
        self.record(Call::ListServiceRequests);
        Ok(self.service_requests.clone())
    }
}

pub fn ts(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap()
}

pub fn task(id: &str, status: TaskStatus) -> Task {
    Task::new(id, format!("Task {id}"), status)
}

pub fn assigned(id: &str, status: TaskStatus, user: &str) -> Task {
    let mut task = task(id, status);
    task.assigned_user_id = Some(UserRef::Id(user.to_string()));
    task
}

pub fn prioritized(
    id: &str,
    status: TaskStatus,
    priority: Option<Priority>,
    due_day: Option<u32>,
) -> Task {
    let mut task = task(id, status);
    task.priority = priority;
    task.due_date = due_day.map(ts);
    task
}

pub fn config_with_fetch_size(fetch_page_size: usize) -> Config {
    let mut config = Config::default();
    config.api.fetch_page_size = fetch_page_size;
    config
}

/// A loaded board over `tasks` for `actor`.
pub async fn loaded_board(actor: Actor, tasks: Vec<Task>) -> Board<FakeTaskApi> {
    let mut board = Board::new(FakeTaskApi::new(tasks), actor, &Config::default());
    board.refresh().await.expect("refresh");
    board.api().clear_calls();
    board
}
