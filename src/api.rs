//! REST collaborator for the tasks collection.
//!
//! Every endpoint answers with a `{success, data, pagination?, message?}`
//! envelope. Transport failures, non-2xx statuses, `success: false` and
//! undecodable bodies map to distinct [`Error`] variants.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::filter::TaskFilter;
use crate::task::{ServiceRequestSummary, Task, TaskPatch, UserSummary};

const BODY_SNIPPET_LEN: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub page: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One page request against the tasks collection.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskQuery {
    pub page: usize,
    pub limit: usize,
    pub filter: TaskFilter,
}

impl TaskQuery {
    pub fn new(page: usize, limit: usize, filter: TaskFilter) -> Self {
        Self {
            page,
            limit,
            filter,
        }
    }

    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        self.filter.query_pairs(self.page, self.limit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub pagination: Pagination,
}

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self, query: &TaskQuery) -> Result<TaskPage>;

    /// `PUT /tasks` with a partial body.
    async fn update_task(&self, patch: &TaskPatch) -> Result<()>;

    async fn delete_task(&self, task_id: &str) -> Result<()>;

    async fn list_users(&self) -> Result<Vec<UserSummary>>;

    async fn list_service_requests(&self) -> Result<Vec<ServiceRequestSummary>>;
}

#[async_trait]
impl<T: TaskApi + ?Sized> TaskApi for Arc<T> {
    async fn list_tasks(&self, query: &TaskQuery) -> Result<TaskPage> {
        (**self).list_tasks(query).await
    }

    async fn update_task(&self, patch: &TaskPatch) -> Result<()> {
        (**self).update_task(patch).await
    }

    async fn delete_task(&self, task_id: &str) -> Result<()> {
        (**self).delete_task(task_id).await
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>> {
        (**self).list_users().await
    }

    async fn list_service_requests(&self) -> Result<Vec<ServiceRequestSummary>> {
        (**self).list_service_requests().await
    }
}

#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTaskApi {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.base_url, config.token())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.as_deref() {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        rb: reqwest::RequestBuilder,
        method: &'static str,
        url: &str,
    ) -> Result<ApiEnvelope<T>> {
        debug!(method, url, "api request");
        let resp = self.authorize(rb).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).map_err(|err| {
            Error::InvalidResponse(format!(
                "{method} {url}: {err} (body: {})",
                truncate_body(&body, BODY_SNIPPET_LEN)
            ))
        })?;

        if !envelope.success {
            let message = envelope
                .message
                .clone()
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(Error::ApiRejected(message));
        }

        Ok(envelope)
    }

    async fn send_data<T: DeserializeOwned>(
        &self,
        rb: reqwest::RequestBuilder,
        method: &'static str,
        url: &str,
    ) -> Result<T> {
        let envelope = self.send::<T>(rb, method, url).await?;
        envelope
            .data
            .ok_or_else(|| Error::InvalidResponse(format!("{method} {url}: missing data field")))
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self, query: &TaskQuery) -> Result<TaskPage> {
        let url = self.url("tasks");
        let rb = self.client.get(&url).query(&query.pairs());
        let envelope = self.send::<Vec<Task>>(rb, "GET", &url).await?;
        let tasks = envelope
            .data
            .ok_or_else(|| Error::InvalidResponse(format!("GET {url}: missing data field")))?;
        let pagination = envelope.pagination.unwrap_or(Pagination {
            total_pages: 1,
            page: query.page,
            total: None,
            limit: Some(query.limit),
        });
        debug!(
            page = query.page,
            total_pages = pagination.total_pages,
            count = tasks.len(),
            "fetched task page"
        );
        Ok(TaskPage { tasks, pagination })
    }

    async fn update_task(&self, patch: &TaskPatch) -> Result<()> {
        let url = self.url("tasks");
        let rb = self.client.put(&url).json(patch);
        self.send::<serde_json::Value>(rb, "PUT", &url).await?;
        Ok(())
    }

    async fn delete_task(&self, task_id: &str) -> Result<()> {
        let url = self.url("tasks");
        let rb = self.client.delete(&url).query(&[("id", task_id)]);
        self.send::<serde_json::Value>(rb, "DELETE", &url).await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>> {
        let url = self.url("users");
        let rb = self.client.get(&url);
        self.send_data(rb, "GET", &url).await
    }

    async fn list_service_requests(&self) -> Result<Vec<ServiceRequestSummary>> {
        let url = self.url("serviceRequests");
        let rb = self.client.get(&url);
        self.send_data(rb, "GET", &url).await
    }
}

/// Prefer the envelope's `message`, fall back to a body snippet.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|message| message.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| truncate_body(body, BODY_SNIPPET_LEN))
}

fn truncate_body(body: &str, max: usize) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let api = HttpTaskApi::new("http://localhost:3000/api/", None);
        assert_eq!(api.base_url(), "http://localhost:3000/api");
        assert_eq!(api.url("/tasks"), "http://localhost:3000/api/tasks");
        assert_eq!(api.url("users"), "http://localhost:3000/api/users");
    }

    #[test]
    fn error_message_prefers_envelope_message() {
        assert_eq!(
            error_message(r#"{"success": false, "message": "Task not found"}"#),
            "Task not found"
        );
        assert_eq!(error_message("  Bad Gateway  "), "Bad Gateway");
    }

    #[test]
    fn truncate_body_is_char_safe() {
        let body = "é".repeat(10);
        let out = truncate_body(&body, 4);
        assert_eq!(out, "éééé…");
    }

    #[test]
    fn envelope_tolerates_missing_optional_fields() {
        let envelope: ApiEnvelope<Vec<Task>> =
            serde_json::from_str(r#"{"success": true}"#).expect("envelope");
        assert!(envelope.data.is_none());
        assert!(envelope.pagination.is_none());

        let envelope: ApiEnvelope<Vec<Task>> = serde_json::from_str(
            r#"{"success": true, "data": [], "pagination": {"totalPages": 3, "page": 1, "total": 2500}}"#,
        )
        .expect("envelope");
        let pagination = envelope.pagination.expect("pagination");
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(pagination.total, Some(2500));
    }
}
