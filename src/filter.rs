//! Fetch filters for the tasks collection.
//!
//! Most filters are encoded as query parameters. Filters the collection
//! endpoint does not understand are applied after the pages are joined.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::actor::Actor;
use crate::error::{Error, Result};
use crate::task::{Priority, Task, TaskStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_date_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_date_to: Option<DateTime<Utc>>,
}

impl TaskFilter {
    /// Query parameters for one page of the collection, newest first.
    pub fn query_pairs(&self, page: usize, limit: usize) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", page.to_string()),
            ("limit", limit.to_string()),
            ("sortBy", "createdAt".to_string()),
            ("sortOrder", "desc".to_string()),
        ];
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.to_string()));
        }
        if let Some(user) = non_empty(self.assigned_user_id.as_deref()) {
            pairs.push(("assignedUserId", user.to_string()));
        }
        if let Some(title) = non_empty(self.title.as_deref()) {
            pairs.push(("title", title.to_string()));
        }
        let dates = [
            ("createdAtFrom", self.created_at_from),
            ("createdAtTo", self.created_at_to),
            ("completedDateFrom", self.completed_date_from),
            ("completedDateTo", self.completed_date_to),
        ];
        for (key, value) in dates {
            if let Some(date) = value {
                pairs.push((key, date.to_rfc3339()));
            }
        }
        pairs
    }

    /// Filters the collection endpoint ignores.
    pub fn matches_client_side(&self, task: &Task) -> bool {
        match non_empty(self.service_request_id.as_deref()) {
            Some(wanted) => task.service_request() == Some(wanted),
            None => true,
        }
    }

    /// Narrow the filter to what `actor` is allowed to see.
    ///
    /// A non-admin without a user id cannot be scoped and is refused.
    pub fn scoped_to(&self, actor: &Actor) -> Result<TaskFilter> {
        let mut scoped = self.clone();
        if !actor.role.is_admin() {
            let user = non_empty(actor.user_id.as_deref()).ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "the {} role needs a user id to list tasks",
                    actor.role
                ))
            })?;
            scoped.assigned_user_id = Some(user.to_string());
        }
        Ok(scoped)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Role;
    use crate::task::ServiceRequestRef;

    fn value<'a>(pairs: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        pairs
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn query_includes_paging_and_sort() {
        let pairs = TaskFilter::default().query_pairs(2, 500);
        assert_eq!(value(&pairs, "page"), Some("2"));
        assert_eq!(value(&pairs, "limit"), Some("500"));
        assert_eq!(value(&pairs, "sortBy"), Some("createdAt"));
        assert_eq!(value(&pairs, "sortOrder"), Some("desc"));
        assert_eq!(value(&pairs, "status"), None);
    }

    #[test]
    fn query_skips_client_side_and_blank_filters() {
        let filter = TaskFilter {
            status: Some(TaskStatus::Review),
            title: Some("  ".to_string()),
            service_request_id: Some("sr-1".to_string()),
            ..TaskFilter::default()
        };
        let pairs = filter.query_pairs(1, 10);
        assert_eq!(value(&pairs, "status"), Some("review"));
        assert_eq!(value(&pairs, "title"), None);
        assert_eq!(value(&pairs, "serviceRequestId"), None);
    }

    #[test]
    fn service_request_filter_applies_locally() {
        let filter = TaskFilter {
            service_request_id: Some("sr-1".to_string()),
            ..TaskFilter::default()
        };
        let mut task = Task::new("t1", "Shoot", TaskStatus::Todo);
        assert!(!filter.matches_client_side(&task));
        task.service_request_id = Some(ServiceRequestRef::Id("sr-1".to_string()));
        assert!(filter.matches_client_side(&task));
        assert!(TaskFilter::default().matches_client_side(&task));
    }

    #[test]
    fn users_are_scoped_to_their_assignments() {
        let filter = TaskFilter {
            assigned_user_id: Some("someone-else".to_string()),
            ..TaskFilter::default()
        };
        let user = Actor::new(Role::User, Some("u1".to_string()));
        let scoped = filter.scoped_to(&user).expect("scoped");
        assert_eq!(scoped.assigned_user_id.as_deref(), Some("u1"));
        let admin = Actor::new(Role::Admin, None);
        assert_eq!(
            filter.scoped_to(&admin).expect("admin").assigned_user_id.as_deref(),
            Some("someone-else")
        );
    }

    #[test]
    fn user_without_id_cannot_be_scoped() {
        let filter = TaskFilter::default();
        for user_id in [None, Some("   ".to_string())] {
            let user = Actor::new(Role::User, user_id);
            assert!(matches!(
                filter.scoped_to(&user),
                Err(Error::InvalidArgument(_))
            ));
        }
    }
}
