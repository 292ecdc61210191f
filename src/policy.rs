//! Status transition policy.
//!
//! Admins may move a task between any two statuses. Regular users walk a
//! small graph over the first three stages; `accepted` and `completed` are
//! manager-only and frozen for them in both directions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::task::TaskStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Error> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" | "manager" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(Error::InvalidArgument(format!(
                "unknown role '{other}' (expected admin|user)"
            ))),
        }
    }
}

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    #[error("this stage is manager-only")]
    ManagerOnly {
        from: TaskStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        to: Option<TaskStatus>,
    },
    #[error("cannot move to this status ({from} -> {to})")]
    NotAllowed { from: TaskStatus, to: TaskStatus },
}

/// Statuses a regular user can neither enter nor leave.
const MANAGER_ONLY: [TaskStatus; 2] = [TaskStatus::Accepted, TaskStatus::Completed];

fn user_edges(from: TaskStatus) -> &'static [TaskStatus] {
    match from {
        TaskStatus::Todo => &[TaskStatus::InProgress],
        TaskStatus::InProgress => &[TaskStatus::Todo, TaskStatus::Review],
        TaskStatus::Review => &[TaskStatus::InProgress],
        TaskStatus::Accepted | TaskStatus::Completed | TaskStatus::Cancelled => &[],
    }
}

/// True when `role` cannot move a task out of `status` at all.
pub fn is_frozen(role: Role, status: TaskStatus) -> bool {
    match role {
        Role::Admin => false,
        Role::User => MANAGER_ONLY.contains(&status),
    }
}

/// Destinations `role` may pick for a task in `from`, excluding `from` itself.
pub fn allowed_targets(role: Role, from: TaskStatus) -> Vec<TaskStatus> {
    match role {
        Role::Admin => TaskStatus::ALL
            .iter()
            .copied()
            .filter(|status| *status != from)
            .collect(),
        Role::User => user_edges(from).to_vec(),
    }
}

/// Decide whether `role` may move a task from `from` to `to`.
///
/// Same-status requests pass (as no-ops) unless the status is frozen.
pub fn check(role: Role, from: TaskStatus, to: TaskStatus) -> Result<(), Rejection> {
    if role.is_admin() {
        return Ok(());
    }
    if is_frozen(role, from) {
        return Err(Rejection::ManagerOnly { from, to: Some(to) });
    }
    if MANAGER_ONLY.contains(&to) {
        return Err(Rejection::ManagerOnly { from, to: Some(to) });
    }
    if from == to || user_edges(from).contains(&to) {
        return Ok(());
    }
    Err(Rejection::NotAllowed { from, to })
}

/// Rejection for picking up a task that is frozen for `role`.
pub fn check_pickup(role: Role, from: TaskStatus) -> Result<(), Rejection> {
    if is_frozen(role, from) {
        Err(Rejection::ManagerOnly { from, to: None })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_graph_is_complete() {
        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                assert!(check(Role::Admin, from, to).is_ok(), "{from} -> {to}");
            }
            assert_eq!(allowed_targets(Role::Admin, from).len(), 5);
        }
    }

    #[test]
    fn user_graph_matches_edges() {
        let allowed = [
            (TaskStatus::Todo, TaskStatus::InProgress),
            (TaskStatus::InProgress, TaskStatus::Todo),
            (TaskStatus::InProgress, TaskStatus::Review),
            (TaskStatus::Review, TaskStatus::InProgress),
        ];
        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                let expected = allowed.contains(&(from, to))
                    || (from == to && !MANAGER_ONLY.contains(&from));
                assert_eq!(check(Role::User, from, to).is_ok(), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn manager_only_message_for_frozen_stages() {
        let err = check(Role::User, TaskStatus::Review, TaskStatus::Accepted).expect_err("reject");
        assert!(matches!(err, Rejection::ManagerOnly { .. }));
        assert_eq!(err.to_string(), "this stage is manager-only");

        let err = check(Role::User, TaskStatus::Completed, TaskStatus::Todo).expect_err("reject");
        assert!(matches!(err, Rejection::ManagerOnly { .. }));
    }

    #[test]
    fn generic_message_for_other_illegal_moves() {
        let err = check(Role::User, TaskStatus::Todo, TaskStatus::Review).expect_err("reject");
        assert!(matches!(err, Rejection::NotAllowed { .. }));
        assert!(err.to_string().starts_with("cannot move to this status"));

        let err = check(Role::User, TaskStatus::Todo, TaskStatus::Cancelled).expect_err("reject");
        assert!(matches!(err, Rejection::NotAllowed { .. }));
    }

    #[test]
    fn frozen_only_for_users() {
        assert!(is_frozen(Role::User, TaskStatus::Accepted));
        assert!(is_frozen(Role::User, TaskStatus::Completed));
        assert!(!is_frozen(Role::User, TaskStatus::Review));
        assert!(!is_frozen(Role::Admin, TaskStatus::Completed));
        assert!(allowed_targets(Role::User, TaskStatus::Accepted).is_empty());
    }

    #[test]
    fn role_parses() {
        assert_eq!("Admin".parse::<Role>().expect("role"), Role::Admin);
        assert_eq!("user".parse::<Role>().expect("role"), Role::User);
        assert!("guest".parse::<Role>().is_err());
    }
}
