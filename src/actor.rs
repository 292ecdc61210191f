//! Actor identity management.
//!
//! Role resolution order:
//! 1) CLI --role / --user-id (explicit)
//! 2) TASKBOARD_ROLE / TASKBOARD_USER_ID environment variables
//! 3) Config `[actor]` table
//! 4) `user` with no id

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::policy::Role;

pub const ROLE_ENV: &str = "TASKBOARD_ROLE";
pub const USER_ID_ENV: &str = "TASKBOARD_USER_ID";

/// The role context a transition is attempted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Actor {
    pub fn new(role: Role, user_id: Option<String>) -> Self {
        Self { role, user_id }
    }

    pub fn admin() -> Self {
        Self::new(Role::Admin, None)
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self::new(Role::User, Some(user_id.into()))
    }
}

/// Resolve the current actor using CLI flags, environment, and config.
pub fn resolve_actor(
    config: &Config,
    cli_role: Option<&str>,
    cli_user_id: Option<&str>,
) -> Result<Actor> {
    let env = EnvActor::from_process();
    actor_from_sources(config, cli_role, cli_user_id, &env)
}

/// Resolve only the role; no user id is needed for offline policy queries.
pub fn resolve_role(config: &Config, cli_role: Option<&str>) -> Result<Role> {
    role_from_sources(config, cli_role, &EnvActor::from_process())
}

/// Actor values read from `TASKBOARD_ROLE` / `TASKBOARD_USER_ID`.
#[derive(Debug, Clone, Default)]
struct EnvActor {
    role: Option<String>,
    user_id: Option<String>,
}

impl EnvActor {
    fn from_process() -> Self {
        Self {
            role: std::env::var(ROLE_ENV).ok(),
            user_id: std::env::var(USER_ID_ENV).ok(),
        }
    }
}

fn actor_from_sources(
    config: &Config,
    cli_role: Option<&str>,
    cli_user_id: Option<&str>,
    env: &EnvActor,
) -> Result<Actor> {
    let role = role_from_sources(config, cli_role, env)?;
    let user_id = non_empty(cli_user_id)
        .or_else(|| non_empty(env.user_id.as_deref()))
        .or_else(|| non_empty(config.actor.user_id.as_deref()))
        .map(str::to_string);

    if role == Role::User && user_id.is_none() {
        return Err(Error::InvalidArgument(format!(
            "a user id is required for the user role (--user-id or {USER_ID_ENV})"
        )));
    }

    Ok(Actor::new(role, user_id))
}

fn role_from_sources(config: &Config, cli_role: Option<&str>, env: &EnvActor) -> Result<Role> {
    match non_empty(cli_role).or_else(|| non_empty(env.role.as_deref())) {
        Some(raw) => raw.parse(),
        None => Ok(config.actor.role),
    }
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
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

    fn clean() -> EnvActor {
        EnvActor::default()
    }

    #[test]
    fn cli_flags_win_over_config() {
        let mut config = Config::default();
        config.actor.role = Role::User;
        config.actor.user_id = Some("from-config".to_string());

        let actor =
            actor_from_sources(&config, Some("admin"), Some("u9"), &clean()).expect("actor");
        assert_eq!(actor, Actor::new(Role::Admin, Some("u9".to_string())));
    }

    #[test]
    fn cli_flags_win_over_environment() {
        let env = EnvActor {
            role: Some("user".to_string()),
            user_id: Some("env-user".to_string()),
        };
        let actor =
            actor_from_sources(&Config::default(), Some("admin"), Some("u9"), &env).expect("actor");
        assert_eq!(actor, Actor::new(Role::Admin, Some("u9".to_string())));
    }

    #[test]
    fn environment_wins_over_config() {
        let mut config = Config::default();
        config.actor.role = Role::Admin;
        config.actor.user_id = Some("from-config".to_string());
        let env = EnvActor {
            role: Some("user".to_string()),
            user_id: Some("env-user".to_string()),
        };

        let actor = actor_from_sources(&config, None, None, &env).expect("actor");
        assert_eq!(actor, Actor::user("env-user"));
    }

    #[test]
    fn config_supplies_user_id() {
        let mut config = Config::default();
        config.actor.user_id = Some(" u1 ".to_string());

        let actor = actor_from_sources(&config, Some("user"), None, &clean()).expect("actor");
        assert_eq!(actor.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn user_without_any_id_is_rejected() {
        assert!(matches!(
            actor_from_sources(&Config::default(), Some("user"), None, &clean()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn admin_needs_no_user_id() {
        let actor = actor_from_sources(&Config::default(), Some("manager"), Some("  "), &clean())
            .expect("actor");
        assert!(actor.role.is_admin());
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(matches!(
            role_from_sources(&Config::default(), Some("owner"), &clean()),
            Err(Error::InvalidArgument(_))
        ));
    }
}
