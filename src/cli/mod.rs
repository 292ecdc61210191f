//! Command-line interface for taskboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Each group of subcommands lives in its own submodule.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::actor::{resolve_actor, resolve_role};
use crate::api::HttpTaskApi;
use crate::board::Board;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::TaskFilter;
use crate::output::OutputOptions;
use crate::policy::Role;
use crate::task::{parse_date, Priority, TaskStatus};

mod board;
mod lookup;
mod task;

/// taskboard - Kanban client for a REST task collection
///
/// Browse tasks as a paginated board and move them between stages under
/// role-based transition rules.
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a config file (defaults to ./.taskboard.toml, then the user config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the task API
    #[arg(long, global = true, env = "TASKBOARD_API_URL")]
    pub api_url: Option<String>,

    /// Acting role: admin or user
    #[arg(long, global = true)]
    pub role: Option<String>,

    /// Acting user id (required for the user role)
    #[arg(long, global = true)]
    pub user_id: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the Kanban board, one page per column
    Board {
        #[command(flatten)]
        filter: FilterArgs,

        /// Only show this column
        #[arg(long)]
        column: Option<String>,

        /// Page to show (applies to the selected column, or every column)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Items per page
        #[arg(long)]
        per_page: Option<usize>,
    },

    /// List tasks, newest first
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Move a task to a status
    Move {
        /// Task id
        task_id: String,

        /// Target status
        status: String,
    },

    /// Move a task to the next stage
    Next {
        /// Task id
        task_id: String,
    },

    /// Move a task to the previous stage
    Prev {
        /// Task id
        task_id: String,
    },

    /// Edit a single field of a task
    Edit {
        /// Task id
        task_id: String,

        /// Field: title, description, notes, deliverables, priority, assignee,
        /// due-date, start-date, attached-video
        field: String,

        /// New value (empty clears optional fields)
        value: String,
    },

    /// Delete a task (admin only)
    Delete {
        /// Task id
        task_id: String,
    },

    /// Show the statuses a role may move a task to (no network)
    Transitions {
        /// Current status
        status: String,
    },

    /// List users available for assignment
    Users,

    /// List service requests tasks can belong to
    Requests,
}

/// Fetch filters shared by `board` and `list`
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Only tasks with this status
    #[arg(long)]
    pub status: Option<String>,

    /// Only tasks with this priority
    #[arg(long)]
    pub priority: Option<String>,

    /// Only tasks assigned to this user id (admins only; users always see their own)
    #[arg(long)]
    pub assignee: Option<String>,

    /// Title search
    #[arg(long)]
    pub title: Option<String>,

    /// Only tasks belonging to this service request id
    #[arg(long)]
    pub service_request: Option<String>,

    /// Created on or after (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub created_from: Option<String>,

    /// Created on or before (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub created_to: Option<String>,

    /// Completed on or after (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub completed_from: Option<String>,

    /// Completed on or before (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub completed_to: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Result<TaskFilter> {
        fn date(raw: &Option<String>) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
            raw.as_deref().map(parse_date).transpose()
        }
        Ok(TaskFilter {
            status: self.status.as_deref().map(str::parse::<TaskStatus>).transpose()?,
            priority: self.priority.as_deref().map(str::parse::<Priority>).transpose()?,
            assigned_user_id: self.assignee.clone(),
            title: self.title.clone(),
            service_request_id: self.service_request.clone(),
            created_at_from: date(&self.created_from)?,
            created_at_to: date(&self.created_to)?,
            completed_date_from: date(&self.completed_from)?,
            completed_date_to: date(&self.completed_to)?,
        })
    }
}

/// Settings shared by every subcommand.
pub(crate) struct Context {
    pub config: Config,
    pub output: OutputOptions,
    role: Option<String>,
    user_id: Option<String>,
}

impl Context {
    fn new(
        config_path: Option<&Path>,
        api_url: Option<String>,
        role: Option<String>,
        user_id: Option<String>,
        output: OutputOptions,
    ) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Config::load(path)?,
            None => Config::discover(&std::env::current_dir()?)?,
        };
        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            config.api.base_url = url;
            config.validate()?;
        }
        Ok(Self {
            config,
            output,
            role,
            user_id,
        })
    }

    pub fn role(&self) -> Result<Role> {
        resolve_role(&self.config, self.role.as_deref())
    }

    pub fn api(&self) -> HttpTaskApi {
        HttpTaskApi::from_config(&self.config.api)
    }

    /// A board for the resolved actor, not yet loaded.
    pub fn board(&self) -> Result<Board<HttpTaskApi>> {
        let actor = resolve_actor(&self.config, self.role.as_deref(), self.user_id.as_deref())?;
        Ok(Board::new(self.api(), actor, &self.config))
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let command = self.command;
        let ctx = Context::new(
            self.config.as_deref(),
            self.api_url,
            self.role,
            self.user_id,
            output,
        )?;

        // Offline commands never start a runtime.
        if let Commands::Transitions { status } = &command {
            return task::run_transitions(&ctx, status);
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Io)?;

        runtime.block_on(async move {
            match command {
                Commands::Board {
                    filter,
                    column,
                    page,
                    per_page,
                } => {
                    board::run_board(
                        &ctx,
                        board::BoardOptions {
                            filter,
                            column,
                            page,
                            per_page,
                        },
                    )
                    .await
                }
                Commands::List { filter } => board::run_list(&ctx, &filter).await,
                Commands::Move { task_id, status } => {
                    task::run_move(&ctx, &task_id, &status).await
                }
                Commands::Next { task_id } => {
                    task::run_step(&ctx, &task_id, task::Step::Next).await
                }
                Commands::Prev { task_id } => {
                    task::run_step(&ctx, &task_id, task::Step::Prev).await
                }
                Commands::Edit {
                    task_id,
                    field,
                    value,
                } => task::run_edit(&ctx, &task_id, &field, &value).await,
                Commands::Delete { task_id } => task::run_delete(&ctx, &task_id).await,
                Commands::Users => lookup::run_users(&ctx).await,
                Commands::Requests => lookup::run_requests(&ctx).await,
                Commands::Transitions { status } => task::run_transitions(&ctx, &status),
            }
        })
    }
}
