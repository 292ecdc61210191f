//! taskboard - Kanban task board client library
//!
//! This library provides the core functionality for the taskboard CLI:
//! loading a paginated REST task collection, deriving Kanban columns, and
//! moving tasks between stages under role-based rules.
//!
//! # Core Concepts
//!
//! - **Tasks**: Units of work with a status, priority and due date
//! - **Roles**: Admins move tasks freely; users walk a restricted graph and
//!   cannot touch the manager-only `accepted` / `completed` stages
//! - **Columns**: One per board status, sorted by priority then due date,
//!   paginated independently
//! - **Optimistic moves**: Status changes apply locally first and are rolled
//!   back when the API refuses them
//!
//! # Module Organization
//!
//! - `task`: Task entity, statuses, priorities and partial-update bodies
//! - `policy`: Status transition rules per role
//! - `filter`: Fetch filters and their query encoding
//! - `api`: `TaskApi` trait and the reqwest-backed HTTP client
//! - `cache`: Fetch-all across pages and the in-memory task cache
//! - `column`: Column derivation and per-column pagination
//! - `board`: Board state, drag/drop and the transition controller
//! - `editor`: Single-field edit state for the detail view
//! - `notify`: Transient notifications
//! - `actor`: Role and user id resolution
//! - `config`: Configuration loading from `.taskboard.toml`
//! - `output`: Human and JSON output envelopes
//! - `cli`: Command-line interface using clap
//! - `error`: Error types and result aliases

pub mod actor;
pub mod api;
pub mod board;
pub mod cache;
pub mod cli;
pub mod column;
pub mod config;
pub mod editor;
pub mod error;
pub mod filter;
pub mod notify;
pub mod output;
pub mod policy;
pub mod task;

pub use error::{Error, Result};
