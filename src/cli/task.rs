//! taskboard task commands: move, next, prev, edit, delete, transitions

use serde::Serialize;

use super::Context;
use crate::api::HttpTaskApi;
use crate::board::{Board, TransitionOutcome};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::policy::{self, Role};
use crate::task::{Task, TaskField, TaskStatus};

#[derive(Debug, Clone, Copy)]
pub enum Step {
    Next,
    Prev,
}

#[derive(Serialize)]
struct EditReport<'a> {
    task_id: &'a str,
    field: TaskField,
    task: Option<&'a Task>,
}

#[derive(Serialize)]
struct DeleteReport<'a> {
    task_id: &'a str,
    deleted: bool,
}

#[derive(Serialize)]
struct TransitionsReport {
    role: Role,
    status: TaskStatus,
    frozen: bool,
    allowed: Vec<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prev: Option<TaskStatus>,
}

/// Board with the actor's tasks loaded, or `TaskNotFound` when `task_id`
/// is not among them.
async fn loaded_board(ctx: &Context, task_id: &str) -> Result<Board<HttpTaskApi>> {
    let mut board = ctx.board()?;
    board.refresh().await?;
    if board.task(task_id).is_none() {
        return Err(Error::TaskNotFound(task_id.to_string()));
    }
    Ok(board)
}

pub async fn run_move(ctx: &Context, task_id: &str, status: &str) -> Result<()> {
    let target: TaskStatus = status.parse()?;
    let mut board = loaded_board(ctx, task_id).await?;
    let outcome = board.request_transition(task_id, target).await?;
    emit_transition(ctx, "move", &mut board, &outcome)
}

pub async fn run_step(ctx: &Context, task_id: &str, step: Step) -> Result<()> {
    let mut board = loaded_board(ctx, task_id).await?;
    let (command, outcome) = match step {
        Step::Next => ("next", board.advance(task_id).await?),
        Step::Prev => ("prev", board.retreat(task_id).await?),
    };
    emit_transition(ctx, command, &mut board, &outcome)
}

fn emit_transition(
    ctx: &Context,
    command: &str,
    board: &mut Board<HttpTaskApi>,
    outcome: &TransitionOutcome,
) -> Result<()> {
    let header = match outcome {
        TransitionOutcome::Moved { task_id, from, to } => {
            format!("taskboard {command}: {task_id} moved {from} -> {to}")
        }
        TransitionOutcome::Unchanged { task_id, status } => {
            format!("taskboard {command}: {task_id} already {status}")
        }
    };
    let mut human = HumanOutput::new(header);
    let task_id = match outcome {
        TransitionOutcome::Moved { task_id, .. } | TransitionOutcome::Unchanged { task_id, .. } => {
            task_id
        }
    };
    if let Some(task) = board.task(task_id) {
        human.push_summary("title", task.title.clone());
        if let Some(done) = task.completed_date {
            human.push_summary("completed", done.to_rfc3339());
        }
    }
    human.push_notifications(&board.drain_notifications());

    emit_success(ctx.output, command, outcome, Some(&human))
}

pub async fn run_edit(ctx: &Context, task_id: &str, field: &str, value: &str) -> Result<()> {
    let field: TaskField = field.parse()?;
    let mut board = loaded_board(ctx, task_id).await?;

    board.open_detail(task_id)?;
    board.begin_edit(field)?;
    board.set_draft(value);
    board.save_edit().await?;

    let notes = board.drain_notifications();
    let task = board.detail();
    let mut human = HumanOutput::new(format!("taskboard edit: {task_id} {field} updated"));
    if let Some(task) = task {
        let current = field.current_text(task);
        let shown = if current.is_empty() {
            "(cleared)".to_string()
        } else {
            current
        };
        human.push_summary(field.wire_name(), shown);
    }
    human.push_notifications(&notes);

    emit_success(
        ctx.output,
        "edit",
        &EditReport {
            task_id,
            field,
            task,
        },
        Some(&human),
    )
}

pub async fn run_delete(ctx: &Context, task_id: &str) -> Result<()> {
    let mut board = ctx.board()?;
    board.delete_task(task_id).await?;

    let mut human = HumanOutput::new(format!("taskboard delete: {task_id} deleted"));
    human.push_notifications(&board.drain_notifications());

    emit_success(
        ctx.output,
        "delete",
        &DeleteReport {
            task_id,
            deleted: true,
        },
        Some(&human),
    )
}

pub fn run_transitions(ctx: &Context, status: &str) -> Result<()> {
    let status: TaskStatus = status.parse()?;
    let role = ctx.role()?;
    let report = TransitionsReport {
        role,
        status,
        frozen: policy::is_frozen(role, status),
        allowed: policy::allowed_targets(role, status),
        next: status.next(),
        prev: status.prev(),
    };

    let mut human = HumanOutput::new(format!("taskboard transitions: {status} as {role}"));
    if report.allowed.is_empty() {
        human.push_summary("allowed", "(none)");
    } else {
        let allowed: Vec<&str> = report.allowed.iter().map(|status| status.as_str()).collect();
        human.push_summary("allowed", allowed.join(", "));
    }
    if report.frozen {
        human.push_warning("this stage is manager-only");
    }

    emit_success(ctx.output, "transitions", &report, Some(&human))
}
