//! taskboard board / list commands

use serde::Serialize;

use super::{Context, FilterArgs};
use crate::board::RefreshOutcome;
use crate::column::ColumnView;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::task::{Task, TaskStatus};

/// Options for the board command
pub struct BoardOptions {
    pub filter: FilterArgs,
    pub column: Option<String>,
    pub page: usize,
    pub per_page: Option<usize>,
}

#[derive(Serialize)]
struct BoardReport {
    total: usize,
    columns: Vec<ColumnView>,
}

#[derive(Serialize)]
struct ListReport<'a> {
    total: usize,
    tasks: &'a [Task],
}

pub async fn run_board(ctx: &Context, options: BoardOptions) -> Result<()> {
    let mut board = ctx.board()?;
    board.set_filter(options.filter.to_filter()?);
    let total = loaded_count(board.refresh().await?);

    let statuses: Vec<TaskStatus> = match options.column.as_deref() {
        Some(raw) => vec![raw.parse()?],
        None => TaskStatus::BOARD.to_vec(),
    };

    let mut columns = Vec::with_capacity(statuses.len());
    for status in statuses {
        if let Some(per_page) = options.per_page {
            board.set_items_per_page(status, per_page)?;
        }
        board.set_page(status, options.page)?;
        columns.push(board.column(status)?);
    }

    let mut human = HumanOutput::new(format!("taskboard board: {total} task(s)"));
    human.push_summary("role", board.actor().role.as_str());
    if let Some(user) = board.actor().user_id.as_deref() {
        human.push_summary("user", user);
    }
    for column in &columns {
        human.push_detail(format!(
            "{} ({} task(s), page {}/{})",
            column.status, column.total_count, column.current_page, column.total_pages
        ));
        for task in &column.tasks {
            human.push_detail(format!("  {}", task_line(task)));
        }
    }
    human.push_notifications(&board.drain_notifications());

    emit_success(
        ctx.output,
        "board",
        &BoardReport { total, columns },
        Some(&human),
    )
}

pub async fn run_list(ctx: &Context, filter: &FilterArgs) -> Result<()> {
    let mut board = ctx.board()?;
    board.set_filter(filter.to_filter()?);
    let total = loaded_count(board.refresh().await?);

    let notes = board.drain_notifications();
    let tasks = board.cache().tasks();
    let mut human = HumanOutput::new(format!("taskboard list: {total} task(s)"));
    for task in tasks {
        human.push_detail(format!("[{}] {}", task.status, task_line(task)));
    }
    human.push_notifications(&notes);

    emit_success(
        ctx.output,
        "list",
        &ListReport { total, tasks },
        Some(&human),
    )
}

fn loaded_count(outcome: RefreshOutcome) -> usize {
    match outcome {
        RefreshOutcome::Loaded { count } => count,
        RefreshOutcome::AlreadyLoading => 0,
    }
}

pub(super) fn task_line(task: &Task) -> String {
    let mut line = format!("{} {}", task.id, task.title);
    if let Some(priority) = task.priority {
        line.push_str(&format!(" [{priority}]"));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", due.format("%Y-%m-%d")));
    }
    if let Some(user) = task.assigned_user_id.as_ref() {
        line.push_str(&format!(" @{}", user.label()));
    }
    line
}
