//! sprintsync task command implementations.

use serde::Serialize;

use crate::board::TaskBoard;
use crate::cli::Context;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::task::{Task, TaskDraft, TaskEdit, TaskStatus};
use crate::users::UserDirectory;

/// How deep to page through the directory when resolving an assignee id.
const ASSIGNEE_LOOKUP_LIMIT: u32 = 100;

#[derive(Serialize)]
struct ColumnView<'a> {
    status: TaskStatus,
    tasks: &'a [Task],
    total_items: u64,
    has_next_page: bool,
}

fn column_view(board: &TaskBoard, status: TaskStatus) -> ColumnView<'_> {
    let pagination = board.state.pagination(status);
    ColumnView {
        status,
        tasks: board.state.tasks(status),
        total_items: pagination.total_items,
        has_next_page: pagination.has_next_page,
    }
}

fn task_line(task: &Task) -> String {
    let assignee = task
        .assigned_to
        .as_ref()
        .map(|user| format!(" @{}", user.display_name()))
        .unwrap_or_default();
    format!(
        "  [{}] {} ({}m est, {}m spent){}",
        task.id, task.title, task.total_minutes, task.total_time_spent, assignee
    )
}

fn push_column(human: &mut HumanOutput, board: &TaskBoard, status: TaskStatus) {
    let pagination = board.state.pagination(status);
    human.push_detail(format!("{} ({} total)", status, pagination.total_items));
    for task in board.state.tasks(status) {
        human.push_detail(task_line(task));
    }
}

pub async fn run_board(context: &Context, limit: Option<u32>) -> Result<()> {
    let limit = limit.unwrap_or_else(|| context.page_size());
    let mut board = TaskBoard::new(context.client());
    for status in TaskStatus::ALL {
        board.load_page(status, 1, limit).await?;
    }

    #[derive(Serialize)]
    struct BoardView<'a> {
        columns: Vec<ColumnView<'a>>,
    }
    let view = BoardView {
        columns: TaskStatus::ALL
            .iter()
            .map(|status| column_view(&board, *status))
            .collect(),
    };

    let mut human = HumanOutput::new("Board");
    for status in TaskStatus::ALL {
        push_column(&mut human, &board, status);
    }
    emit_success(context.options, "board", &view, Some(&human))
}

pub async fn run_list(
    context: &Context,
    status: Option<String>,
    page: u32,
    limit: Option<u32>,
) -> Result<()> {
    let limit = limit.unwrap_or_else(|| context.page_size());
    let mut board = TaskBoard::new(context.client());

    let statuses: Vec<TaskStatus> = match status {
        Some(raw) => vec![TaskStatus::parse(&raw)?],
        None => TaskStatus::ALL.to_vec(),
    };
    for status in &statuses {
        board.load_page(*status, page, limit).await?;
    }

    #[derive(Serialize)]
    struct ListView<'a> {
        columns: Vec<ColumnView<'a>>,
    }
    let view = ListView {
        columns: statuses
            .iter()
            .map(|status| column_view(&board, *status))
            .collect(),
    };

    let mut human = HumanOutput::new("Tasks");
    for status in &statuses {
        push_column(&mut human, &board, *status);
    }
    emit_success(context.options, "task list", &view, Some(&human))
}

pub async fn run_new(
    context: &Context,
    title: String,
    description: String,
    minutes: u32,
) -> Result<()> {
    let mut board = TaskBoard::new(context.client());
    let task = board
        .create(&TaskDraft {
            title,
            description,
            total_minutes: minutes,
        })
        .await?;

    let mut human = HumanOutput::new(format!("Created task {}", task.id));
    human.push_summary("title", task.title.clone());
    human.push_summary("status", task.status.to_string());
    emit_success(context.options, "task new", &task, Some(&human))
}

pub async fn run_edit(
    context: &Context,
    id: String,
    title: Option<String>,
    description: Option<String>,
    minutes: Option<u32>,
    status: Option<String>,
) -> Result<()> {
    let status = status.as_deref().map(TaskStatus::parse).transpose()?;
    let edit = TaskEdit {
        title,
        description,
        total_minutes: minutes,
        status,
    };
    if edit.is_empty() {
        return Err(Error::InvalidArgument(
            "pass at least one of --title, --description, --minutes, --status".to_string(),
        ));
    }

    let mut board = TaskBoard::new(context.client());
    let task = board.update(&id, &edit).await?;

    let mut human = HumanOutput::new(format!("Updated task {}", task.id));
    human.push_summary("title", task.title.clone());
    human.push_summary("status", task.status.to_string());
    emit_success(context.options, "task edit", &task, Some(&human))
}

pub async fn run_move(context: &Context, id: String, status: String) -> Result<()> {
    let status = TaskStatus::parse(&status)?;
    let mut board = TaskBoard::new(context.client());
    board.move_status(&id, status).await?;

    #[derive(Serialize)]
    struct MoveView<'a> {
        id: &'a str,
        status: TaskStatus,
    }
    let human = HumanOutput::new(format!("Moved task {id} to {status}"));
    emit_success(
        context.options,
        "task move",
        &MoveView { id: &id, status },
        Some(&human),
    )
}

pub async fn run_delete(context: &Context, id: String) -> Result<()> {
    let mut board = TaskBoard::new(context.client());
    board.delete(&id).await?;

    #[derive(Serialize)]
    struct DeleteView<'a> {
        id: &'a str,
        deleted: bool,
    }
    let human = HumanOutput::new(format!("Deleted task {id}"));
    emit_success(
        context.options,
        "task delete",
        &DeleteView { id: &id, deleted: true },
        Some(&human),
    )
}

pub async fn run_assign(context: &Context, id: String, user_id: String) -> Result<()> {
    let mut directory = UserDirectory::new(context.client());
    directory.load_page(1, ASSIGNEE_LOOKUP_LIMIT, None).await?;
    let user = directory
        .find(&user_id)
        .ok_or_else(|| Error::UserNotFound(user_id.clone()))?
        .summary();

    let mut board = TaskBoard::new(context.client());
    board.assign(&id, user.clone()).await?;

    let mut human = HumanOutput::new(format!("Assigned task {id}"));
    human.push_summary("assignee", user.display_name());
    emit_success(context.options, "task assign", &user, Some(&human))
}

pub async fn run_unassign(context: &Context, id: String) -> Result<()> {
    let mut board = TaskBoard::new(context.client());
    board.unassign(&id).await?;

    #[derive(Serialize)]
    struct UnassignView<'a> {
        id: &'a str,
        cleared: bool,
    }
    let human = HumanOutput::new(format!("Cleared assignee on task {id}"));
    emit_success(
        context.options,
        "task unassign",
        &UnassignView { id: &id, cleared: true },
        Some(&human),
    )
}

pub async fn run_search(context: &Context, keyword: String) -> Result<()> {
    let mut board = TaskBoard::new(context.client());
    board.search(&keyword).await?;

    #[derive(Serialize)]
    struct SearchView<'a> {
        search_term: &'a str,
        count: usize,
        tasks: &'a [Task],
    }
    let results = &board.state.search_results;
    let view = SearchView {
        search_term: &board.state.search_term,
        count: results.len(),
        tasks: results,
    };

    let mut human = HumanOutput::new(format!(
        "{} task(s) matching '{}'",
        results.len(),
        board.state.search_term
    ));
    for task in results {
        human.push_detail(task_line(task));
    }
    emit_success(context.options, "task search", &view, Some(&human))
}

pub async fn run_show(context: &Context, id: String) -> Result<()> {
    let mut board = TaskBoard::new(context.client());
    'columns: for status in TaskStatus::ALL {
        let mut page = 1;
        loop {
            board.load_page(status, page, context.page_size()).await?;
            if board.state.find(&id).is_some() {
                break 'columns;
            }
            if !board.state.pagination(status).has_next_page {
                break;
            }
            page += 1;
        }
    }
    let task = board
        .state
        .find(&id)
        .cloned()
        .ok_or_else(|| Error::TaskNotFound(id.clone()))?;
    board.set_selected_task(Some(task.clone()));

    let mut human = HumanOutput::new(format!("Task {}", task.id));
    human.push_summary("title", task.title.clone());
    human.push_summary("status", task.status.to_string());
    human.push_summary("estimate", format!("{}m", task.total_minutes));
    human.push_summary("spent", format!("{}m", task.total_time_spent));
    if let Some(assignee) = &task.assigned_to {
        human.push_summary("assignee", assignee.display_name());
    }
    if !task.description.is_empty() {
        human.push_detail(task.description.clone());
    }
    emit_success(context.options, "task show", &task, Some(&human))
}
