//! Task board store.
//!
//! Tasks are cached in three per-status columns, each with its own pagination
//! cursor. Intents call the API and then apply a pure state transition; a
//! failed call records an error and leaves the cached state untouched.
//!
//! Invariants kept by the reducers:
//! - a task id appears in exactly one column, and that column matches the
//!   task's `status` field;
//! - a column's `total_items` moves by exactly one on a local create, delete,
//!   or move, and is overwritten wholesale by page loads.

use std::collections::HashMap;

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::task::{Pagination, SearchData, Task, TaskDraft, TaskEdit, TaskPage, TaskStatus};
use crate::users::UserSummary;

/// One status column: ordered tasks plus the server's pagination cursor.
#[derive(Debug, Clone, Default)]
pub struct Column {
    pub tasks: Vec<Task>,
    pub pagination: Pagination,
    /// Newest load token issued for this column. A page load applies only if
    /// it still carries this value, so a slow page-1 response cannot clobber
    /// a newer load.
    latest_load: u64,
}

/// Loaded-task counts per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
}

/// Pure board state: columns, id index, selection, and the search path.
#[derive(Debug, Clone, Default)]
pub struct BoardState {
    todo: Column,
    in_progress: Column,
    done: Column,
    /// id -> column, maintained alongside the columns for O(1) lookup.
    index: HashMap<String, TaskStatus>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected_task: Option<Task>,
    pub search_results: Vec<Task>,
    pub search_loading: bool,
    pub search_term: String,
}

impl BoardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(&self, status: TaskStatus) -> &Column {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Done => &self.done,
        }
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Column {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Done => &mut self.done,
        }
    }

    // =========================================================================
    // Selectors
    // =========================================================================

    pub fn tasks(&self, status: TaskStatus) -> &[Task] {
        &self.column(status).tasks
    }

    pub fn pagination(&self, status: TaskStatus) -> &Pagination {
        &self.column(status).pagination
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        let status = self.locate(id)?;
        self.column(status).tasks.iter().find(|task| task.id == id)
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts {
            todo: self.todo.tasks.len(),
            in_progress: self.in_progress.tasks.len(),
            done: self.done.tasks.len(),
        }
    }

    /// Sum of estimates across every loaded task.
    pub fn total_estimated_minutes(&self) -> u64 {
        TaskStatus::ALL
            .iter()
            .flat_map(|status| self.column(*status).tasks.iter())
            .map(|task| u64::from(task.total_minutes))
            .sum()
    }

    /// Column holding the given id. The index answers directly; when it has
    /// no entry the columns are scanned in the fixed TODO, IN_PROGRESS, DONE
    /// order and the first match wins.
    fn locate(&self, id: &str) -> Option<TaskStatus> {
        if let Some(status) = self.index.get(id) {
            return Some(*status);
        }
        TaskStatus::ALL
            .into_iter()
            .find(|status| self.column(*status).tasks.iter().any(|task| task.id == id))
    }

    // =========================================================================
    // Reducers
    // =========================================================================

    /// Issue a load token for a column. The newest token wins; see
    /// [`Column::latest_load`].
    pub fn issue_load(&mut self, status: TaskStatus) -> u64 {
        let column = self.column_mut(status);
        column.latest_load += 1;
        column.latest_load
    }

    /// Apply a fetched page. Page 1 replaces the column; later pages append.
    /// Returns false (and changes nothing) when the token is stale.
    pub fn apply_page(&mut self, status: TaskStatus, page: TaskPage, token: u64) -> bool {
        if self.column(status).latest_load != token {
            return false;
        }

        let mut pagination = page.pagination;
        pagination.has_previous_page = pagination.current_page > 1;

        if pagination.current_page <= 1 {
            let stale: Vec<String> = self
                .column(status)
                .tasks
                .iter()
                .map(|task| task.id.clone())
                .collect();
            for id in stale {
                self.index.remove(&id);
            }
            for task in &page.tasks {
                self.index.insert(task.id.clone(), status);
            }
            let column = self.column_mut(status);
            column.tasks = page.tasks;
            column.pagination = pagination;
        } else {
            for task in &page.tasks {
                self.index.insert(task.id.clone(), status);
            }
            let column = self.column_mut(status);
            column.tasks.extend(page.tasks);
            column.pagination = pagination;
        }
        true
    }

    /// Insert a task at the head of the column matching its status.
    pub fn insert_task(&mut self, task: Task) {
        let status = task.status;
        self.index.insert(task.id.clone(), status);
        let column = self.column_mut(status);
        column.tasks.insert(0, task);
        column.pagination.total_items += 1;
    }

    /// Remove a task by id from whichever column holds it. Silent no-op when
    /// the id is unknown.
    pub fn remove_task(&mut self, id: &str) -> Option<Task> {
        let status = self.locate(id)?;
        self.index.remove(id);
        if let Some(task) = self.take_from(status, id) {
            return Some(task);
        }
        // Index pointed at the wrong column; fall back to the fixed scan order.
        TaskStatus::ALL
            .into_iter()
            .find_map(|status| self.take_from(status, id))
    }

    fn take_from(&mut self, status: TaskStatus, id: &str) -> Option<Task> {
        let column = self.column_mut(status);
        let position = column.tasks.iter().position(|task| task.id == id)?;
        let task = column.tasks.remove(position);
        column.pagination.total_items = column.pagination.total_items.saturating_sub(1);
        Some(task)
    }

    /// Replace a task with the server-echoed copy: out of the old column,
    /// onto the head of the column matching the returned status. A
    /// same-status edit therefore surfaces the task at the head of its own
    /// column, which is the intended recently-edited-first behavior.
    pub fn apply_update(&mut self, updated: Task) {
        self.remove_task(&updated.id);
        self.insert_task(updated);
    }

    /// Move the client-held copy of a task to a new column. Returns false
    /// when the id is unknown.
    pub fn apply_move(&mut self, id: &str, status: TaskStatus) -> bool {
        let Some(mut task) = self.remove_task(id) else {
            return false;
        };
        task.status = status;
        self.insert_task(task);
        true
    }

    /// Set or clear `assignedTo` on the located task, mirroring the change
    /// into `selected_task` when it is the same task.
    pub fn set_assignee(&mut self, id: &str, assignee: Option<UserSummary>) -> bool {
        let mut found = false;
        if let Some(status) = self.locate(id) {
            let column = self.column_mut(status);
            if let Some(task) = column.tasks.iter_mut().find(|task| task.id == id) {
                task.assigned_to = assignee.clone();
                found = true;
            }
        }
        if let Some(selected) = self.selected_task.as_mut() {
            if selected.id == id {
                selected.assigned_to = assignee;
                found = true;
            }
        }
        found
    }

    pub fn set_selected_task(&mut self, task: Option<Task>) {
        self.selected_task = task;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn apply_search(&mut self, data: SearchData) {
        self.search_results = data.tasks;
        self.search_term = data.search_term;
        self.search_loading = false;
    }

    pub fn clear_search(&mut self) {
        self.search_results = Vec::new();
        self.search_term = String::new();
    }
}

/// The task board: cached state plus the asynchronous intents that keep it
/// aligned with the server. Construct one per API client; tests build a fresh
/// board per case.
pub struct TaskBoard {
    api: ApiClient,
    pub state: BoardState,
}

impl TaskBoard {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: BoardState::new(),
        }
    }

    /// Fetch one page of a column. Page 1 refreshes the column, later pages
    /// extend it (infinite scroll).
    pub async fn load_page(&mut self, status: TaskStatus, page: u32, limit: u32) -> Result<()> {
        if page < 1 {
            return Err(Error::InvalidArgument("page must be at least 1".to_string()));
        }

        let token = self.state.issue_load(status);
        self.state.loading = true;
        self.state.error = None;

        let query = [
            ("status", status.as_str().to_string()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ];
        let result = self.api.get::<TaskPage>("/tasks", &query).await;
        self.state.loading = false;

        match result {
            Ok(fetched) => {
                if !self.state.apply_page(status, fetched, token) {
                    tracing::debug!(%status, page, "dropping stale page load");
                }
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Create a task; the server-assigned copy lands at the head of the
    /// column matching its returned status.
    pub async fn create(&mut self, draft: &TaskDraft) -> Result<Task> {
        match self.api.post::<_, Task>("/tasks", draft).await {
            Ok(task) => {
                self.state.insert_task(task.clone());
                Ok(task)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Patch task fields. The server echo is authoritative: the task is
    /// re-homed to the column of the returned status, then the destination's
    /// first page is refetched best-effort to reconcile ordering.
    pub async fn update(&mut self, id: &str, edit: &TaskEdit) -> Result<Task> {
        if edit.is_empty() {
            return Err(Error::InvalidArgument("nothing to update".to_string()));
        }

        let updated: Task = match self.api.patch(&format!("/tasks/{id}"), edit).await {
            Ok(task) => task,
            Err(err) => return Err(self.fail(err)),
        };
        let destination = updated.status;
        self.state.apply_update(updated.clone());

        let limit = self.state.pagination(destination).items_per_page.max(1);
        if let Err(err) = self.load_page(destination, 1, limit).await {
            tracing::warn!(%err, %destination, "post-update column refresh failed");
        }
        Ok(updated)
    }

    /// Move a task to another column via the ack-only status endpoint. The
    /// local copy is re-homed with its status overwritten; no refetch.
    pub async fn move_status(&mut self, id: &str, status: TaskStatus) -> Result<()> {
        let body = serde_json::json!({ "status": status });
        if let Err(err) = self.api.patch_ack(&format!("/tasks/{id}/status"), &body).await {
            return Err(self.fail(err));
        }
        if !self.state.apply_move(id, status) {
            tracing::debug!(id, "moved task is not cached locally");
        }
        Ok(())
    }

    /// Delete a task. Removal from the cache is a silent no-op when the id
    /// is not loaded.
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        if let Err(err) = self.api.delete_ack(&format!("/tasks/{id}")).await {
            return Err(self.fail(err));
        }
        self.state.remove_task(id);
        Ok(())
    }

    /// Assign a task to a user, mirroring into the selection.
    pub async fn assign(&mut self, id: &str, user: UserSummary) -> Result<()> {
        let body = serde_json::json!({ "assignedTo": user.id });
        if let Err(err) = self.api.post_ack(&format!("/tasks/{id}/assign"), &body).await {
            return Err(self.fail(err));
        }
        self.state.set_assignee(id, Some(user));
        Ok(())
    }

    /// Clear a task's assignee, mirroring into the selection.
    pub async fn unassign(&mut self, id: &str) -> Result<()> {
        if let Err(err) = self.api.delete_ack(&format!("/tasks/{id}/assign")).await {
            return Err(self.fail(err));
        }
        self.state.set_assignee(id, None);
        Ok(())
    }

    /// Keyword search. Lives entirely beside the columns: results land in
    /// `search_results` and never touch the cached columns.
    pub async fn search(&mut self, keyword: &str) -> Result<()> {
        self.state.search_loading = true;
        let query = [("keyword", keyword.to_string())];
        match self.api.get::<SearchData>("/tasks/search", &query).await {
            Ok(data) => {
                self.state.apply_search(data);
                Ok(())
            }
            Err(err) => {
                self.state.search_loading = false;
                self.state.search_results = Vec::new();
                Err(self.fail(err))
            }
        }
    }

    pub fn clear_search(&mut self) {
        self.state.clear_search();
    }

    pub fn set_selected_task(&mut self, task: Option<Task>) {
        self.state.set_selected_task(task);
    }

    /// Record the failure for state readers, then hand it back to the caller.
    fn fail(&mut self, err: Error) -> Error {
        self.state.error = Some(err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: &str, status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: String::new(),
            status,
            total_minutes: 30,
            total_time_spent: 0,
            assigned_to: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn page(tasks: Vec<Task>, current_page: u32, total_items: u64) -> TaskPage {
        TaskPage {
            tasks,
            pagination: Pagination {
                current_page,
                items_per_page: 10,
                total_items,
                total_pages: 1,
                has_next_page: false,
                has_previous_page: false,
            },
        }
    }

    fn user(id: &str) -> UserSummary {
        UserSummary {
            id: id.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            is_admin: None,
        }
    }

    /// Every cached id lives in exactly one column, and that column matches
    /// the task's own status.
    fn assert_partition_exclusivity(state: &BoardState) {
        let mut seen = std::collections::HashSet::new();
        for status in TaskStatus::ALL {
            for task in state.tasks(status) {
                assert_eq!(task.status, status, "task {} in wrong column", task.id);
                assert!(seen.insert(task.id.clone()), "task {} in two columns", task.id);
            }
        }
    }

    #[test]
    fn page_one_replaces_and_later_pages_append() {
        let mut state = BoardState::new();
        let token = state.issue_load(TaskStatus::Todo);
        state.apply_page(
            TaskStatus::Todo,
            page(vec![task("t1", TaskStatus::Todo)], 1, 5),
            token,
        );
        assert_eq!(state.tasks(TaskStatus::Todo).len(), 1);

        let token = state.issue_load(TaskStatus::Todo);
        state.apply_page(
            TaskStatus::Todo,
            page(vec![task("t2", TaskStatus::Todo)], 2, 5),
            token,
        );
        let ids: Vec<&str> = state
            .tasks(TaskStatus::Todo)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert!(state.pagination(TaskStatus::Todo).has_previous_page);

        let token = state.issue_load(TaskStatus::Todo);
        state.apply_page(
            TaskStatus::Todo,
            page(vec![task("t3", TaskStatus::Todo)], 1, 5),
            token,
        );
        let ids: Vec<&str> = state
            .tasks(TaskStatus::Todo)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t3"]);
        assert!(!state.pagination(TaskStatus::Todo).has_previous_page);
        assert_partition_exclusivity(&state);
    }

    #[test]
    fn stale_page_load_is_ignored() {
        let mut state = BoardState::new();
        let slow = state.issue_load(TaskStatus::Todo);
        let fast = state.issue_load(TaskStatus::Todo);

        assert!(state.apply_page(
            TaskStatus::Todo,
            page(vec![task("fresh", TaskStatus::Todo)], 1, 1),
            fast,
        ));
        // The earlier request resolves late; its token has been superseded.
        assert!(!state.apply_page(
            TaskStatus::Todo,
            page(vec![task("stale", TaskStatus::Todo)], 1, 1),
            slow,
        ));
        assert_eq!(state.tasks(TaskStatus::Todo)[0].id, "fresh");
    }

    #[test]
    fn create_inserts_at_head_and_bumps_count() {
        let mut state = BoardState::new();
        let token = state.issue_load(TaskStatus::Todo);
        state.apply_page(
            TaskStatus::Todo,
            page(
                vec![task("t1", TaskStatus::Todo), task("t2", TaskStatus::Todo)],
                1,
                2,
            ),
            token,
        );

        state.insert_task(task("t9", TaskStatus::Todo));
        assert_eq!(state.tasks(TaskStatus::Todo)[0].id, "t9");
        assert_eq!(state.pagination(TaskStatus::Todo).total_items, 3);
        assert_eq!(state.pagination(TaskStatus::InProgress).total_items, 0);
        assert_partition_exclusivity(&state);
    }

    #[test]
    fn move_is_atomic_across_columns() {
        let mut state = BoardState::new();
        let token = state.issue_load(TaskStatus::InProgress);
        state.apply_page(
            TaskStatus::InProgress,
            page(vec![task("t1", TaskStatus::InProgress)], 1, 1),
            token,
        );

        assert!(state.apply_move("t1", TaskStatus::Done));
        assert!(state.tasks(TaskStatus::InProgress).is_empty());
        assert_eq!(state.pagination(TaskStatus::InProgress).total_items, 0);
        assert_eq!(state.tasks(TaskStatus::Done)[0].id, "t1");
        assert_eq!(state.tasks(TaskStatus::Done)[0].status, TaskStatus::Done);
        assert_eq!(state.pagination(TaskStatus::Done).total_items, 1);
        assert_partition_exclusivity(&state);
    }

    #[test]
    fn same_status_move_relocates_to_head() {
        let mut state = BoardState::new();
        let token = state.issue_load(TaskStatus::Todo);
        state.apply_page(
            TaskStatus::Todo,
            page(
                vec![task("t1", TaskStatus::Todo), task("t2", TaskStatus::Todo)],
                1,
                2,
            ),
            token,
        );

        assert!(state.apply_move("t2", TaskStatus::Todo));
        let ids: Vec<&str> = state
            .tasks(TaskStatus::Todo)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t2", "t1"]);
        assert_eq!(state.pagination(TaskStatus::Todo).total_items, 2);
    }

    #[test]
    fn delete_unknown_id_is_silent() {
        let mut state = BoardState::new();
        assert!(state.remove_task("ghost").is_none());
        assert_eq!(state.pagination(TaskStatus::Todo).total_items, 0);
    }

    #[test]
    fn update_rehomes_to_returned_status() {
        let mut state = BoardState::new();
        let token = state.issue_load(TaskStatus::Todo);
        state.apply_page(
            TaskStatus::Todo,
            page(vec![task("t1", TaskStatus::Todo)], 1, 1),
            token,
        );

        let mut echoed = task("t1", TaskStatus::InProgress);
        echoed.title = "renamed".to_string();
        state.apply_update(echoed);

        assert!(state.tasks(TaskStatus::Todo).is_empty());
        assert_eq!(state.tasks(TaskStatus::InProgress)[0].title, "renamed");
        assert_eq!(state.pagination(TaskStatus::Todo).total_items, 0);
        assert_eq!(state.pagination(TaskStatus::InProgress).total_items, 1);
        assert_partition_exclusivity(&state);
    }

    #[test]
    fn assign_mirrors_into_selection() {
        let mut state = BoardState::new();
        let token = state.issue_load(TaskStatus::Todo);
        state.apply_page(
            TaskStatus::Todo,
            page(vec![task("t1", TaskStatus::Todo)], 1, 1),
            token,
        );
        state.set_selected_task(Some(task("t1", TaskStatus::Todo)));

        assert!(state.set_assignee("t1", Some(user("u1"))));
        let cached = state.find("t1").expect("cached task");
        assert_eq!(cached.assigned_to.as_ref().expect("assignee").id, "u1");
        let selected = state.selected_task.as_ref().expect("selection");
        assert_eq!(selected.assigned_to.as_ref().expect("assignee").id, "u1");

        assert!(state.set_assignee("t1", None));
        assert!(state.find("t1").expect("cached task").assigned_to.is_none());
        assert!(state
            .selected_task
            .as_ref()
            .expect("selection")
            .assigned_to
            .is_none());
    }

    #[test]
    fn selection_mirror_skips_other_tasks() {
        let mut state = BoardState::new();
        let token = state.issue_load(TaskStatus::Todo);
        state.apply_page(
            TaskStatus::Todo,
            page(vec![task("t1", TaskStatus::Todo)], 1, 1),
            token,
        );
        state.set_selected_task(Some(task("other", TaskStatus::Done)));

        state.set_assignee("t1", Some(user("u1")));
        assert!(state
            .selected_task
            .as_ref()
            .expect("selection")
            .assigned_to
            .is_none());
    }

    #[test]
    fn search_leaves_columns_alone() {
        let mut state = BoardState::new();
        let token = state.issue_load(TaskStatus::Todo);
        state.apply_page(
            TaskStatus::Todo,
            page(vec![task("t1", TaskStatus::Todo)], 1, 1),
            token,
        );

        state.apply_search(SearchData {
            tasks: vec![task("t1", TaskStatus::Todo), task("x1", TaskStatus::Done)],
            count: 2,
            search_term: "t".to_string(),
        });
        assert_eq!(state.search_results.len(), 2);
        assert_eq!(state.tasks(TaskStatus::Todo).len(), 1);

        state.clear_search();
        assert!(state.search_results.is_empty());
        assert!(state.search_term.is_empty());
        assert_eq!(state.tasks(TaskStatus::Todo).len(), 1);
    }

    #[test]
    fn counts_and_minutes_cover_all_columns() {
        let mut state = BoardState::new();
        state.insert_task(task("a", TaskStatus::Todo));
        state.insert_task(task("b", TaskStatus::InProgress));
        state.insert_task(task("c", TaskStatus::Done));
        state.insert_task(task("d", TaskStatus::Done));

        let counts = state.counts();
        assert_eq!(counts.todo, 1);
        assert_eq!(counts.in_progress, 1);
        assert_eq!(counts.done, 2);
        assert_eq!(state.total_estimated_minutes(), 120);
    }
}
