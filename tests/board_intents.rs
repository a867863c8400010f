//! Board intents against a mock server: every operation hits the API first
//! and mutates the cached columns only from the response.

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sprintsync::board::TaskBoard;
use sprintsync::task::{TaskDraft, TaskEdit, TaskStatus};
use sprintsync::users::UserSummary;

mod support;
use support::{client_for, envelope, page_json, task_json};

fn user_summary(id: &str) -> UserSummary {
    UserSummary {
        id: id.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        is_admin: None,
    }
}

#[tokio::test]
async fn load_page_fills_one_column() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("status", "TODO"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(page_json(
            vec![task_json("t1", "TODO"), task_json("t2", "TODO")],
            1,
            2,
        ))))
        .mount(&server)
        .await;

    let mut board = TaskBoard::new(client_for(&server));
    board.load_page(TaskStatus::Todo, 1, 10).await.expect("load");

    assert_eq!(board.state.tasks(TaskStatus::Todo).len(), 2);
    assert!(board.state.tasks(TaskStatus::InProgress).is_empty());
    assert_eq!(board.state.pagination(TaskStatus::Todo).total_items, 2);
    assert!(!board.state.loading);
    assert!(board.state.error.is_none());
}

#[tokio::test]
async fn load_page_rejects_page_zero() {
    let server = MockServer::start().await;
    let mut board = TaskBoard::new(client_for(&server));
    let err = board
        .load_page(TaskStatus::Todo, 0, 10)
        .await
        .expect_err("page zero");
    assert!(err.to_string().contains("page"));
}

#[tokio::test]
async fn load_failure_records_error_and_keeps_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(page_json(
            vec![task_json("t1", "TODO")],
            1,
            1,
        ))))
        .expect(1)
        .mount(&server)
        .await;

    let mut board = TaskBoard::new(client_for(&server));
    board.load_page(TaskStatus::Todo, 1, 10).await.expect("load");

    // Second page blows up server-side; the column must stay as it was.
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "statusCode": "500",
            "message": "database unavailable",
        })))
        .mount(&server)
        .await;

    let err = board
        .load_page(TaskStatus::Todo, 2, 10)
        .await
        .expect_err("server error");
    assert!(err.to_string().contains("database unavailable"));
    assert_eq!(board.state.tasks(TaskStatus::Todo).len(), 1);
    assert_eq!(
        board.state.error.as_deref(),
        Some(err.to_string().as_str())
    );
}

#[tokio::test]
async fn create_lands_at_head_of_returned_column() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("status", "TODO"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(page_json(
            vec![task_json("t1", "TODO"), task_json("t2", "TODO")],
            1,
            2,
        ))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .and(body_json(json!({
            "title": "A",
            "description": "d",
            "totalMinutes": 30,
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(envelope(task_json("t9", "TODO"))),
        )
        .mount(&server)
        .await;

    let mut board = TaskBoard::new(client_for(&server));
    board.load_page(TaskStatus::Todo, 1, 10).await.expect("load");

    let created = board
        .create(&TaskDraft {
            title: "A".to_string(),
            description: "d".to_string(),
            total_minutes: 30,
        })
        .await
        .expect("create");

    assert_eq!(created.id, "t9");
    assert_eq!(board.state.tasks(TaskStatus::Todo)[0].id, "t9");
    assert_eq!(board.state.pagination(TaskStatus::Todo).total_items, 3);
}

#[tokio::test]
async fn update_rehomes_and_refetches_destination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("status", "TODO"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(page_json(
            vec![task_json("t1", "TODO")],
            1,
            1,
        ))))
        .mount(&server)
        .await;

    let mut echoed = task_json("t1", "DONE");
    echoed["title"] = json!("polished");
    Mock::given(method("PATCH"))
        .and(path("/tasks/t1"))
        .and(body_json(json!({"title": "polished", "status": "DONE"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(echoed.clone())))
        .mount(&server)
        .await;

    // Best-effort reconciliation fetch of the destination column.
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("status", "DONE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(page_json(
            vec![echoed.clone()],
            1,
            1,
        ))))
        .expect(1)
        .mount(&server)
        .await;

    let mut board = TaskBoard::new(client_for(&server));
    board.load_page(TaskStatus::Todo, 1, 10).await.expect("load");

    let updated = board
        .update(
            "t1",
            &TaskEdit {
                title: Some("polished".to_string()),
                status: Some(TaskStatus::Done),
                ..TaskEdit::default()
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.status, TaskStatus::Done);
    assert!(board.state.tasks(TaskStatus::Todo).is_empty());
    assert_eq!(board.state.pagination(TaskStatus::Todo).total_items, 0);
    assert_eq!(board.state.tasks(TaskStatus::Done)[0].title, "polished");
}

#[tokio::test]
async fn move_status_uses_client_copy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("status", "IN_PROGRESS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(page_json(
            vec![task_json("t1", "IN_PROGRESS")],
            1,
            1,
        ))))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/tasks/t1/status"))
        .and(body_json(json!({"status": "DONE"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statusCode": "200",
            "message": "status updated",
        })))
        .mount(&server)
        .await;

    let mut board = TaskBoard::new(client_for(&server));
    board
        .load_page(TaskStatus::InProgress, 1, 10)
        .await
        .expect("load");

    board
        .move_status("t1", TaskStatus::Done)
        .await
        .expect("move");

    assert!(board.state.tasks(TaskStatus::InProgress).is_empty());
    assert_eq!(
        board.state.pagination(TaskStatus::InProgress).total_items,
        0
    );
    let done = board.state.tasks(TaskStatus::Done);
    assert_eq!(done[0].id, "t1");
    assert_eq!(done[0].status, TaskStatus::Done);
    assert_eq!(board.state.pagination(TaskStatus::Done).total_items, 1);
}

#[tokio::test]
async fn delete_removes_from_whichever_column() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("status", "DONE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(page_json(
            vec![task_json("t7", "DONE")],
            1,
            1,
        ))))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/tasks/t7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statusCode": "200",
            "message": "deleted",
        })))
        .mount(&server)
        .await;

    let mut board = TaskBoard::new(client_for(&server));
    board.load_page(TaskStatus::Done, 1, 10).await.expect("load");

    board.delete("t7").await.expect("delete");
    assert!(board.state.tasks(TaskStatus::Done).is_empty());
    assert_eq!(board.state.pagination(TaskStatus::Done).total_items, 0);

    // Deleting an id that is not cached is acknowledged silently.
    Mock::given(method("DELETE"))
        .and(path("/tasks/ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statusCode": "200",
            "message": "deleted",
        })))
        .mount(&server)
        .await;
    board.delete("ghost").await.expect("delete unknown");
}

#[tokio::test]
async fn assign_and_unassign_mirror_selection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("status", "TODO"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(page_json(
            vec![task_json("t1", "TODO")],
            1,
            1,
        ))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tasks/t1/assign"))
        .and(body_json(json!({"assignedTo": "u1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statusCode": "200",
            "message": "assigned",
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/tasks/t1/assign"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statusCode": "200",
            "message": "unassigned",
        })))
        .mount(&server)
        .await;

    let mut board = TaskBoard::new(client_for(&server));
    board.load_page(TaskStatus::Todo, 1, 10).await.expect("load");
    let selected = board.state.tasks(TaskStatus::Todo)[0].clone();
    board.set_selected_task(Some(selected));

    board
        .assign("t1", user_summary("u1"))
        .await
        .expect("assign");
    let cached = board.state.find("t1").expect("cached");
    assert_eq!(cached.assigned_to.as_ref().expect("assignee").id, "u1");
    let mirrored = board.state.selected_task.as_ref().expect("selection");
    assert_eq!(mirrored.assigned_to.as_ref().expect("assignee").id, "u1");

    board.unassign("t1").await.expect("unassign");
    assert!(board.state.find("t1").expect("cached").assigned_to.is_none());
    assert!(board
        .state
        .selected_task
        .as_ref()
        .expect("selection")
        .assigned_to
        .is_none());
}

#[tokio::test]
async fn search_is_isolated_from_columns() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("status", "TODO"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(page_json(
            vec![task_json("t1", "TODO")],
            1,
            1,
        ))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/search"))
        .and(query_param("keyword", "deploy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "tasks": [task_json("t42", "DONE")],
            "count": 1,
            "searchTerm": "deploy",
        }))))
        .mount(&server)
        .await;

    let mut board = TaskBoard::new(client_for(&server));
    board.load_page(TaskStatus::Todo, 1, 10).await.expect("load");

    board.search("deploy").await.expect("search");
    assert_eq!(board.state.search_results.len(), 1);
    assert_eq!(board.state.search_term, "deploy");
    assert!(!board.state.search_loading);
    // The columns are untouched by the search path.
    assert_eq!(board.state.tasks(TaskStatus::Todo).len(), 1);
    assert!(board.state.tasks(TaskStatus::Done).is_empty());

    board.clear_search();
    assert!(board.state.search_results.is_empty());
    assert!(board.state.search_term.is_empty());
    assert_eq!(board.state.tasks(TaskStatus::Todo).len(), 1);
}

#[tokio::test]
async fn search_failure_clears_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks/search"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "statusCode": "500",
            "message": "search backend down",
        })))
        .mount(&server)
        .await;

    let mut board = TaskBoard::new(client_for(&server));
    board.state.search_results = vec![];
    let err = board.search("deploy").await.expect_err("search failure");
    assert!(err.to_string().contains("search backend down"));
    assert!(board.state.search_results.is_empty());
    assert!(board.state.error.is_some());
}
