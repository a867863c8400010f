#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::MockServer;

use sprintsync::api::ApiClient;
use sprintsync::config::Config;

pub fn config_for(server: &MockServer) -> Config {
    Config {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        page_size: 10,
    }
}

pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&config_for(server))
}

/// Wrap a data payload in the API's response envelope.
pub fn envelope(data: Value) -> Value {
    json!({
        "statusCode": "200",
        "message": "OK",
        "data": data,
    })
}

pub fn task_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Task {id}"),
        "description": "",
        "status": status,
        "totalMinutes": 30,
        "totalTimeSpent": 0,
        "assignedTo": null,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z",
    })
}

pub fn page_json(tasks: Vec<Value>, current_page: u32, total_items: u64) -> Value {
    json!({
        "tasks": tasks,
        "pagination": {
            "currentPage": current_page,
            "itemsPerPage": 10,
            "totalItems": total_items,
            "totalPages": 1,
            "hasNextPage": false,
            "hasPreviousPage": false,
        },
    })
}
