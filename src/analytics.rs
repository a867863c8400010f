//! Time-tracking analytics over `GET /timelogs/daily`.

use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::error::Result;
use crate::task::Pagination;

/// Minutes logged against one task within a day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLogSession {
    pub task_id: String,
    pub task_title: String,
    pub minutes: u32,
    pub sessions: u32,
}

/// One user's logged time for one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTimeLog {
    pub date: String,
    pub user_id: String,
    pub user_name: String,
    pub total_minutes: u32,
    pub task_count: u32,
    #[serde(default)]
    pub time_logs: Vec<TimeLogSession>,
}

/// Aggregates across the filtered window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeLogMetrics {
    pub total_minutes: u64,
    pub total_users: u32,
    pub total_tasks: u32,
    pub total_sessions: u32,
    pub average_minutes_per_user: f64,
    pub average_minutes_per_task: f64,
}

/// Wire shape of the `/timelogs/daily` data payload.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeLogData {
    pub data: Vec<DailyTimeLog>,
    pub metrics: TimeLogMetrics,
    pub pagination: Pagination,
}

/// Optional filters for the daily time-log listing. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default)]
pub struct TimeLogFilters {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub user_id: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TimeLogFilters {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(start) = &self.start_date {
            query.push(("startDate", start.clone()));
        }
        if let Some(end) = &self.end_date {
            query.push(("endDate", end.clone()));
        }
        if let Some(user_id) = &self.user_id {
            query.push(("userId", user_id.clone()));
        }
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

/// Fetch daily time logs with metrics and pagination.
pub async fn fetch_daily(api: &ApiClient, filters: &TimeLogFilters) -> Result<TimeLogData> {
    api.get("/timelogs/daily", &filters.query()).await
}
