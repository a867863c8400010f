//! sprintsync timelogs command implementation.

use crate::analytics::{self, TimeLogFilters};
use crate::cli::Context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

pub async fn run_timelogs(
    context: &Context,
    start_date: Option<String>,
    end_date: Option<String>,
    user_id: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<()> {
    let filters = TimeLogFilters {
        start_date,
        end_date,
        user_id,
        page,
        limit,
    };
    let api = context.client();
    let data = analytics::fetch_daily(&api, &filters).await?;

    let mut human = HumanOutput::new("Daily time logs");
    human.push_summary("total minutes", data.metrics.total_minutes.to_string());
    human.push_summary("users", data.metrics.total_users.to_string());
    human.push_summary("tasks", data.metrics.total_tasks.to_string());
    human.push_summary(
        "avg minutes/user",
        format!("{:.1}", data.metrics.average_minutes_per_user),
    );
    for row in &data.data {
        human.push_detail(format!(
            "  {} {} - {}m across {} task(s)",
            row.date, row.user_name, row.total_minutes, row.task_count
        ));
    }

    #[derive(serde::Serialize)]
    struct TimelogsView<'a> {
        data: &'a [crate::analytics::DailyTimeLog],
        metrics: &'a crate::analytics::TimeLogMetrics,
    }
    emit_success(
        context.options,
        "timelogs",
        &TimelogsView {
            data: &data.data,
            metrics: &data.metrics,
        },
        Some(&human),
    )
}
