//! sprintsync user and admin command implementations.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::Context;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::users::{BulkUserRequest, UserDirectory, UserRecord};

fn user_line(user: &UserRecord) -> String {
    let role = if user.is_admin { " [admin]" } else { "" };
    format!(
        "  {} {} <{}>{}",
        user.first_name, user.last_name, user.email, role
    )
}

pub async fn run_users(
    context: &Context,
    page: u32,
    limit: Option<u32>,
    search: Option<String>,
) -> Result<()> {
    let limit = limit.unwrap_or_else(|| context.page_size());
    let mut directory = UserDirectory::new(context.client());
    directory.load_page(page, limit, search.as_deref()).await?;

    #[derive(Serialize)]
    struct UsersView<'a> {
        users: &'a [UserRecord],
        total_items: Option<u64>,
    }
    let view = UsersView {
        users: &directory.users,
        total_items: directory.pagination.as_ref().map(|p| p.total_items),
    };

    let total = view.total_items.unwrap_or(directory.users.len() as u64);
    let mut human = HumanOutput::new(format!("Users ({total} total)"));
    for user in &directory.users {
        human.push_detail(user_line(user));
    }
    emit_success(context.options, "users", &view, Some(&human))
}

pub async fn run_role(context: &Context, user_id: String, grant: bool, revoke: bool) -> Result<()> {
    if grant == revoke {
        return Err(Error::InvalidArgument(
            "pass exactly one of --grant or --revoke".to_string(),
        ));
    }

    let mut directory = UserDirectory::new(context.client());
    let outcome = directory.set_role(&user_id, grant).await?;

    #[derive(Serialize)]
    struct RoleView {
        user_id: String,
        email: String,
        is_admin: bool,
        action: String,
    }
    let view = RoleView {
        user_id: outcome.user.id.clone(),
        email: outcome.user.email.clone(),
        is_admin: outcome.user.is_admin,
        action: outcome.action.clone(),
    };

    let mut human = HumanOutput::new(format!(
        "{} admin role for {}",
        if grant { "Granted" } else { "Revoked" },
        view.email
    ));
    human.push_summary("action", view.action.clone());
    emit_success(context.options, "admin role", &view, Some(&human))
}

pub async fn run_bulk(context: &Context, file: PathBuf) -> Result<()> {
    let contents = std::fs::read_to_string(&file)?;
    let requests: Vec<BulkUserRequest> = serde_json::from_str(&contents).map_err(|err| {
        Error::InvalidArgument(format!("{}: {err}", file.display()))
    })?;
    if requests.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "{}: no users to create",
            file.display()
        )));
    }

    let mut directory = UserDirectory::new(context.client());
    let outcome = directory.bulk_create(&requests).await?;

    #[derive(Serialize)]
    struct BulkView {
        total: u32,
        successful: u32,
        failed: u32,
        failures: Vec<(String, String)>,
    }
    let view = BulkView {
        total: outcome.summary.total,
        successful: outcome.summary.successful,
        failed: outcome.summary.failed,
        failures: outcome
            .failed
            .iter()
            .map(|failure| (failure.email.clone(), failure.error.clone()))
            .collect(),
    };

    let mut human = HumanOutput::new(format!(
        "Created {} of {} user(s)",
        view.successful, view.total
    ));
    for (email, error) in &view.failures {
        human.push_warning(format!("{email}: {error}"));
    }
    emit_success(context.options, "admin bulk", &view, Some(&human))
}
