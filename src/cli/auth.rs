//! sprintsync auth command implementations.

use serde::Serialize;

use crate::cli::Context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::session::{AuthUser, Credentials, NewAccount, Session, SessionStore};

#[derive(Serialize)]
struct UserView<'a> {
    id: &'a str,
    name: String,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_admin: Option<bool>,
}

impl<'a> UserView<'a> {
    fn from(user: &'a AuthUser) -> Self {
        Self {
            id: &user.id,
            name: format!("{} {}", user.first_name, user.last_name),
            email: &user.email,
            is_admin: user.is_admin,
        }
    }
}

fn emit_user(context: &Context, command: &str, header: &str, user: &AuthUser) -> Result<()> {
    let view = UserView::from(user);
    let mut human = HumanOutput::new(header.to_string());
    human.push_summary("user", view.name.clone());
    human.push_summary("email", user.email.clone());
    if user.is_admin == Some(true) {
        human.push_summary("role", "admin");
    }
    emit_success(context.options, command, &view, Some(&human))
}

pub async fn run_login(context: &Context, email: String, password: String) -> Result<()> {
    let mut session = Session::new(context.client(), context.store.clone());
    let user = session.login(&Credentials { email, password }).await?;
    emit_user(context, "login", "Logged in", &user)
}

pub async fn run_register(
    context: &Context,
    first_name: String,
    last_name: String,
    email: String,
    password: String,
) -> Result<()> {
    let mut session = Session::new(context.client(), context.store.clone());
    let user = session
        .register(&NewAccount {
            first_name,
            last_name,
            email,
            password,
        })
        .await?;
    emit_user(context, "register", "Account created", &user)
}

pub async fn run_logout(context: &Context) -> Result<()> {
    let store: SessionStore = context.store.clone();
    let mut session = Session::new(context.client(), store);
    session.logout().await?;

    #[derive(Serialize)]
    struct LogoutView {
        logged_out: bool,
    }
    let human = HumanOutput::new("Logged out");
    emit_success(
        context.options,
        "logout",
        &LogoutView { logged_out: true },
        Some(&human),
    )
}

pub async fn run_whoami(context: &Context) -> Result<()> {
    let session = Session::new(context.client(), context.store.clone());
    let user = session.current_user().await?;
    emit_user(context, "whoami", "Current session", &user)
}
