//! Command-line interface for sprintsync
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is implemented in its own submodule.

use clap::{Parser, Subcommand};

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputOptions;
use crate::session::SessionStore;

mod analytics;
mod auth;
mod suggest;
mod task;
mod user;

/// sprintsync - task board client
///
/// A CLI for the SprintSync API: a Kanban task board with authentication,
/// team management, time-tracking analytics, and AI-assisted task
/// descriptions.
#[derive(Parser, Debug)]
#[command(name = "sprintsync")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// API base URL (including the /api prefix)
    #[arg(long, global = true, env = "SPRINTSYNC_URL")]
    pub api_url: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and persist the session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Create an account and persist the session
    Register {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Show all three board columns
    Board {
        /// Tasks per column
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Task operations
    #[command(subcommand)]
    Task(TaskCommands),

    /// List users
    Users {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        limit: Option<u32>,

        /// Filter by name or email
        #[arg(long)]
        search: Option<String>,
    },

    /// Admin operations (requires an admin session)
    #[command(subcommand)]
    Admin(AdminCommands),

    /// Daily time-log analytics
    Timelogs {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,

        /// Restrict to one user
        #[arg(long)]
        user_id: Option<String>,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        limit: Option<u32>,
    },

    /// Stream an AI-generated task description for a title
    Suggest {
        /// Task title to describe
        title: String,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks, optionally for a single column
    List {
        /// Column: todo, in_progress, done (all three when omitted)
        #[arg(long)]
        status: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        limit: Option<u32>,
    },

    /// Create a task
    New {
        /// Task title
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Estimated minutes
        #[arg(long, default_value_t = 0)]
        minutes: u32,
    },

    /// Edit task fields (may also move it with --status)
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        minutes: Option<u32>,

        /// New column: todo, in_progress, done
        #[arg(long)]
        status: Option<String>,
    },

    /// Move a task to another column
    Move {
        id: String,

        /// Column: todo, in_progress, done
        status: String,
    },

    /// Delete a task
    Delete { id: String },

    /// Assign a task to a user
    Assign { id: String, user_id: String },

    /// Clear a task's assignee
    Unassign { id: String },

    /// Keyword search across all tasks
    Search { keyword: String },

    /// Show one task
    Show { id: String },
}

/// Admin subcommands
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Grant or revoke the admin role
    Role {
        user_id: String,

        /// Grant the admin role
        #[arg(long, conflicts_with = "revoke")]
        grant: bool,

        /// Revoke the admin role
        #[arg(long)]
        revoke: bool,
    },

    /// Bulk-create users from a JSON file
    Bulk {
        /// JSON file holding an array of {firstName, lastName, email, password, isAdmin}
        file: std::path::PathBuf,
    },
}

/// Shared wiring for every command: resolved config, session store, and a
/// session-bound API client.
pub(crate) struct Context {
    pub config: Config,
    pub store: SessionStore,
    pub options: OutputOptions,
}

impl Context {
    fn new(api_url: Option<String>, json: bool, quiet: bool) -> Result<Self> {
        let mut config = Config::load()?;
        if let Some(url) = api_url {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                config.base_url = url.to_string();
            }
        }
        let store = SessionStore::default_store()?;
        Ok(Self {
            config,
            store,
            options: OutputOptions { json, quiet },
        })
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::with_session(&self.config, self.store.clone())
    }

    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let context = Context::new(self.api_url, self.json, self.quiet)?;
        match self.command {
            Commands::Login { email, password } => auth::run_login(&context, email, password).await,
            Commands::Register {
                first_name,
                last_name,
                email,
                password,
            } => auth::run_register(&context, first_name, last_name, email, password).await,
            Commands::Logout => auth::run_logout(&context).await,
            Commands::Whoami => auth::run_whoami(&context).await,
            Commands::Board { limit } => task::run_board(&context, limit).await,
            Commands::Task(cmd) => match cmd {
                TaskCommands::List { status, page, limit } => {
                    task::run_list(&context, status, page, limit).await
                }
                TaskCommands::New {
                    title,
                    description,
                    minutes,
                } => task::run_new(&context, title, description, minutes).await,
                TaskCommands::Edit {
                    id,
                    title,
                    description,
                    minutes,
                    status,
                } => task::run_edit(&context, id, title, description, minutes, status).await,
                TaskCommands::Move { id, status } => task::run_move(&context, id, status).await,
                TaskCommands::Delete { id } => task::run_delete(&context, id).await,
                TaskCommands::Assign { id, user_id } => {
                    task::run_assign(&context, id, user_id).await
                }
                TaskCommands::Unassign { id } => task::run_unassign(&context, id).await,
                TaskCommands::Search { keyword } => task::run_search(&context, keyword).await,
                TaskCommands::Show { id } => task::run_show(&context, id).await,
            },
            Commands::Users { page, limit, search } => {
                user::run_users(&context, page, limit, search).await
            }
            Commands::Admin(cmd) => match cmd {
                AdminCommands::Role {
                    user_id,
                    grant,
                    revoke,
                } => user::run_role(&context, user_id, grant, revoke).await,
                AdminCommands::Bulk { file } => user::run_bulk(&context, file).await,
            },
            Commands::Timelogs {
                start_date,
                end_date,
                user_id,
                page,
                limit,
            } => {
                analytics::run_timelogs(&context, start_date, end_date, user_id, page, limit).await
            }
            Commands::Suggest { title } => suggest::run(&context, title).await,
        }
    }
}
