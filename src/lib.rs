//! sprintsync - SprintSync Client Library
//!
//! This library provides the core functionality for the sprintsync CLI, a
//! client for the SprintSync task board API.
//!
//! # Core Concepts
//!
//! - **Board**: tasks cached in three per-status columns, each with its own
//!   pagination cursor, kept aligned with the server by asynchronous intents
//! - **Stream Ingestor**: decoding of incremental AI-suggestion responses
//!   into content increments and a final string
//! - **Session**: persisted bearer tokens with 401-triggered teardown
//!
//! # Module Organization
//!
//! - `cli`: command-line interface using clap
//! - `config`: configuration loading from `config.toml` and the environment
//! - `error`: error types and result aliases
//! - `api`: HTTP client with envelope unwrapping and auth injection
//! - `session`: credential storage and the auth intents
//! - `task`: task domain types
//! - `board`: the per-status task store and its intents
//! - `stream`: incremental AI-suggestion decoding
//! - `users`: user directory and admin operations
//! - `analytics`: daily time-log analytics
//! - `output`: CLI output formatting

pub mod analytics;
pub mod api;
pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod session;
pub mod stream;
pub mod task;
pub mod users;

pub use error::{Error, Result};
