//! # Taskboard Shared Library
//!
//! Types, persistence and business logic shared by the Taskboard API server
//! and its integration tests.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and migrations
//! - `models`: Database models (users, projects, tasks) and their queries
//! - `auth`: Passwords, JWTs, caller context and access-control helpers
//! - `services`: Task, project and user operations gated by access checks

pub mod auth;
pub mod db;
pub mod models;
pub mod services;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
