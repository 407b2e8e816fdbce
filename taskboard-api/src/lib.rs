//! # Taskboard API Server Library
//!
//! HTTP layer of Taskboard: router, configuration, error mapping and route
//! handlers. Business rules live in `taskboard_shared::services`.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder and JWT layer
//! - `config`: Configuration from environment variables
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
