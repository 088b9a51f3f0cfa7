//! # Tricks Shared Library
//!
//! Domain types and infrastructure used by the Tricks API server.
//!
//! ## Module Organization
//!
//! - `models`: database models (users, tricks, tags, categories) and their SQL
//! - `repositories`: trait seams over the models plus Postgres implementations
//! - `forms`: trick creation/edit form validation
//! - `archive`: per-trick archive folders on the local filesystem
//! - `auth`: JWT tokens, password hashing, request auth context, ownership checks
//! - `db`: connection pool and migrations
//! - `lang`: localized flash messages

pub mod archive;
pub mod auth;
pub mod db;
pub mod forms;
pub mod lang;
pub mod models;
pub mod repositories;

/// Current version of the Tricks shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
