//! # Tricks API Server Library
//!
//! HTTP layer of the Tricks service: signed-in users create, edit and delete
//! their tricks, attach tags and categories, and upload one archive per
//! trick.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from the environment
//! - `error`: error type and HTTP response mapping
//! - `middleware`: security headers and the trick owner guard
//! - `response`: page views and flash redirects
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;
