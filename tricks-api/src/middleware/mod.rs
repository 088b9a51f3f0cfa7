/// Middleware for the API server
///
/// - `security`: security headers on every response
/// - `owner`: trick ownership guard for the `/user/tricks/:slug` routes
///
/// Token authentication lives in [`crate::app`] next to the router since it
/// only needs the JWT secret from the state.

pub mod owner;
pub mod security;
