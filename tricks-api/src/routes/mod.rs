/// Route handlers, one module per resource
///
/// - `health`: liveness and database status
/// - `auth`: register, login, token refresh
/// - `user_tricks`: the signed-in user's trick pages

pub mod auth;
pub mod health;
pub mod user_tricks;
