/// Authentication endpoints
///
/// - `POST /v1/auth/register` - create an account and receive tokens
/// - `POST /v1/auth/login` - exchange credentials for tokens
/// - `POST /v1/auth/refresh` - exchange a refresh token for an access token
///
/// The access token goes in `Authorization: Bearer <token>` on every `/user`
/// request.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tricks_shared::{
    auth::{jwt, password},
    forms::{field_errors, FieldError},
    models::user::{CreateUser, User},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64, message = "Username must be 3 to 64 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked again for strength after the field rules
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Tokens issued on register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub user_id: Uuid,

    /// Valid for 24 hours
    pub access_token: String,

    /// Valid for 30 days
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

fn issue_tokens(state: &AppState, user_id: Uuid) -> ApiResult<TokenResponse> {
    let access = jwt::Claims::new(user_id, jwt::TokenType::Access);
    let refresh = jwt::Claims::new(user_id, jwt::TokenType::Refresh);

    Ok(TokenResponse {
        user_id,
        access_token: jwt::create_token(&access, state.jwt_secret())?,
        refresh_token: jwt::create_token(&refresh, state.jwt_secret())?,
    })
}

/// Registers a user
///
/// # Errors
///
/// - `422`: field validation or password strength failed
/// - `409`: username or email already taken
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()
        .map_err(|e| ApiError::ValidationError(field_errors(&e)))?;

    password::validate_password_strength(&req.password).map_err(|message| {
        ApiError::ValidationError(vec![FieldError {
            field: "password".to_string(),
            message,
        }])
    })?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_string(),
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(Json(issue_tokens(&state, user.id)?))
}

/// Logs a user in
///
/// Unknown email and wrong password give the same `401`.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()
        .map_err(|e| ApiError::ValidationError(field_errors(&e)))?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, req.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Rejected login with wrong password");
        return Err(invalid());
    }

    User::update_last_login(&state.db, user.id).await?;

    Ok(Json(issue_tokens(&state, user.id)?))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}
