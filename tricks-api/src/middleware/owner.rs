/// Owner guard for `/user/tricks/:slug` routes
///
/// Resolves the trick named by the `:slug` path segment and lets the request
/// through only when the authenticated caller created it. The resolved
/// trick is stored in the request extensions so handlers do not look it up
/// again.
///
/// | outcome               | response |
/// |-----------------------|----------|
/// | no trick with slug    | `404`    |
/// | caller is not owner   | `403`    |
/// | caller owns the trick | handler  |
///
/// Runs as a `route_layer` inside the JWT layer, so `AuthContext` is always
/// present.

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
    Extension,
};
use tricks_shared::auth::{authorization::ensure_owner, middleware::AuthContext};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

pub async fn owner_guard(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(auth): Extension<AuthContext>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let trick = state
        .tricks
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Trick '{}' not found", slug)))?;

    if let Err(e) = ensure_owner(&trick, &auth) {
        tracing::warn!(
            user_id = %auth.user_id,
            trick_id = %trick.id,
            path = %req.uri().path(),
            "Rejected access to a trick owned by another user"
        );
        return Err(e.into());
    }

    req.extensions_mut().insert(trick);
    Ok(next.run(req).await)
}
