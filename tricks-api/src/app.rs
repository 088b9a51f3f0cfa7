/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use tricks_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::{owner::owner_guard, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tricks_shared::{
    archive::ArchiveStore,
    auth::middleware::authenticate,
    repositories::{
        postgres::{PgCategoryRepository, PgTagRepository, PgTrickRepository},
        CategoryRepository, TagRepository, TrickRepository,
    },
};

/// Shared application state, cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub tricks: Arc<dyn TrickRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub archives: ArchiveStore,
}

impl AppState {
    /// State backed by Postgres repositories on `db`
    pub fn new(db: PgPool, config: Config) -> Self {
        Self::with_repositories(
            db.clone(),
            config,
            Arc::new(PgTrickRepository::new(db.clone())),
            Arc::new(PgTagRepository::new(db.clone())),
            Arc::new(PgCategoryRepository::new(db)),
        )
    }

    /// State with caller-supplied repositories
    pub fn with_repositories(
        db: PgPool,
        config: Config,
        tricks: Arc<dyn TrickRepository>,
        tags: Arc<dyn TagRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        let archives = ArchiveStore::new(config.storage.archive_root.clone());

        Self {
            db,
            config: Arc::new(config),
            tricks,
            tags,
            categories,
            archives,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the router
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /v1/auth/                       public
/// │   ├── POST /register
/// │   ├── POST /login
/// │   └── POST /refresh
/// └── /user                           JWT
///     ├── GET       /
///     ├── GET|POST  /tricks/new
///     └── owner guard
///         ├── GET|POST  /tricks/:slug
///         ├── GET       /tricks/:slug/delete
///         └── GET       /tricks/:slug/archive/delete
/// ```
///
/// Outer layers, innermost first: body limit, trace, CORS, security headers.
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let owned_trick_routes = Router::new()
        .route(
            "/user/tricks/:slug",
            get(routes::user_tricks::edit_form).post(routes::user_tricks::update),
        )
        .route("/user/tricks/:slug/delete", get(routes::user_tricks::delete))
        .route(
            "/user/tricks/:slug/archive/delete",
            get(routes::user_tricks::delete_archive),
        )
        .route_layer(from_fn_with_state(state.clone(), owner_guard));

    let user_routes = Router::new()
        .route("/user", get(routes::user_tricks::index))
        .route(
            "/user/tricks/new",
            get(routes::user_tricks::create_form).post(routes::user_tricks::store),
        )
        .merge(owned_trick_routes)
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1/auth", auth_routes)
        .merge(user_routes)
        .layer(DefaultBodyLimit::max(state.config.storage.upload_max_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Validates the Bearer token and stores the caller's `AuthContext`
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), state.jwt_secret())?;
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
