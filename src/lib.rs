//! SkillSwap Backend Library
//!
//! Peer-to-peer skill exchange: user directory, skill matching, and the swap
//! request lifecycle behind a cookie-session REST API.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod matching;
pub mod media;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod store;
pub mod swap;
pub mod users;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use app_state::{AppState, CookieSettings};
use auth::{AuthService, BcryptHasher, JwtSessionTokens};
use config::Config;
use media::{DisabledUploader, HttpUploader, MediaUploader};
use store::{MemoryStore, PostgresStore, SwapStore, UserStore};
use swap::SwapService;
use users::UserService;

/// Assemble the full API router over the given state
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health_check))
        .merge(routes::auth_routes())
        .merge(routes::user_routes())
        .merge(routes::swap_routes())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

/// Build application state, connecting to Postgres when `DATABASE_URL` is set
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let store = Arc::new(PostgresStore::connect(url, config.db_max_connections).await?);
            tracing::info!("Database connected successfully");
            Ok(assemble_state(config, store.clone(), store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            let store = Arc::new(MemoryStore::new());
            Ok(assemble_state(config, store.clone(), store))
        }
    }
}

/// Wire services over already-constructed stores
pub fn assemble_state(
    config: &Config,
    users: Arc<dyn UserStore>,
    swaps: Arc<dyn SwapStore>,
) -> AppState {
    let media: Arc<dyn MediaUploader> = match &config.media_upload_url {
        Some(endpoint) => Arc::new(HttpUploader::new(
            endpoint.clone(),
            config.media_upload_preset.clone(),
        )),
        None => Arc::new(DisabledUploader),
    };

    let auth_service = Arc::new(AuthService::new(
        users.clone(),
        Arc::new(BcryptHasher::new(config.bcrypt_cost)),
        Arc::new(JwtSessionTokens::new(
            &config.jwt_secret,
            chrono::Duration::days(config.token_ttl_days),
        )),
    ));
    let user_service = Arc::new(UserService::new(
        users.clone(),
        media,
        config.media_upload_folder.clone(),
    ));
    let swap_service = Arc::new(SwapService::new(swaps, users));

    AppState::new(
        auth_service,
        user_service,
        swap_service,
        CookieSettings {
            secure: config.secure_cookies,
            max_age_days: config.token_ttl_days,
        },
    )
}

async fn root() -> &'static str {
    "SkillSwap API Server"
}

async fn health_check() -> &'static str {
    "OK"
}
