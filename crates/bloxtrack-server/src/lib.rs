pub mod accounts;
pub mod aggregator;
pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod rate_limit;
pub mod state;

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use config::ServerConfig;
use error::AppError;
use state::AppState;

/// Build the Axum router and application state from a config.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    let web_root = config.web_root.clone();
    let state = AppState::new(config);

    // Public lookup endpoints, rate-limited per client IP
    let lookup_routes = Router::new()
        .route("/game", axum::routing::get(api::get_game))
        .route("/user", axum::routing::get(api::get_user))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            lookup_rate_limit,
        ));

    // Account endpoints behind bearer auth
    let account_routes = Router::new()
        .route("/profile", axum::routing::get(accounts::profile))
        .route("/logout", axum::routing::post(accounts::logout))
        .route("/account", axum::routing::delete(accounts::delete_account))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    let app = Router::new()
        .merge(lookup_routes)
        .merge(account_routes)
        .route("/signup", axum::routing::post(accounts::signup))
        .route("/login", axum::routing::post(accounts::login))
        .route("/health", axum::routing::get(health::health_check))
        .fallback_service(ServeDir::new(&web_root))
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    (app, state)
}

/// Background task that periodically drops idle rate-limit buckets.
pub fn spawn_limiter_sweeper(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            state.limiter.sweep(Duration::from_secs(600)).await;
        }
    });
}

/// Middleware applying the per-IP token bucket to the lookup endpoints.
async fn lookup_rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.limiter.allow(addr.ip()).await {
        tracing::debug!(ip = %addr.ip(), "Lookup rate limit exceeded");
        return Err(AppError::TooManyRequests);
    }
    Ok(next.run(request).await)
}
