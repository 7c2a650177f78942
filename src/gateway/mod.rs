//! HTTP gateway
//!
//! Public routes: health, user registration and login, API docs.
//! Everything under `/accounts` and `/transfers` requires a bearer token.

pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::GatewayConfig;
use state::AppState;

/// Assemble the full router. Split from [`run_server`] so tests can drive it
/// without a socket.
pub fn build_router(state: Arc<AppState>) -> Router {
    // ==========================================================================
    // Public Routes (no auth required)
    // ==========================================================================
    let public_routes = Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .route("/users", post(handlers::create_user))
        .route("/users/login", post(handlers::login_user));

    // ==========================================================================
    // Private Routes (bearer token required)
    // ==========================================================================
    let private_routes = Router::new()
        .route(
            "/accounts",
            post(handlers::create_account)
                .get(handlers::list_accounts)
                .put(handlers::update_account),
        )
        .route(
            "/accounts/{id}",
            get(handlers::get_account).delete(handlers::delete_account),
        )
        .route("/transfers", post(handlers::create_transfer))
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(private_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Bind and serve until the process is stopped.
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!(%addr, "Gateway listening");
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
