pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use anyhow::{Context, Result};
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{jwt_auth_middleware, require_placement_role};
use state::AppState;

/// Build the complete router (also used by the HTTP tests)
pub fn build_router(state: Arc<AppState>) -> Router {
    // ==========================================================================
    // Read Routes - any authenticated role
    // ==========================================================================
    let read_routes = Router::new()
        .route("/{id}", get(handlers::get_student))
        .route("/{id}/transfer-history", get(handlers::get_transfer_history))
        .route("/{id}/promotion-history", get(handlers::get_promotion_history))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    // ==========================================================================
    // Write Routes - admin / staff only
    // ==========================================================================
    let write_routes = Router::new()
        .route("/batch-transfer", post(handlers::batch_transfer))
        .route("/{id}/transfer", post(handlers::transfer_student))
        .route("/{id}/external-transfer", post(handlers::external_transfer))
        .route("/{id}/promote", post(handlers::promote_student))
        .route("/{id}/graduate", post(handlers::graduate_student))
        .route("/{id}/withdraw", post(handlers::withdraw_student))
        // Last layer runs first: verify the token, then check the role
        .route_layer(from_fn(require_placement_role))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .nest("/api/v1/students", read_routes.merge(write_routes))
        .with_state(state)
        // OpenAPI / Swagger UI (stateless, added after with_state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Start HTTP Gateway server
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} (port may already be in use)", addr))?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, app).await.context("Server error")
}
