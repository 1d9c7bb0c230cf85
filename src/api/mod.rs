//! API routes and handlers
//!
//! This module defines all API endpoints and their routing.

use axum::{http::Uri, routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{middleware, utils::AppError, AppState};

mod audit;
mod health;

pub use health::*;

/// Public API routes (no authentication required)
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/detailed", get(health::health_check_detailed))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
}

/// Protected API routes (API key required)
pub fn protected_routes() -> Router<AppState> {
    Router::new().nest("/audit", audit::routes())
}

/// Create the application router with all routes and middleware
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // The API key applies to protected routes only, so health probes stay open
    let api_router = Router::new()
        .nest(
            "/api/v1",
            public_routes().merge(protected_routes().layer(
                axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::api_key_middleware,
                ),
            )),
        )
        .layer(axum::middleware::from_fn(
            middleware::api_cache_control_middleware,
        ));

    Router::new()
        .route("/", get(health::server_time))
        .merge(api_router)
        .fallback(not_found)
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(trace_layer)
        .layer(cors)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
