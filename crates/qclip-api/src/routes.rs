//! API routes.

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::health;
use crate::handlers::videos::{delete_video, generate_video, generate_video_sync, video_status};
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let video_routes = Router::new()
        .route("/generate-video", post(generate_video))
        .route("/generate-video-sync", post(generate_video_sync))
        .route("/video-status/:job_id", get(video_status))
        .route("/video/:job_id", delete(delete_video));

    let health_routes = Router::new().route("/health", get(health));

    Router::new()
        .nest("/api", video_routes)
        .merge(health_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
