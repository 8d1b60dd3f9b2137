//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video generation endpoints (async job and synchronous variants)
//! - Job status polling and video deletion
//! - Security headers, request ids and CORS

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppPipeline, AppState};
