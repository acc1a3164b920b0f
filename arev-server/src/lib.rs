//! arev-server library - annotation review backend
//!
//! Regroups reference and model-response JSONL uploads by document and
//! aspect, and stores reviewer comments.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod ingest;
pub mod upload;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Comment database connection pool
    pub db: SqlitePool,
    /// Request body limit for `/process` uploads
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, max_upload_bytes: usize) -> Self {
        Self {
            db,
            max_upload_bytes,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let uploads = Router::new()
        .route("/process", post(api::process_files))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes));

    let comments = Router::new()
        .route("/comments", post(api::add_comment))
        .route(
            "/comments/:key",
            get(api::get_comments).delete(api::delete_comment),
        )
        .route("/api/comments/by-model", get(api::get_comments_by_model));

    let public = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(uploads)
        .merge(comments)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
