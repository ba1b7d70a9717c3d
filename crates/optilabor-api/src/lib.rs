//! # optilabor-api
//!
//! HTTP API for OptiLabor: upload plans, detect tagged elements, and keep
//! one tag record per file name.
//!
//! | Method & path | Handler |
//! |---|---|
//! | `GET /health` | [`handlers::health_check`] |
//! | `GET /api/v1/attachments` | [`handlers::attachments::list_attachments`] |
//! | `GET /api/v1/attachments/:file_name` | [`handlers::attachments::get_attachment`] |
//! | `POST /api/v1/attachments/:file_name/tags` | [`handlers::attachments::reconcile_tags`] |
//! | `POST /api/v1/uploads` | [`handlers::uploads::upload_document`] |

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;
pub use error::ApiError;
pub use state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the application router.
///
/// CORS is left to the caller since allowed origins are deployment config.
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/api/v1/attachments",
            get(handlers::attachments::list_attachments),
        )
        .route(
            "/api/v1/attachments/:file_name",
            get(handlers::attachments::get_attachment),
        )
        .route(
            "/api/v1/attachments/:file_name/tags",
            post(handlers::attachments::reconcile_tags),
        )
        .route("/api/v1/uploads", post(handlers::uploads::upload_document))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state)
}
