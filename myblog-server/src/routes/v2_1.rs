use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};

use crate::{
    AppState,
    handlers::{gist, storage},
};

/// Uploads are images and attachments; allow more than axum's 2 MiB default.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Create all v2.1 API routes
pub fn create_v2_1_router(_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/storage/upload",
            post(storage::upload_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/storage/{slug}",
            get(storage::download_handler).delete(storage::delete_handler),
        )
        .route("/storage/{slug}/delete", delete(storage::delete_handler))
        .route("/github/gist", get(gist::gist_handler))
}
