pub mod v2_1;

use crate::AppState;
use axum::Router;

/// Create the REST API router with all versions
pub fn create_api_router(state: AppState) -> Router<AppState> {
    Router::new().nest("/api/v2.1", v2_1::create_v2_1_router(state))
}
