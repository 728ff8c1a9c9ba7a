//! # myblog server
//!
//! HTTP front of the personal blog.
//!
//! ## Overview
//!
//! - **GraphQL**: posts, categories, tags and files at `/graphql`, with a
//!   GraphiQL IDE at `/graphiql`
//! - **Storage**: upload, delete and resized download of blobs under
//!   `/api/v2.1/storage`
//! - **GitHub**: cached gist proxy at `/api/v2.1/github/gist`
//! - **SEO**: `/sitemap.xml` and Open Graph pages for the Facebook crawler
//! - **SPA**: everything else is served from the static web build
//!
//! Authentication is optional on every route. A valid Auth0 bearer token
//! attaches an [`auth::AuthUser`]; handlers decide whether they need one.

pub mod auth;
pub mod graphql;
pub mod handlers;
pub mod infra;
pub mod jobs;
pub mod middleware;
pub mod routes;

pub use infra::app_state::AppState;

use axum::{
    Router,
    http::{HeaderName, Method, header},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    graphql::{graphiql_handler, graphql_handler},
    handlers::{sitemap::sitemap_handler, spa::spa_service},
    middleware::{facebook_crawler_middleware, request_log_middleware},
};

const CORS_ALLOWED_HEADERS: [HeaderName; 6] = [
    header::ACCEPT,
    header::ACCEPT_ENCODING,
    header::ACCEPT_LANGUAGE,
    header::AUTHORIZATION,
    header::CONTENT_LENGTH,
    header::CONTENT_TYPE,
];

/// Assemble every route and middleware layer of the server.
pub fn create_app(state: AppState) -> Router {
    let spa = Router::new()
        .fallback_service(spa_service(&state.config.server.static_file_path))
        .layer(from_fn_with_state(state.clone(), facebook_crawler_middleware));

    let mut app = Router::new()
        .route("/graphiql", get(graphiql_handler))
        .route("/graphql", get(graphql_handler).post(graphql_handler))
        .route("/sitemap.xml", get(sitemap_handler))
        .merge(routes::create_api_router(state.clone()))
        .merge(spa)
        .layer(from_fn_with_state(state.clone(), auth::optional_auth_middleware))
        .layer(from_fn(request_log_middleware))
        .layer(TraceLayer::new_for_http());

    if state.config.server.allow_cors {
        app = app.layer(cors_layer());
    }

    app.with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(CORS_ALLOWED_HEADERS)
}
