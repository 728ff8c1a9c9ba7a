use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tracing::warn;

use myblog_core::sitemap;

use crate::{AppState, infra::errors::AppResult};

const CACHE_KEY: &str = "sitemap.xml";

pub async fn sitemap_handler(State(state): State<AppState>) -> AppResult<Response> {
    if state.cache.exists(CACHE_KEY).await {
        if let Ok(body) = state.cache.retrieve(CACHE_KEY).await {
            return Ok(xml_response(body));
        }
    }

    let body = sitemap::generate(state.base_url(), &state.repositories)
        .await?
        .to_xml()
        .into_bytes();

    if let Err(err) = state.cache.store(&body, CACHE_KEY).await {
        warn!("unable to cache sitemap: {err}");
    }

    Ok(xml_response(body))
}

fn xml_response(body: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}
