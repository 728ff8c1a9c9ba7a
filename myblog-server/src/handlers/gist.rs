use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::{
    AppState,
    infra::errors::{AppError, AppResult},
};

const GIST_HOST: &str = "gist.github.com";

#[derive(Debug, Default, Deserialize)]
pub struct GistParams {
    #[serde(default)]
    pub src: String,
}

/// Cache key for a gist source URL.
pub fn cache_key(src: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(src.as_bytes()).collect();
    format!("{encoded}.json")
}

/// Rewrite an embed script URL into the JSON flavour served by gist.github.com.
pub fn json_url(src: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(src)?;
    url.set_host(Some(GIST_HOST))?;
    let path = url.path().replacen(".js", ".json", 1);
    url.set_path(&path);
    Ok(url)
}

pub async fn gist_handler(
    State(state): State<AppState>,
    Query(params): Query<GistParams>,
) -> AppResult<Response> {
    if params.src.is_empty() {
        return Err(AppError::bad_request("src value is empty"));
    }

    let key = cache_key(&params.src);
    if state.cache.exists(&key).await {
        if let Ok(body) = state.cache.retrieve(&key).await {
            return Ok(json_response(body));
        }
    }

    let url = json_url(&params.src).map_err(|err| AppError::bad_request(err.to_string()))?;
    let body = fetch(&state.http, url).await?;

    if let Err(err) = state.cache.store(&body, &key).await {
        warn!("unable to cache gist {}: {err}", params.src);
    }

    Ok(json_response(body))
}

async fn fetch(client: &reqwest::Client, url: Url) -> AppResult<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|res| res.error_for_status())
        .map_err(|err| AppError::bad_gateway(err.to_string()))?;
    let body = response
        .bytes()
        .await
        .map_err(|err| AppError::bad_gateway(err.to_string()))?;
    Ok(body.to_vec())
}

fn json_response(body: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}
