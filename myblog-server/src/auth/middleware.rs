use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{AppState, infra::errors::AppError};

/// Authenticated caller, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub subject: String,
}

/// Attach an [`AuthUser`] when a valid bearer token is present.
///
/// Credentials are optional: a request without an `Authorization` header
/// continues anonymously. A header that is malformed or carries a token
/// failing verification is rejected with 401.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if !request.headers().contains_key(header::AUTHORIZATION) {
        return next.run(request).await;
    }

    let Some(token) = extract_bearer_token(&request).map(str::to_owned) else {
        return AppError::unauthorized("Authorization header format must be Bearer {token}")
            .into_response();
    };

    match state.verifier.verify(&token).await {
        Ok(claims) => {
            request.extensions_mut().insert(AuthUser {
                subject: claims.sub,
            });
            next.run(request).await
        }
        Err(err) => {
            warn!(error = %err, "rejecting invalid bearer token");
            AppError::unauthorized(err.to_string()).into_response()
        }
    }
}

pub fn extract_bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
