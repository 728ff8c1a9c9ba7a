use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use once_cell::sync::Lazy;
use regex::Regex;

use myblog_core::{opengraph::OpenGraph, slug};

use crate::AppState;

static FACEBOOK_CRAWLER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new("facebookexternalhit").expect("crawler regex should compile"));
static SINGLE_PAGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}/\d{1,2}/\d{1,2}/(.+)$").expect("single page regex should compile")
});

pub fn is_facebook_crawler(user_agent: &str) -> bool {
    FACEBOOK_CRAWLER_REGEX.is_match(user_agent)
}

/// Post slug of a `/{yyyy}/{m}/{d}/{slug}` path.
pub fn single_page_slug(path: &str) -> Option<&str> {
    SINGLE_PAGE_REGEX
        .captures(path)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Serves a static Open Graph page to the Facebook crawler when it asks for a
/// published post. Everything else falls through to the single-page app.
pub async fn facebook_crawler_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !is_facebook_crawler(user_agent) {
        return next.run(request).await;
    }
    let Some(post_slug) = single_page_slug(request.uri().path()).map(str::to_owned) else {
        return next.run(request).await;
    };

    let post = match slug::id_from_slug(&post_slug) {
        Ok(id) => state.repositories.posts.find_by_id(&id).await,
        Err(err) => Err(err),
    };
    let post = match post {
        Ok(post) => post,
        Err(_) => return (StatusCode::NOT_FOUND, "Not Found").into_response(),
    };

    if !post.is_published() {
        return next.run(request).await;
    }

    let featured_image = match post.featured_image_id() {
        Some(id) => state.repositories.files.find_by_id(&id).await.ok(),
        None => None,
    };

    let og = OpenGraph::for_post(state.base_url(), &post, featured_image.as_ref());
    Html(og.render_html()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_facebook_crawler() {
        assert!(is_facebook_crawler(
            "facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)"
        ));
        assert!(!is_facebook_crawler("Mozilla/5.0"));
    }

    #[test]
    fn extracts_single_page_slug() {
        assert_eq!(
            single_page_slug("/2020/1/1/test-5dd9b0bd9e5e41e0b2a0b6a4"),
            Some("test-5dd9b0bd9e5e41e0b2a0b6a4")
        );
        assert_eq!(single_page_slug("/category/web"), None);
        assert_eq!(single_page_slug("/20/1/1/test"), None);
    }
}
