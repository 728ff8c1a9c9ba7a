//! sitemap.xml generation.

use std::fmt::Write as _;

use chrono::SecondsFormat;

use crate::{
    Result,
    database::Repositories,
    domain::{Post, Status},
    query::PostQueryBuilder,
    timeutil,
};

pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
pub const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const MAX_POSTS: i64 = 9999;

#[derive(Debug, Clone, PartialEq)]
pub struct Url {
    pub location: String,
    pub last_modified: Option<String>,
    pub change_frequency: Option<&'static str>,
    pub priority: Option<f32>,
}

impl Url {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            last_modified: None,
            change_frequency: None,
            priority: None,
        }
    }

    pub fn priority(mut self, priority: f32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn change_frequency(mut self, frequency: &'static str) -> Self {
        self.change_frequency = Some(frequency);
        self
    }

    pub fn last_modified(mut self, rfc3339: impl Into<String>) -> Self {
        self.last_modified = Some(rfc3339.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlSet {
    pub urls: Vec<Url>,
}

impl UrlSet {
    /// Serialize with the XML declaration prepended.
    pub fn to_xml(&self) -> String {
        let mut out = String::from(XML_HEADER);
        let _ = write!(out, r#"<urlset xmlns="{SITEMAP_NAMESPACE}">"#);
        for url in &self.urls {
            out.push_str("<url>");
            let _ = write!(out, "<loc>{}</loc>", escape_xml(&url.location));
            if let Some(lastmod) = &url.last_modified {
                let _ = write!(out, "<lastmod>{}</lastmod>", escape_xml(lastmod));
            }
            if let Some(freq) = url.change_frequency {
                let _ = write!(out, "<changefreq>{freq}</changefreq>");
            }
            if let Some(priority) = url.priority {
                let _ = write!(out, "<priority>{priority:.1}</priority>");
            }
            out.push_str("</url>");
        }
        out.push_str("</urlset>");
        out
    }
}

pub(crate) fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn fixed_urls(base_url: &str) -> Vec<Url> {
    vec![Url::new(base_url).change_frequency("daily").priority(1.0)]
}

pub async fn post_urls(base_url: &str, repositories: &Repositories) -> Result<Vec<Url>> {
    let query = PostQueryBuilder::new()
        .with_status(Status::Published)
        .with_limit(MAX_POSTS)
        .build();
    let posts = repositories.posts.find_all(&query).await?;

    Ok(posts
        .iter()
        .filter_map(|post| post_url(base_url, post))
        .collect())
}

/// Entry of a published post; `None` when it has no publish date.
///
/// Legacy documents carry zero-time `updatedAt`, which falls back to the
/// publish date.
pub fn post_url(base_url: &str, post: &Post) -> Option<Url> {
    let published_at = post
        .published_at
        .filter(|t| !timeutil::is_unset(Some(*t)))?;
    let location = format!(
        "{base_url}/{}/{}",
        timeutil::date_path(published_at),
        post.slug
    );
    let modified = post
        .updated_at
        .filter(|t| !timeutil::is_unset(Some(*t)))
        .unwrap_or(published_at);
    let lastmod = timeutil::to_chrono(modified)
        .with_timezone(&timeutil::asia_bangkok())
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    Some(Url::new(location).last_modified(lastmod).priority(0.8))
}

pub async fn category_urls(base_url: &str, repositories: &Repositories) -> Result<Vec<Url>> {
    let categories = repositories.categories.find_all().await?;
    Ok(categories
        .into_iter()
        .map(|c| Url::new(format!("{base_url}/category/{}", c.slug)).priority(0.5))
        .collect())
}

pub async fn tag_urls(base_url: &str, repositories: &Repositories) -> Result<Vec<Url>> {
    let tags = repositories.tags.find_all().await?;
    Ok(tags
        .into_iter()
        .map(|t| Url::new(format!("{base_url}/tag/{}", t.slug)).priority(0.5))
        .collect())
}

/// Every public URL of the site: home, published posts, categories and tags.
pub async fn generate(base_url: &str, repositories: &Repositories) -> Result<UrlSet> {
    let mut urls = fixed_urls(base_url);
    urls.extend(post_urls(base_url, repositories).await?);
    urls.extend(category_urls(base_url, repositories).await?);
    urls.extend(tag_urls(base_url, repositories).await?);
    Ok(UrlSet { urls })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_header_namespace_and_entries() {
        let set = UrlSet {
            urls: vec![
                Url::new("https://www.example.com").change_frequency("daily").priority(1.0),
                Url::new("https://www.example.com/tag/a&b").priority(0.5),
            ],
        };
        let xml = set.to_xml();

        assert!(xml.starts_with(XML_HEADER));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains(
            "<url><loc>https://www.example.com</loc><changefreq>daily</changefreq><priority>1.0</priority></url>"
        ));
        assert!(xml.contains("<loc>https://www.example.com/tag/a&amp;b</loc>"));
        assert!(xml.ends_with("</urlset>"));
    }

    fn published(millis: i64) -> Post {
        let mut post = Post::draft("auth0|1");
        post.slug = "hello-world-abc".into();
        post.status = Status::Published;
        post.published_at = Some(mongodb::bson::DateTime::from_millis(millis));
        post
    }

    #[test]
    fn zero_time_updated_at_falls_back_to_publish_date() {
        let mut post = published(1_577_822_400_000);
        post.updated_at = Some(mongodb::bson::DateTime::from_millis(-62_135_596_800_000));

        let url = post_url("https://www.example.com", &post).expect("published");

        assert_eq!(url.location, "https://www.example.com/2020/1/1/hello-world-abc");
        assert_eq!(url.last_modified.as_deref(), Some("2020-01-01T03:00:00+07:00"));
    }

    #[test]
    fn lastmod_prefers_updated_at() {
        let mut post = published(1_577_822_400_000);
        post.updated_at = Some(mongodb::bson::DateTime::from_millis(1_577_908_800_000));

        let url = post_url("https://www.example.com", &post).expect("published");
        assert_eq!(url.last_modified.as_deref(), Some("2020-01-02T03:00:00+07:00"));
    }

    #[test]
    fn post_without_publish_date_is_skipped() {
        let mut post = published(0);
        post.published_at = None;
        assert!(post_url("https://www.example.com", &post).is_none());
    }

    #[test]
    fn lastmod_is_omitted_when_unknown() {
        let xml = UrlSet { urls: vec![Url::new("https://x")] }.to_xml();
        assert!(!xml.contains("lastmod"));
        assert!(!xml.contains("priority"));
    }
}
