//! Static Open Graph documents served to social-network crawlers in place of
//! the single-page application.

use crate::{
    content,
    domain::{File, Post},
    sitemap::escape_xml,
    timeutil,
};

pub const DEFAULT_FEATURED_IMAGE: &str = "/assets/images/303589.webp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenGraph {
    pub url: String,
    pub kind: &'static str,
    pub title: String,
    pub description: String,
    pub image: String,
}

/// Public URL of a published post: `{base}/{Y/M/D in Bangkok}/{slug}`.
pub fn post_url(base_url: &str, post: &Post) -> String {
    let date = post
        .published_at
        .map(timeutil::date_path)
        .unwrap_or_default();
    format!("{base_url}/{date}/{}", post.slug)
}

impl OpenGraph {
    pub fn for_post(base_url: &str, post: &Post, featured_image: Option<&File>) -> Self {
        let image = match featured_image {
            Some(file) if !file.slug.is_empty() => {
                format!("{base_url}/api/v2.1/storage/{}", file.slug)
            }
            _ => format!("{base_url}{DEFAULT_FEATURED_IMAGE}"),
        };

        Self {
            url: post_url(base_url, post),
            kind: "article",
            title: post.title.clone(),
            description: content::description(&post.markdown).to_string(),
            image,
        }
    }

    pub fn render_html(&self) -> String {
        let url = escape_xml(&self.url);
        let title = escape_xml(&self.title);
        let description = escape_xml(&self.description);
        let image = escape_xml(&self.image);
        let kind = self.kind;

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<meta property="og:url" content="{url}">
<meta property="og:type" content="{kind}">
<meta property="og:title" content="{title}">
<meta property="og:description" content="{description}">
<meta property="og:image" content="{image}">
</head>
<body></body>
</html>
"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, oid::ObjectId};

    fn published_post() -> Post {
        let mut post = Post::draft("author");
        post.title = "Test <Post>".into();
        post.slug = format!("test-{}", post.id.to_hex());
        post.status = crate::Status::Published;
        post.markdown = "Lorem ipsum dolor sit amet.\nAenean at ornare ipsum.".into();
        // 2019-12-31T20:00:00Z is 1 January 2020 in Bangkok.
        post.published_at = Some(bson::DateTime::from_millis(1_577_822_400_000));
        post
    }

    #[test]
    fn builds_article_with_bangkok_date_url() {
        let post = published_post();
        let og = OpenGraph::for_post("http://localhost", &post, None);

        assert_eq!(og.url, format!("http://localhost/2020/1/1/{}", post.slug));
        assert_eq!(og.kind, "article");
        assert_eq!(og.description, "Lorem ipsum dolor sit amet.");
        assert_eq!(og.image, "http://localhost/assets/images/303589.webp");
    }

    #[test]
    fn featured_image_points_at_storage_endpoint() {
        let post = published_post();
        let file = File::new(ObjectId::new(), "a/cover-1.png", "cover.png", "cover-1.png");
        let og = OpenGraph::for_post("http://localhost", &post, Some(&file));
        assert_eq!(og.image, "http://localhost/api/v2.1/storage/cover-1.png");
    }

    #[test]
    fn rendered_html_escapes_values() {
        let og = OpenGraph::for_post("http://localhost", &published_post(), None);
        let html = og.render_html();
        assert!(html.contains(r#"<meta property="og:title" content="Test &lt;Post&gt;">"#));
        assert!(html.contains(r#"<meta property="og:type" content="article">"#));
    }
}
