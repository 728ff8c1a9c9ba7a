use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::error;

pub const GRAPH_API_ENDPOINT: &str = "https://graph.facebook.com/v5.0/";

/// Social share counts for a public URL.
#[async_trait]
pub trait EngagementSource: Send + Sync {
    async fn share_count(&self, url: &str) -> i64;
}

#[derive(Debug, Deserialize)]
struct UrlNode {
    #[serde(default)]
    engagement: UrlNodeEngagement,
}

#[derive(Debug, Default, Deserialize)]
struct UrlNodeEngagement {
    #[serde(default)]
    share_count: i64,
}

/// Facebook Graph API URL-node lookup. Without an app access token every
/// count is zero and no request is made.
#[derive(Clone)]
pub struct GraphApiClient {
    endpoint: String,
    access_token: Option<String>,
    http: reqwest::Client,
}

impl fmt::Debug for GraphApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphApiClient")
            .field("endpoint", &self.endpoint)
            .field("enabled", &self.access_token.is_some())
            .finish()
    }
}

impl GraphApiClient {
    pub fn new(access_token: Option<String>, http: reqwest::Client) -> Self {
        Self {
            endpoint: GRAPH_API_ENDPOINT.to_string(),
            access_token: access_token.filter(|token| !token.is_empty()),
            http,
        }
    }

    async fn fetch(&self, token: &str, url: &str) -> Result<i64, reqwest::Error> {
        let node: UrlNode = self
            .http
            .get(&self.endpoint)
            .query(&[("id", url), ("access_token", token), ("fields", "engagement")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(node.engagement.share_count)
    }
}

#[async_trait]
impl EngagementSource for GraphApiClient {
    async fn share_count(&self, url: &str) -> i64 {
        let Some(token) = self.access_token.as_deref() else {
            return 0;
        };

        match self.fetch(token, url).await {
            Ok(count) => count,
            Err(err) => {
                error!("unable to retrieve URL node {url}: {err}");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_without_token() {
        let client = GraphApiClient::new(Some(String::new()), reqwest::Client::new());
        assert_eq!(client.share_count("https://www.example.com/2020/1/1/a").await, 0);
    }

    #[test]
    fn parses_url_node() {
        let node: UrlNode = serde_json::from_str(
            r#"{"id":"https://x","engagement":{"comment_count":1,"share_count":12}}"#,
        )
        .expect("url node");
        assert_eq!(node.engagement.share_count, 12);
    }
}
