use std::time::Duration;

/// Upper bound for any call to an upstream service: JWKS, GitHub gists,
/// the Facebook Graph API and Algolia.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);
pub const UPSTREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared outbound HTTP client with request and connect timeouts.
pub fn upstream_client() -> reqwest::Result<reqwest::Client> {
    client_with_timeout(UPSTREAM_TIMEOUT)
}

pub fn client_with_timeout(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(UPSTREAM_CONNECT_TIMEOUT.min(timeout))
        .user_agent(concat!("myblog-server/", env!("CARGO_PKG_VERSION")))
        .build()
}
