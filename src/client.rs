//! HTTP access to the snapshot service and article pages.
//!
//! The stages talk to the network through the [`PageFetcher`] trait so the
//! pagination and fetch loops can be driven by an in-memory fake in tests.
//! [`HttpFetcher`] is the real implementation: one shared `reqwest` client
//! carrying the fixed User-Agent and per-request timeout.
//!
//! No retries happen here. A failed request is returned to the caller, which
//! logs it and moves on to the next item.

use crate::error::{Result, ScrapeError};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Something that can GET a URL.
pub trait PageFetcher {
    /// Fetch a page and return its body as text.
    async fn get_text(&self, url: &str) -> Result<String>;

    /// Fetch a resource and return its raw bytes.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`PageFetcher`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client that sends `user_agent` on every request and gives up
    /// after `timeout`.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::Http`] if the TLS backend cannot be initialized.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let elapsed_ms = t0.elapsed().as_millis();

        if !status.is_success() {
            warn!(%url, status = status.as_u16(), elapsed_ms, "Non-success response");
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        debug!(%url, status = status.as_u16(), elapsed_ms, "GET ok");
        Ok(response)
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn get_text(&self, url: &str) -> Result<String> {
        Ok(self.get(url).await?.text().await?)
    }

    #[instrument(level = "debug", skip(self))]
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        Ok(self.get(url).await?.bytes().await?.to_vec())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new("test-agent/1.0", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_text_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article"))
            .and(header("user-agent", "test-agent/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<title>Hi</title>"))
            .expect(1)
            .mount(&server)
            .await;

        let body = fetcher()
            .get_text(&format!("{}/article", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<title>Hi</title>");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetcher()
            .get_text(&format!("{}/gone", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_get_bytes_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]))
            .mount(&server)
            .await;

        let bytes = fetcher()
            .get_bytes(&format!("{}/img.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, vec![0x89, 0x50, 0x4e, 0x47]);
    }
}
