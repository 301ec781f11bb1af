use crate::error::{Result, UpdateError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url};
use std::time::Duration;

/// Default location of the update service.
pub const DEFAULT_BASE_URL: &str = "https://updates.maxmind.com/";

/// Raw answer from the update service.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Numeric HTTP status.
    pub status: u16,
    /// Status line text, e.g. `200 OK`.
    pub status_text: String,
    /// Complete response body.
    pub body: Bytes,
}

impl RawResponse {
    /// The service signals success with any status in `200..=209`.
    pub fn is_success(&self) -> bool {
        (200..=209).contains(&self.status)
    }

    /// Return the body, or a status error naming `path` if the request did
    /// not succeed.
    pub fn into_success_body(self, path: &str) -> Result<Bytes> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(UpdateError::Status {
                path: path.to_string(),
                status: self.status_text,
            })
        }
    }
}

/// Abstraction over issuing GET requests against the update service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Request `path` with the given query parameters and read the full body.
    async fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Result<RawResponse>;
}

/// Builder for [`HttpTransport`].
#[derive(Default)]
pub struct HttpTransportBuilder {
    base: Option<Url>,
    client: Option<Client>,
    timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    /// Set the service base URL (e.g. `https://updates.maxmind.com/`).
    pub fn base_url(mut self, url: Url) -> Self {
        self.base = Some(url);
        self
    }

    /// Provide a custom reqwest client instance.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Per-request timeout. Ignored when a custom client is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<HttpTransport> {
        let base = match self.base {
            Some(base) => base,
            None => Url::parse(DEFAULT_BASE_URL)
                .map_err(|err| UpdateError::validation(format!("invalid base URL: {err}")))?,
        };
        let client = match self.client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder()
                    .user_agent(concat!("geoipupdate/", env!("CARGO_PKG_VERSION")));
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(HttpTransport { base, client })
    }
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    base: Url,
    client: Client,
}

impl HttpTransport {
    /// Create a new builder.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint_url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|err| UpdateError::validation(format!("invalid endpoint URL {path}: {err}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Result<RawResponse> {
        let url = self.endpoint_url(path)?;
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        tracing::debug!("{} answered {} ({} bytes)", path, status, body.len());
        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> RawResponse {
        RawResponse {
            status,
            status_text: format!("{status} Test"),
            body: Bytes::from_static(b"body"),
        }
    }

    #[test]
    fn success_band_is_inclusive() {
        assert!(!response(199).is_success());
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(response(209).is_success());
        assert!(!response(210).is_success());
        assert!(!response(404).is_success());
    }

    #[test]
    fn failed_status_carries_status_text() {
        let err = response(500)
            .into_success_body("/app/update_getipaddr")
            .unwrap_err();
        match err {
            UpdateError::Status { path, status } => {
                assert_eq!(path, "/app/update_getipaddr");
                assert_eq!(status, "500 Test");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn endpoint_paths_join_onto_base() {
        let transport = HttpTransport::builder()
            .base_url(Url::parse("http://127.0.0.1:8080/").unwrap())
            .build()
            .unwrap();
        let url = transport.endpoint_url("/app/update_secure").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/app/update_secure");
    }

    #[test]
    fn default_base_url() {
        let transport = HttpTransport::builder().build().unwrap();
        assert_eq!(transport.base_url().as_str(), DEFAULT_BASE_URL);
    }
}
