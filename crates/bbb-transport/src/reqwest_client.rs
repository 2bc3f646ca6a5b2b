//! [`HttpClient`] implementation on top of `reqwest::blocking`.

use std::time::Duration;

use bbb_core::{BbbError, BbbResult};

use crate::client::{ClientTransport, HttpClient, HttpClientError};

/// Blocking `reqwest` client with TLS verification and bounded redirects.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const MAX_REDIRECTS: usize = 10;

    /// Creates a client with the default timeouts.
    pub fn new() -> BbbResult<Self> {
        Self::with_timeouts(Self::DEFAULT_CONNECT_TIMEOUT, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeouts(connect_timeout: Duration, timeout: Duration) -> BbbResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(Self::MAX_REDIRECTS))
            .user_agent(format!("bbb-api/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                BbbError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;
        Ok(Self { client })
    }

    /// Wraps an already configured client.
    pub fn from_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl HttpClient for ReqwestClient {
    fn send(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, HttpClientError> {
        let (parts, body) = request.into_parts();

        let response = self
            .client
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .body(body)
            .send()
            .map_err(|e| HttpClientError::new(describe(&e)).with_source(e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .bytes()
            .map_err(|e| HttpClientError::new(describe(&e)).with_source(e))?;

        let mut http_response = http::Response::new(bytes.to_vec());
        *http_response.status_mut() = status;
        *http_response.headers_mut() = headers;
        Ok(http_response)
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("timed out: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}

/// Library-backed transport using `reqwest`.
pub type ReqwestTransport = ClientTransport<ReqwestClient>;

impl ReqwestTransport {
    /// Creates a `reqwest`-backed transport with the default timeouts.
    pub fn reqwest() -> BbbResult<Self> {
        Ok(ClientTransport::new(ReqwestClient::new()?))
    }
}
