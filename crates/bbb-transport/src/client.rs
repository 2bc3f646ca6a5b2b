//! Transport backed by a pluggable HTTP client.
//!
//! [`ClientTransport`] turns a [`Request`] into an `http::Request`, hands it
//! to an [`HttpClient`] and maps the `http::Response` back. Any client able
//! to send an `http::Request<Vec<u8>>` can be plugged in; the `reqwest`
//! feature provides [`crate::ReqwestClient`].

use http::header::{CONTENT_LENGTH, CONTENT_TYPE, COOKIE, HeaderName, HeaderValue, SET_COOKIE};
use thiserror::Error;
use tracing::{debug, warn};

use bbb_core::{BbbError, BbbResult, extract_session_id};

use crate::request::{Request, Response};
use crate::transport::Transport;

/// Connection-level failure reported by an [`HttpClient`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpClientError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HttpClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A blocking HTTP client.
///
/// Implementations return any HTTP response, whatever its status; only a
/// failure to obtain a response is an error.
pub trait HttpClient: Send + Sync {
    fn send(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, HttpClientError>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn send(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, HttpClientError> {
        (**self).send(request)
    }
}

impl<C: HttpClient + ?Sized> HttpClient for Box<C> {
    fn send(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, HttpClientError> {
        (**self).send(request)
    }
}

/// [`Transport`] delegating the exchange to an [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientTransport<C> {
    client: C,
    default_headers: Vec<(String, String)>,
}

impl<C: HttpClient> ClientTransport<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    ///
    /// `Content-Type` set here is replaced by the request's own content type.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Builds the `http::Request` sent for `request`.
    pub fn build_request(&self, request: &Request) -> BbbResult<http::Request<Vec<u8>>> {
        let mut http_request = http::Request::new(request.payload().as_bytes().to_vec());
        *http_request.method_mut() = request.method();
        *http_request.uri_mut() = request.url().parse().map_err(|e| {
            BbbError::invalid_argument(format!("invalid URL {}", request.loggable_url()))
                .with_source(e)
        })?;

        let headers = http_request.headers_mut();
        for (name, value) in &self.default_headers {
            headers.insert(header_name(name)?, header_value(value)?);
        }
        headers.insert(CONTENT_TYPE, header_value(request.content_type())?);
        if request.is_post() {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(request.payload().len()));
        }
        if let Some(cookie) = request.cookie_header() {
            headers.insert(COOKIE, header_value(&cookie)?);
        }

        Ok(http_request)
    }
}

impl<C: HttpClient> Transport for ClientTransport<C> {
    fn send(&self, request: &Request) -> BbbResult<Response> {
        let url = request.loggable_url();
        let http_request = self.build_request(request)?;
        debug!(method = %request.method(), url = %url, "sending request");

        let response = self.client.send(http_request).map_err(|e| {
            BbbError::transport(format!("request to {} failed: {}", url, e.message()))
                .with_source(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %url, "unexpected response status");
            return Err(BbbError::network(status.as_u16()));
        }

        let cookies: Vec<&str> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        let session_id = extract_session_id(&cookies);

        let body = String::from_utf8(response.into_body()).map_err(|e| {
            BbbError::parsing("response body is not valid UTF-8").with_source(e)
        })?;

        debug!(status = status.as_u16(), bytes = body.len(), "received response");
        Ok(Response::new(body, session_id))
    }
}

fn header_name(name: &str) -> BbbResult<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        BbbError::invalid_argument(format!("invalid header name {:?}", name)).with_source(e)
    })
}

fn header_value(value: &str) -> BbbResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        BbbError::invalid_argument(format!("invalid header value {:?}", value)).with_source(e)
    })
}
