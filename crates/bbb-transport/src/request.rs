//! Request and response values exchanged with a [`crate::Transport`].

use http::Method;

use bbb_core::SESSION_COOKIE_NAME;

/// Content type used when the caller does not choose one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/xml";

/// One API call to perform.
///
/// The payload decides the verb: an empty payload is a GET, anything else
/// is a POST carrying the payload as body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    url: String,
    payload: String,
    content_type: String,
    session_id: Option<String>,
}

impl Request {
    /// Creates a request without a body.
    pub fn get(url: impl Into<String>) -> Self {
        Self::post(url, String::new())
    }

    /// Creates a request with `payload` as body (a GET if it is empty).
    pub fn post(url: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            payload: payload.into(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            session_id: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Sends `JSESSIONID=<id>` with the request.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn is_post(&self) -> bool {
        !self.payload.is_empty()
    }

    pub fn method(&self) -> Method {
        if self.is_post() {
            Method::POST
        } else {
            Method::GET
        }
    }

    /// Returns the URL with its query string removed.
    ///
    /// The query carries the checksum and caller parameters, so only this
    /// form is ever logged.
    pub fn loggable_url(&self) -> &str {
        self.url
            .split_once('?')
            .map_or(self.url.as_str(), |(path, _)| path)
    }

    /// Returns the cookie header value for the session, if any.
    pub fn cookie_header(&self) -> Option<String> {
        self.session_id
            .as_deref()
            .map(|id| format!("{}={}", SESSION_COOKIE_NAME, id))
    }

    /// Headers every backend sends for this request, as `"Name: Value"`.
    ///
    /// `Content-Type` and `Content-Length` are only present for a POST; the
    /// length counts bytes, not characters.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = Vec::new();
        if self.is_post() {
            headers.push(format!("Content-Type: {}", self.content_type));
            headers.push(format!("Content-Length: {}", self.payload.len()));
        }
        if let Some(cookie) = self.cookie_header() {
            headers.push(format!("Cookie: {}", cookie));
        }
        headers
    }
}

/// Body and session returned by a [`crate::Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    body: String,
    session_id: Option<String>,
}

impl Response {
    pub fn new(body: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            body: body.into(),
            session_id,
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn into_body(self) -> String {
        self.body
    }
}
