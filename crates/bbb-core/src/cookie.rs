//! `Set-Cookie` parsing and session id extraction.
//!
//! The server pins a client to one node through a `JSESSIONID` cookie. The
//! parser here is deliberately forgiving: a header it cannot make sense of
//! yields an empty [`Cookie`] instead of an error.

use std::net::IpAddr;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tracing::trace;

/// Name of the cookie carrying the server session.
pub const SESSION_COOKIE_NAME: &str = "JSESSIONID";

/// Default cookie path when the header does not set one.
pub const DEFAULT_PATH: &str = "/";

/// A cookie parsed from one `Set-Cookie` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: Option<String>,
    pub value: Option<String>,
    pub domain: Option<String>,
    pub path: String,
    pub expires: Option<DateTime<Utc>>,
    /// Max-Age in seconds.
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub discard: bool,
    /// Attributes the parser does not know, kept verbatim in header order.
    pub extensions: Vec<(String, Option<String>)>,
}

impl Default for Cookie {
    fn default() -> Self {
        Self {
            name: None,
            value: None,
            domain: None,
            path: DEFAULT_PATH.to_string(),
            expires: None,
            max_age: None,
            secure: false,
            http_only: false,
            discard: false,
            extensions: Vec::new(),
        }
    }
}

impl Cookie {
    /// Parses a `Set-Cookie` header value using the current time.
    pub fn parse(header: &str) -> Self {
        Self::parse_at(header, Utc::now())
    }

    /// Parses a `Set-Cookie` header value.
    ///
    /// `now` anchors a `Max-Age` attribute when no `Expires` is present.
    pub fn parse_at(header: &str, now: DateTime<Utc>) -> Self {
        let mut cookie = Self::default();

        let mut pieces = header
            .split(';')
            .map(str::trim)
            .filter(|piece| !piece.is_empty());

        let Some((name, value)) = pieces.next().and_then(|first| first.split_once('=')) else {
            trace!("set-cookie header without a name=value pair");
            return cookie;
        };
        cookie.name = Some(name.trim().to_string());
        cookie.value = Some(value.trim().to_string());

        for piece in pieces {
            let (key, value) = match piece.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (piece, None),
            };

            match key.to_ascii_lowercase().as_str() {
                "domain" => cookie.domain = value.map(str::to_string),
                "path" => {
                    if let Some(path) = value.filter(|p| !p.is_empty()) {
                        cookie.path = path.to_string();
                    }
                }
                "expires" => cookie.expires = value.and_then(parse_expires),
                "max-age" => cookie.max_age = value.and_then(|v| v.parse().ok()),
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "discard" => cookie.discard = true,
                _ => cookie
                    .extensions
                    .push((key.to_string(), value.map(str::to_string))),
            }
        }

        if cookie.expires.is_none() {
            cookie.expires = cookie
                .max_age
                .and_then(Duration::try_seconds)
                .and_then(|age| now.checked_add_signed(age));
        }

        cookie
    }

    /// Returns true if the cookie has expired at `now`.
    ///
    /// A cookie without `Expires` or `Max-Age` lives for the session and
    /// never expires here.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.max_age.is_some_and(|age| age <= 0) {
            return true;
        }
        self.expires.is_some_and(|expires| now > expires)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the cookie should be sent to `host`.
    pub fn matches_domain(&self, host: &str) -> bool {
        let Some(domain) = self.domain.as_deref() else {
            return true;
        };

        let domain = domain.trim_start_matches('.').to_ascii_lowercase();
        let host = host.to_ascii_lowercase();

        if domain.is_empty() || host == domain {
            return true;
        }
        // An IP address domain never acts as a suffix.
        if domain.parse::<IpAddr>().is_ok() {
            return host == domain;
        }
        host.ends_with(&format!(".{}", domain))
    }

    /// Returns true if the cookie should be sent for `request_path`.
    pub fn matches_path(&self, request_path: &str) -> bool {
        let cookie_path = self.path.as_str();
        if cookie_path == DEFAULT_PATH || cookie_path == request_path {
            return true;
        }
        if !request_path.starts_with(cookie_path) {
            return false;
        }
        cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/')
    }

    /// Renders the cookie as it is sent back in a `Cookie` header.
    pub fn to_header_value(&self) -> String {
        format!(
            "{}={}",
            self.name.as_deref().unwrap_or_default(),
            self.value.as_deref().unwrap_or_default()
        )
    }
}

/// Scans `Set-Cookie` header values for a non-empty `JSESSIONID`.
///
/// An empty value is how the server clears a session, so it maps to `None`.
pub fn extract_session_id<S: AsRef<str>>(headers: &[S]) -> Option<String> {
    headers
        .iter()
        .map(|header| Cookie::parse(header.as_ref()))
        .find(|cookie| {
            cookie.name.as_deref() == Some(SESSION_COOKIE_NAME)
                && cookie.value.as_deref().is_some_and(|v| !v.is_empty())
        })
        .and_then(|cookie| cookie.value)
}

fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%a, %d-%b-%Y %H:%M:%S GMT", "%A, %d-%b-%y %H:%M:%S GMT"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}
