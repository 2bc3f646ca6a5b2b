//! Direct transport: one fresh `ureq` agent per call.
//!
//! Low-level behaviour is driven by a dynamic option map ([`DirectOptions`]).
//! For every call the effective options are
//! `merge_recursive(false, [mandated, caller, defaults])`, so the options the
//! transport relies on (UTF-8 decoding, returning the body, following
//! redirects) cannot be switched off by a caller.
//!
//! The agent, its connection and its cookie jar live for exactly one call
//! and are dropped on every exit path.

use std::time::Duration;

use http::header::SET_COOKIE;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use bbb_core::{
    BbbError, BbbResult, extract_session_id, header_list_from_value, merge_headers,
    merge_recursive,
};

use crate::request::{Request, Response};
use crate::transport::Transport;

/// Option keys understood by [`DirectTransport`].
pub mod keys {
    pub const CONNECT_TIMEOUT_SECS: &str = "connect_timeout_secs";
    pub const TIMEOUT_SECS: &str = "timeout_secs";
    pub const MAX_REDIRECTS: &str = "max_redirects";
    pub const VERIFY_TLS: &str = "verify_tls";
    pub const USER_AGENT: &str = "user_agent";
    /// Array of `"Name: Value"` strings sent with every request.
    pub const HTTP_HEADER: &str = "http_header";
    pub const ENCODING: &str = "encoding";
    pub const RETURN_TRANSFER: &str = "return_transfer";
    pub const FOLLOW_LOCATION: &str = "follow_location";
}

/// Caller-supplied options for [`DirectTransport`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectOptions {
    map: Map<String, Value>,
}

impl DirectOptions {
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_MAX_REDIRECTS: u32 = 10;
    pub const ENCODING: &'static str = "UTF-8";

    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing option map.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self { map }
    }

    /// Sets an arbitrary option.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.map.insert(key.into(), value.into());
        self
    }

    pub fn with_connect_timeout(self, timeout: Duration) -> Self {
        self.set(keys::CONNECT_TIMEOUT_SECS, timeout.as_secs())
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.set(keys::TIMEOUT_SECS, timeout.as_secs())
    }

    pub fn with_user_agent(self, user_agent: impl Into<String>) -> Self {
        self.set(keys::USER_AGENT, user_agent.into())
    }

    /// Disables TLS verification (for testing only).
    pub fn with_insecure_tls(self) -> Self {
        self.set(keys::VERIFY_TLS, false)
    }

    /// Sets headers sent with every request.
    pub fn with_headers<S: Into<String>>(self, headers: impl IntoIterator<Item = S>) -> Self {
        let headers: Vec<Value> = headers.into_iter().map(|h| Value::String(h.into())).collect();
        self.set(keys::HTTP_HEADER, headers)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.map
    }

    /// Options the transport depends on; always override caller values.
    pub fn mandated() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(keys::ENCODING.into(), Self::ENCODING.into());
        map.insert(keys::RETURN_TRANSFER.into(), true.into());
        map.insert(keys::FOLLOW_LOCATION.into(), true.into());
        map
    }

    /// Values used when the caller sets nothing.
    pub fn defaults() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            keys::CONNECT_TIMEOUT_SECS.into(),
            Self::DEFAULT_CONNECT_TIMEOUT_SECS.into(),
        );
        map.insert(keys::TIMEOUT_SECS.into(), Self::DEFAULT_TIMEOUT_SECS.into());
        map.insert(keys::MAX_REDIRECTS.into(), Self::DEFAULT_MAX_REDIRECTS.into());
        map.insert(keys::VERIFY_TLS.into(), true.into());
        map.insert(keys::HTTP_HEADER.into(), Value::Array(Vec::new()));
        map
    }

    /// Returns the options in force for a call.
    pub fn effective(&self) -> Map<String, Value> {
        merge_recursive(false, &[&Self::mandated(), &self.map, &Self::defaults()])
    }
}

/// Typed view of the effective options.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    connect_timeout: Duration,
    timeout: Duration,
    max_redirects: u32,
    verify_tls: bool,
    user_agent: Option<String>,
    headers: Vec<String>,
    encoding: String,
}

impl Settings {
    fn from_options(options: &Map<String, Value>) -> BbbResult<Self> {
        let follow = bool_option(options, keys::FOLLOW_LOCATION)?.unwrap_or(true);
        let max_redirects = if follow {
            u64_option(options, keys::MAX_REDIRECTS)?
                .map_or(DirectOptions::DEFAULT_MAX_REDIRECTS, |n| {
                    u32::try_from(n).unwrap_or(u32::MAX)
                })
        } else {
            0
        };

        let mut headers =
            header_list_from_value(options.get(keys::HTTP_HEADER).unwrap_or(&Value::Null))?;
        let encoding = str_option(options, keys::ENCODING)?
            .unwrap_or(DirectOptions::ENCODING)
            .to_string();
        headers.insert(0, format!("Accept-Charset: {}", encoding));

        Ok(Self {
            connect_timeout: Duration::from_secs(
                u64_option(options, keys::CONNECT_TIMEOUT_SECS)?
                    .unwrap_or(DirectOptions::DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
            timeout: Duration::from_secs(
                u64_option(options, keys::TIMEOUT_SECS)?
                    .unwrap_or(DirectOptions::DEFAULT_TIMEOUT_SECS),
            ),
            max_redirects,
            verify_tls: bool_option(options, keys::VERIFY_TLS)?.unwrap_or(true),
            user_agent: str_option(options, keys::USER_AGENT)?.map(str::to_string),
            headers,
            encoding,
        })
    }
}

fn u64_option(options: &Map<String, Value>, key: &str) -> BbbResult<Option<u64>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| wrong_type(key, value, "a non-negative integer")),
    }
}

fn bool_option(options: &Map<String, Value>, key: &str) -> BbbResult<Option<bool>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| wrong_type(key, value, "a boolean")),
    }
}

fn str_option<'a>(options: &'a Map<String, Value>, key: &str) -> BbbResult<Option<&'a str>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| wrong_type(key, value, "a string")),
    }
}

fn wrong_type(key: &str, value: &Value, expected: &str) -> BbbError {
    BbbError::invalid_argument(format!(
        "option {} must be {}, got {}",
        key, expected, value
    ))
}

/// Transport opening a new connection for every call.
#[derive(Debug, Clone, Default)]
pub struct DirectTransport {
    options: DirectOptions,
}

impl DirectTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DirectOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DirectOptions {
        &self.options
    }

    fn agent(settings: &Settings) -> ureq::Agent {
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(!settings.verify_tls)
            .build();

        ureq::Agent::config_builder()
            .timeout_connect(Some(settings.connect_timeout))
            .timeout_global(Some(settings.timeout))
            .max_redirects(settings.max_redirects)
            .http_status_as_error(false)
            .tls_config(tls)
            .build()
            .new_agent()
    }
}

impl Transport for DirectTransport {
    fn send(&self, request: &Request) -> BbbResult<Response> {
        let settings = Settings::from_options(&self.options.effective())?;

        let mut defaults = settings.headers.clone();
        if let Some(ref user_agent) = settings.user_agent {
            defaults.push(format!("User-Agent: {}", user_agent));
        }
        let headers = merge_headers(&[defaults, request.headers()])?;

        let agent = Self::agent(&settings);
        let url = request.loggable_url();
        debug!(method = %request.method(), url = %url, "sending request");

        let result = if request.is_post() {
            let mut builder = agent.post(request.url());
            for (name, value) in split_headers(&headers) {
                builder = builder.header(name, value);
            }
            builder.send(request.payload().as_bytes())
        } else {
            let mut builder = agent.get(request.url());
            for (name, value) in split_headers(&headers) {
                builder = builder.header(name, value);
            }
            builder.call()
        };

        let mut response = result.map_err(|e| {
            BbbError::transport(format!("request to {} failed: {}", url, e)).with_source(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %url, "unexpected response status");
            return Err(BbbError::network(status.as_u16()));
        }

        let mut cookies: Vec<String> = agent
            .cookie_jar_lock()
            .iter()
            .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
            .collect();
        cookies.extend(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .map(str::to_string),
        );
        trace!(cookies = cookies.len(), "collected cookies");

        let bytes = response.body_mut().read_to_vec().map_err(|e| {
            BbbError::transport(format!("failed to read response from {}: {}", url, e))
                .with_source(e)
        })?;
        let body = String::from_utf8(bytes).map_err(|e| {
            BbbError::parsing(format!(
                "response body is not valid {}",
                settings.encoding
            ))
            .with_source(e)
        })?;

        debug!(status = status.as_u16(), bytes = body.len(), "received response");
        Ok(Response::new(body, extract_session_id(&cookies)))
    }
}

fn split_headers(headers: &[String]) -> impl Iterator<Item = (&str, &str)> {
    headers.iter().filter_map(|header| header.split_once(": "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_apply_without_caller_options() {
        let settings = Settings::from_options(&DirectOptions::new().effective()).unwrap();
        assert_eq!(settings.connect_timeout, Duration::from_secs(10));
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.max_redirects, 10);
        assert!(settings.verify_tls);
        assert_eq!(settings.encoding, "UTF-8");
        assert_eq!(settings.headers, vec!["Accept-Charset: UTF-8".to_string()]);
    }

    #[test]
    fn caller_options_override_defaults() {
        let options = DirectOptions::new()
            .with_connect_timeout(Duration::from_secs(2))
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("lms/1.0")
            .with_headers(["X-Tenant: a"]);
        let settings = Settings::from_options(&options.effective()).unwrap();
        assert_eq!(settings.connect_timeout, Duration::from_secs(2));
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.user_agent.as_deref(), Some("lms/1.0"));
        assert!(settings.headers.contains(&"X-Tenant: a".to_string()));
    }

    #[test]
    fn mandated_options_always_win() {
        let options = DirectOptions::new()
            .set(keys::FOLLOW_LOCATION, false)
            .set(keys::RETURN_TRANSFER, false)
            .set(keys::ENCODING, "ISO-8859-1");
        let effective = options.effective();
        assert_eq!(effective[keys::FOLLOW_LOCATION], json!(true));
        assert_eq!(effective[keys::RETURN_TRANSFER], json!(true));
        assert_eq!(effective[keys::ENCODING], json!("UTF-8"));

        let settings = Settings::from_options(&effective).unwrap();
        assert_eq!(settings.max_redirects, DirectOptions::DEFAULT_MAX_REDIRECTS);
    }

    #[test]
    fn wrong_option_type_is_invalid_argument() {
        let options = DirectOptions::new().set(keys::TIMEOUT_SECS, "thirty");
        let err = Settings::from_options(&options.effective()).unwrap_err();
        assert_eq!(err.kind(), bbb_core::ErrorKind::InvalidArgument);
        assert!(err.message().contains(keys::TIMEOUT_SECS));
    }

    #[test]
    fn non_string_header_option_is_rejected() {
        let options = DirectOptions::new().set(keys::HTTP_HEADER, json!(["X-A: 1", 7]));
        let err = Settings::from_options(&options.effective()).unwrap_err();
        assert_eq!(err.kind(), bbb_core::ErrorKind::InvalidArgument);
        assert!(err.message().contains("number"));
    }

    #[test]
    fn insecure_tls_opt_out() {
        let options = DirectOptions::new().with_insecure_tls();
        let settings = Settings::from_options(&options.effective()).unwrap();
        assert!(!settings.verify_tls);
    }

    #[test]
    fn split_headers_skips_malformed() {
        let headers = vec!["a: 1".to_string(), "b".to_string()];
        assert_eq!(split_headers(&headers).collect::<Vec<_>>(), vec![("a", "1")]);
    }
}
