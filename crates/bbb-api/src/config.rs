//! Client configuration.
//!
//! The base URL and the shared secret are required; everything else has a
//! default. Both can be read from the environment:
//!
//! - `BBB_SERVER_BASE_URL` - e.g. `https://bbb.example.com/bigbluebutton/`
//! - `BBB_SECRET` (or the legacy `BBB_SECURITY_SALT`) - taken literally
//! - `BBB_HASH_ALGORITHM` - optional, `sha1` when unset

use std::time::Duration;

use url::Url;

use bbb_core::{BbbError, BbbResult, HashingAlgorithm, Secret};

pub const ENV_BASE_URL: &str = "BBB_SERVER_BASE_URL";
pub const ENV_SECRET: &str = "BBB_SECRET";
pub const ENV_LEGACY_SECRET: &str = "BBB_SECURITY_SALT";
pub const ENV_HASH_ALGORITHM: &str = "BBB_HASH_ALGORITHM";

/// Configuration for a [`crate::BigBlueButton`] client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, always ending with `/`.
    pub base_url: Url,

    /// Shared secret used to sign calls.
    pub secret: Secret,

    /// Checksum hash algorithm.
    pub algorithm: HashingAlgorithm,

    /// Connection establishment timeout.
    pub connect_timeout: Duration,

    /// Overall request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl ClientConfig {
    /// Default connect timeout in seconds.
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Default overall timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration for one server.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either value is empty or the URL is
    /// not a valid absolute URL.
    pub fn new(base_url: impl AsRef<str>, secret: impl Into<Secret>) -> BbbResult<Self> {
        let base_url = base_url.as_ref().trim();
        if base_url.is_empty() {
            return Err(BbbError::configuration("base URL is not set"));
        }
        let secret = secret.into();
        if secret.is_empty() {
            return Err(BbbError::configuration("secret is not set"));
        }

        let mut url = Url::parse(base_url).map_err(|e| {
            BbbError::configuration(format!("invalid base URL {}: {}", base_url, e)).with_source(e)
        })?;
        if url.cannot_be_a_base() {
            return Err(BbbError::configuration(format!(
                "base URL {} cannot be used as a base",
                base_url
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            secret,
            algorithm: HashingAlgorithm::default(),
            connect_timeout: Duration::from_secs(Self::DEFAULT_CONNECT_TIMEOUT_SECS),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("bbb-api/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Loads the configuration from the process environment.
    pub fn from_env() -> BbbResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup<F>(lookup: F) -> BbbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let base_url = non_empty(ENV_BASE_URL)
            .ok_or_else(|| BbbError::configuration(format!("{} is not set", ENV_BASE_URL)))?;
        let secret = non_empty(ENV_SECRET)
            .or_else(|| non_empty(ENV_LEGACY_SECRET))
            .ok_or_else(|| {
                BbbError::configuration(format!(
                    "{} (or {}) is not set",
                    ENV_SECRET, ENV_LEGACY_SECRET
                ))
            })?;

        let mut config = Self::new(base_url, secret.trim().to_string())?;
        if let Some(name) = non_empty(ENV_HASH_ALGORITHM) {
            let algorithm = name.parse::<HashingAlgorithm>().map_err(|e| {
                BbbError::configuration(format!("{}: {}", ENV_HASH_ALGORITHM, e.message()))
            })?;
            config = config.with_algorithm(algorithm);
        }
        Ok(config)
    }

    /// Sets the checksum hash algorithm.
    pub fn with_algorithm(mut self, algorithm: HashingAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the connect and overall timeouts.
    pub fn with_timeouts(mut self, connect_timeout: Duration, timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the base URL as a string.
    pub fn url_str(&self) -> &str {
        self.base_url.as_str()
    }
}
