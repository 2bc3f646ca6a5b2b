//! Subscriber setup for host applications.
//!
//! The `bbb` crates only emit `tracing` events (request method, the URL
//! without its checksum, response status, session cookie changes). Nothing
//! is printed unless the host installs a subscriber. Hosts without logging
//! of their own can call [`init_tracing`] once at startup:
//!
//! ```ignore
//! use bbb_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(&TracingConfig::from_env()?)?;
//! ```
//!
//! Two environment variables drive [`TracingConfig::from_env`]:
//!
//! - `BBB_LOG` - an `EnvFilter` directive, e.g. `bbb_transport=trace`
//! - `BBB_LOG_FORMAT` - `pretty`, `compact` or `json`

use std::str::FromStr;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

pub const ENV_LOG: &str = "BBB_LOG";
pub const ENV_LOG_FORMAT: &str = "BBB_LOG_FORMAT";

/// Crates whose events the default filter lets through.
const TARGETS: [&str; 3] = ["bbb_core", "bbb_transport", "bbb_api"];

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("a global tracing subscriber is already installed: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("invalid log filter {directive:?}: {source}")]
    EnvFilter {
        directive: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("unknown log format {0:?} (expected pretty, compact or json)")]
    UnknownFormat(String),
}

/// How events are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    #[default]
    Pretty,
    Compact,
    /// One JSON object per line, for log shippers.
    Json,
}

impl FromStr for TracingOutputFormat {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(TracingError::UnknownFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for the `bbb` crates when no filter directive is given.
    pub level: Level,
    pub format: TracingOutputFormat,
    /// Full `EnvFilter` directive; replaces `level` when set.
    pub filter: Option<String>,
    /// Adds file and line to every event.
    pub with_location: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingOutputFormat::default(),
            filter: None,
            with_location: false,
        }
    }
}

impl TracingConfig {
    /// Reads `BBB_LOG` and `BBB_LOG_FORMAT` from the process environment.
    pub fn from_env() -> Result<Self, TracingError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`TracingConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TracingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            config.filter = Some(filter.trim().to_string());
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT).filter(|v| !v.trim().is_empty()) {
            config.format = format.parse()?;
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, directive: impl Into<String>) -> Self {
        self.filter = Some(directive.into());
        self
    }

    /// The directive the subscriber filters with.
    pub fn directive(&self) -> String {
        if let Some(filter) = &self.filter {
            return filter.clone();
        }
        let level = self.level.as_str().to_ascii_lowercase();
        TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parses [`TracingConfig::directive`] into a filter.
    pub fn env_filter(&self) -> Result<EnvFilter, TracingError> {
        let directive = self.directive();
        EnvFilter::try_new(&directive).map_err(|source| TracingError::EnvFilter {
            directive,
            source,
        })
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let location = self.with_location;
        match self.format {
            TracingOutputFormat::Pretty => fmt::layer()
                .pretty()
                .with_file(location)
                .with_line_number(location)
                .boxed(),
            TracingOutputFormat::Compact => fmt::layer()
                .compact()
                .with_file(location)
                .with_line_number(location)
                .boxed(),
            TracingOutputFormat::Json => fmt::layer()
                .json()
                .with_file(location)
                .with_line_number(location)
                .boxed(),
        }
    }
}

/// Installs a global subscriber built from `config`.
///
/// # Errors
///
/// Fails if the filter directive does not parse or a global subscriber is
/// already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TracingError> {
    let filter = config.env_filter()?;
    let subscriber = tracing_subscriber::registry().with(config.fmt_layer().with_filter(filter));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
