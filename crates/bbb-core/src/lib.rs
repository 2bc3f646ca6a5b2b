//! Request signing and wire helpers for the BigBlueButton API.
//!
//! - [`checksum`] - checksum computation and signed URL construction
//! - [`query`] - ordered query-string serialization
//! - [`cookie`] - `Set-Cookie` parsing and `JSESSIONID` extraction
//! - [`merge`] - header list and option map merging
//! - [`error`] - the error taxonomy shared by all `bbb` crates
//! - [`tracing`](mod@crate::tracing) - subscriber setup for host applications
//!
//! Everything here is pure computation; network I/O lives in
//! `bbb-transport`.

pub mod checksum;
pub mod cookie;
pub mod error;
pub mod merge;
pub mod query;
pub mod tracing;

pub use checksum::{
    CHECKSUM_PARAM, HashingAlgorithm, Secret, UrlBuilder, build_query_with_checksum, build_url,
};
pub use cookie::{Cookie, SESSION_COOKIE_NAME, extract_session_id};
pub use error::{BbbError, BbbResult, ErrorKind};
pub use merge::{header_list_from_value, merge_headers, merge_recursive};
pub use query::Query;
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
