//! HTTP transports for the BigBlueButton API.
//!
//! - [`Transport`] - the trait the API client sends requests through
//! - [`DirectTransport`] - one `ureq` agent per call, tuned via [`DirectOptions`]
//! - [`ClientTransport`] - delegates to any [`HttpClient`]; with the `reqwest`
//!   feature, [`ReqwestClient`] is provided
//!
//! ```text
//!   Request ──► Transport::send ──► Response { body, session_id }
//!                    │
//!         ┌──────────┴───────────┐
//!         ▼                      ▼
//!  DirectTransport        ClientTransport<C: HttpClient>
//!     (ureq)                  (reqwest, mocks, ...)
//! ```
//!
//! Both backends report a non-2xx status as [`bbb_core::ErrorKind::Network`]
//! and an unreachable server as [`bbb_core::ErrorKind::Transport`].

pub mod client;
pub mod direct;
pub mod request;
#[cfg(feature = "reqwest")]
pub mod reqwest_client;
pub mod transport;

pub use client::{ClientTransport, HttpClient, HttpClientError};
pub use direct::{DirectOptions, DirectTransport};
pub use request::{DEFAULT_CONTENT_TYPE, Request, Response};
#[cfg(feature = "reqwest")]
pub use reqwest_client::{ReqwestClient, ReqwestTransport};
pub use transport::Transport;
