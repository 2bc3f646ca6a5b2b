//! Client for the BigBlueButton administrative API.
//!
//! ```no_run
//! use bbb_api::{BigBlueButton, ClientConfig, Query};
//!
//! # fn main() -> bbb_api::BbbResult<()> {
//! let config = ClientConfig::new("https://bbb.example.com/bigbluebutton/", "secret")?;
//! let bbb = BigBlueButton::new(config);
//!
//! let query = Query::new().with("name", "Weekly sync").with("meetingID", "weekly");
//! let created = bbb.create_meeting(&query, None)?;
//! if created.is_success() {
//!     let join = Query::new()
//!         .with("fullName", "Ada")
//!         .with("meetingID", "weekly")
//!         .with("role", "MODERATOR");
//!     println!("{}", bbb.join_meeting_url(&join));
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod response;

pub use api::{ApiMethod, ResponseFormat};
pub use client::{BigBlueButton, TEXT_TRACK_CONTENT_TYPE};
pub use config::ClientConfig;
pub use response::{ApiResponse, ReturnCode};

pub use bbb_core::{BbbError, BbbResult, ErrorKind, HashingAlgorithm, Query, Secret};
pub use bbb_transport::{DirectOptions, DirectTransport, Request, Response, Transport};
