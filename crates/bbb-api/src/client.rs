//! The [`BigBlueButton`] client.

use std::fmt;

use tracing::{debug, warn};

use bbb_core::{BbbResult, HashingAlgorithm, Query, Secret, UrlBuilder};
use bbb_transport::{DEFAULT_CONTENT_TYPE, DirectOptions, DirectTransport, Request, Transport};

use crate::api::ApiMethod;
use crate::config::ClientConfig;
use crate::response::ApiResponse;

/// Content type of uploaded caption tracks.
pub const TEXT_TRACK_CONTENT_TYPE: &str = "text/vtt";

/// Client for one conferencing server.
///
/// Every call signs its query with the current secret and algorithm, sends
/// it through the transport and parses the body in the method's format.
pub struct BigBlueButton<T: Transport = DirectTransport> {
    urls: UrlBuilder,
    transport: T,
    session_id: Option<String>,
}

impl BigBlueButton<DirectTransport> {
    /// Creates a client using the direct transport tuned from `config`.
    pub fn new(config: ClientConfig) -> Self {
        let options = DirectOptions::new()
            .with_connect_timeout(config.connect_timeout)
            .with_timeout(config.timeout)
            .with_user_agent(config.user_agent.clone());
        Self::with_transport(config, DirectTransport::with_options(options))
    }

    /// Creates a client from the process environment.
    pub fn from_env() -> BbbResult<Self> {
        Ok(Self::new(ClientConfig::from_env()?))
    }
}

#[cfg(feature = "reqwest")]
impl BigBlueButton<bbb_transport::ReqwestTransport> {
    /// Creates a client using the `reqwest`-backed transport.
    pub fn with_reqwest(config: ClientConfig) -> BbbResult<Self> {
        let client =
            bbb_transport::ReqwestClient::with_timeouts(config.connect_timeout, config.timeout)?;
        let transport = bbb_transport::ClientTransport::new(client)
            .with_default_header("User-Agent", config.user_agent.clone());
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> BigBlueButton<T> {
    /// Creates a client sending requests through `transport`.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let urls = UrlBuilder::new(config.base_url.as_str(), config.secret)
            .with_algorithm(config.algorithm);
        Self {
            urls,
            transport,
            session_id: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Replaces the secret for all later calls.
    pub fn set_secret(&mut self, secret: impl Into<Secret>) {
        self.urls.set_secret(secret);
    }

    /// Switches the checksum algorithm for all later calls.
    pub fn set_algorithm(&mut self, algorithm: HashingAlgorithm) {
        self.urls.set_algorithm(algorithm);
    }

    pub fn algorithm(&self) -> HashingAlgorithm {
        self.urls.algorithm()
    }

    /// Sets the session sent as `JSESSIONID` with later calls.
    ///
    /// The session a server hands out is available on each response through
    /// [`ApiResponse::session_id`].
    pub fn set_session_id(&mut self, session_id: Option<String>) {
        self.session_id = session_id;
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Returns the URL for `method`, signed unless the method is unsigned.
    pub fn url_for(&self, method: ApiMethod, query: &Query) -> String {
        self.urls
            .build_url(method.as_str(), &query.encode(), method.is_signed())
    }

    /// Returns the signed join URL to hand to a user's browser.
    ///
    /// No request is made; the server answers the browser with a redirect
    /// into the meeting.
    pub fn join_meeting_url(&self, query: &Query) -> String {
        self.url_for(ApiMethod::Join, query)
    }

    /// Performs `method`, posting `body` as XML when present.
    pub fn call(
        &self,
        method: ApiMethod,
        query: &Query,
        body: Option<&str>,
    ) -> BbbResult<ApiResponse> {
        self.call_with_content_type(method, query, body, DEFAULT_CONTENT_TYPE)
    }

    /// Performs `method`, posting `body` with `content_type` when present.
    pub fn call_with_content_type(
        &self,
        method: ApiMethod,
        query: &Query,
        body: Option<&str>,
        content_type: &str,
    ) -> BbbResult<ApiResponse> {
        let mut request = Request::post(self.url_for(method, query), body.unwrap_or_default())
            .with_content_type(content_type);
        if let Some(ref session_id) = self.session_id {
            request = request.with_session_id(session_id.clone());
        }

        debug!(method = %method, post = request.is_post(), "calling API");
        let response = self.transport.send(&request)?;
        let session_id = response.session_id().map(str::to_string);
        let parsed =
            ApiResponse::parse(method.response_format(), response.into_body(), session_id)?;

        if !parsed.is_success() {
            warn!(
                method = %method,
                returncode = %parsed.returncode(),
                message_key = parsed.message_key().unwrap_or_default(),
                "API call was not successful"
            );
        }
        Ok(parsed)
    }

    /// Returns the server's API version. This call is not signed.
    pub fn api_version(&self) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::Version, &Query::new(), None)
    }

    /// Creates a meeting, optionally preloading presentations from `presentation_xml`.
    pub fn create_meeting(
        &self,
        query: &Query,
        presentation_xml: Option<&str>,
    ) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::Create, query, presentation_xml)
    }

    pub fn end_meeting(&self, query: &Query) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::End, query, None)
    }

    pub fn is_meeting_running(&self, query: &Query) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::IsMeetingRunning, query, None)
    }

    pub fn get_meeting_info(&self, query: &Query) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::GetMeetingInfo, query, None)
    }

    pub fn get_meetings(&self) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::GetMeetings, &Query::new(), None)
    }

    pub fn get_recordings(&self, query: &Query) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::GetRecordings, query, None)
    }

    pub fn publish_recordings(&self, query: &Query) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::PublishRecordings, query, None)
    }

    pub fn delete_recordings(&self, query: &Query) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::DeleteRecordings, query, None)
    }

    pub fn update_recordings(&self, query: &Query) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::UpdateRecordings, query, None)
    }

    pub fn get_recording_text_tracks(&self, query: &Query) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::GetRecordingTextTracks, query, None)
    }

    /// Uploads a caption track, or only signals one when `track` is `None`.
    pub fn put_recording_text_track(
        &self,
        query: &Query,
        track: Option<&str>,
    ) -> BbbResult<ApiResponse> {
        self.call_with_content_type(
            ApiMethod::PutRecordingTextTrack,
            query,
            track,
            TEXT_TRACK_CONTENT_TYPE,
        )
    }

    /// Adds presentations to a running meeting.
    pub fn insert_document(&self, query: &Query, xml: &str) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::InsertDocument, query, Some(xml))
    }

    pub fn hooks_create(&self, query: &Query) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::HooksCreate, query, None)
    }

    pub fn hooks_list(&self, query: &Query) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::HooksList, query, None)
    }

    pub fn hooks_destroy(&self, query: &Query) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::HooksDestroy, query, None)
    }

    pub fn send_chat_message(&self, query: &Query) -> BbbResult<ApiResponse> {
        self.call(ApiMethod::SendChatMessage, query, None)
    }
}

impl<T: Transport> fmt::Debug for BigBlueButton<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BigBlueButton")
            .field("base_url", &self.urls.base_url())
            .field("algorithm", &self.urls.algorithm())
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}
