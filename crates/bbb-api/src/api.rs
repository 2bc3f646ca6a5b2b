//! API method names and their response formats.

use std::fmt;

/// Body format returned by an API method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseFormat {
    Xml,
    Json,
}

/// Remote operations exposed under `<base_url>api/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    /// Server version; the only unsigned call.
    Version,
    Create,
    Join,
    End,
    IsMeetingRunning,
    GetMeetingInfo,
    GetMeetings,
    GetRecordings,
    PublishRecordings,
    DeleteRecordings,
    UpdateRecordings,
    GetRecordingTextTracks,
    PutRecordingTextTrack,
    InsertDocument,
    HooksCreate,
    HooksList,
    HooksDestroy,
    SendChatMessage,
}

impl ApiMethod {
    pub const ALL: [ApiMethod; 18] = [
        Self::Version,
        Self::Create,
        Self::Join,
        Self::End,
        Self::IsMeetingRunning,
        Self::GetMeetingInfo,
        Self::GetMeetings,
        Self::GetRecordings,
        Self::PublishRecordings,
        Self::DeleteRecordings,
        Self::UpdateRecordings,
        Self::GetRecordingTextTracks,
        Self::PutRecordingTextTrack,
        Self::InsertDocument,
        Self::HooksCreate,
        Self::HooksList,
        Self::HooksDestroy,
        Self::SendChatMessage,
    ];

    /// Returns the method name as it appears in the URL path and checksum.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Version => "",
            Self::Create => "create",
            Self::Join => "join",
            Self::End => "end",
            Self::IsMeetingRunning => "isMeetingRunning",
            Self::GetMeetingInfo => "getMeetingInfo",
            Self::GetMeetings => "getMeetings",
            Self::GetRecordings => "getRecordings",
            Self::PublishRecordings => "publishRecordings",
            Self::DeleteRecordings => "deleteRecordings",
            Self::UpdateRecordings => "updateRecordings",
            Self::GetRecordingTextTracks => "getRecordingTextTracks",
            Self::PutRecordingTextTrack => "putRecordingTextTrack",
            Self::InsertDocument => "insertDocument",
            Self::HooksCreate => "hooks/create",
            Self::HooksList => "hooks/list",
            Self::HooksDestroy => "hooks/destroy",
            Self::SendChatMessage => "sendChatMessage",
        }
    }

    pub fn response_format(&self) -> ResponseFormat {
        match self {
            Self::GetRecordingTextTracks | Self::PutRecordingTextTrack => ResponseFormat::Json,
            _ => ResponseFormat::Xml,
        }
    }

    /// Returns true if the URL carries a signed query string.
    pub fn is_signed(&self) -> bool {
        !matches!(self, Self::Version)
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version => f.write_str("version"),
            _ => f.write_str(self.as_str()),
        }
    }
}
