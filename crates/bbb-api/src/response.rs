//! Parsed API responses.
//!
//! XML responses look like
//!
//! ```xml
//! <response>
//!   <returncode>SUCCESS</returncode>
//!   <messageKey>duplicateWarning</messageKey>
//!   <message>This conference was already in existence.</message>
//!   ...
//! </response>
//! ```
//!
//! and JSON responses carry the same fields under a top-level `response`
//! object. Only the direct children of the response element are exposed as
//! fields; nested documents stay available through [`ApiResponse::raw_body`].

use std::fmt;

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Deserialize;
use serde_json::{Map, Value};

use bbb_core::{BbbError, BbbResult};

use crate::api::ResponseFormat;

/// Value of the `returncode` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnCode {
    Success,
    Failed,
    /// Any other value, including a missing field (empty string).
    Unknown(String),
}

impl ReturnCode {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            v if v.eq_ignore_ascii_case("SUCCESS") => Self::Success,
            v if v.eq_ignore_ascii_case("FAILED") => Self::Failed,
            v => Self::Unknown(v.to_string()),
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("SUCCESS"),
            Self::Failed => f.write_str("FAILED"),
            Self::Unknown(value) => f.write_str(value),
        }
    }
}

/// A response body parsed in the format of its API method.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    format: ResponseFormat,
    raw_body: String,
    session_id: Option<String>,
    fields: Vec<(String, String)>,
}

impl ApiResponse {
    /// Parses `body` as `format`.
    ///
    /// # Errors
    ///
    /// Returns a parsing error for malformed XML, a document without a root
    /// element, or JSON without a `response` object.
    pub fn parse(
        format: ResponseFormat,
        body: impl Into<String>,
        session_id: Option<String>,
    ) -> BbbResult<Self> {
        let raw_body = body.into();
        let fields = match format {
            ResponseFormat::Xml => parse_xml_fields(&raw_body)?,
            ResponseFormat::Json => parse_json_fields(&raw_body)?,
        };
        Ok(Self {
            format,
            raw_body,
            session_id,
            fields,
        })
    }

    pub fn returncode(&self) -> ReturnCode {
        ReturnCode::parse(self.field("returncode").unwrap_or_default())
    }

    pub fn is_success(&self) -> bool {
        self.returncode() == ReturnCode::Success
    }

    /// Returns `messageKey`, accepting the lowercase spelling some servers send.
    pub fn message_key(&self) -> Option<&str> {
        self.field("messageKey").or_else(|| self.field("messagekey"))
    }

    pub fn message(&self) -> Option<&str> {
        self.field("message")
    }

    /// Returns the text of the first top-level field named `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every top-level field in document order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn raw_body(&self) -> &str {
        &self.raw_body
    }

    /// Session id returned alongside this response, if any.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }
}

fn parse_xml_fields(xml: &str) -> BbbResult<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut fields: Vec<(String, String)> = Vec::new();
    let mut has_root = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if depth == 0 {
                    has_root = true;
                } else if depth == 1 {
                    fields.push((element_name(e.local_name().as_ref()), String::new()));
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                if depth == 0 {
                    has_root = true;
                } else if depth == 1 {
                    fields.push((element_name(e.local_name().as_ref()), String::new()));
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(e)) if depth == 2 => {
                let text = e.unescape().map_err(|err| {
                    BbbError::parsing(format!("invalid XML text: {}", err)).with_source(err)
                })?;
                if let Some((_, value)) = fields.last_mut() {
                    value.push_str(&text);
                }
            }
            Ok(Event::CData(e)) if depth == 2 => {
                if let Some((_, value)) = fields.last_mut() {
                    value.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(BbbError::parsing(format!(
                    "malformed XML at position {}: {}",
                    reader.error_position(),
                    e
                ))
                .with_source(e));
            }
            _ => {}
        }
    }

    if !has_root {
        return Err(BbbError::parsing("XML response has no root element"));
    }
    if depth != 0 {
        return Err(BbbError::parsing("XML response ends inside an element"));
    }
    Ok(fields)
}

fn element_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

#[derive(Deserialize)]
struct JsonEnvelope {
    response: Map<String, Value>,
}

fn parse_json_fields(json: &str) -> BbbResult<Vec<(String, String)>> {
    let envelope: JsonEnvelope = serde_json::from_str(json).map_err(|e| {
        BbbError::parsing(format!("invalid JSON response: {}", e)).with_source(e)
    })?;

    Ok(envelope
        .response
        .into_iter()
        .map(|(name, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (name, text)
        })
        .collect())
}
