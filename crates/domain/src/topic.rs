//! Transport topic shapes.
//!
//! Every device lives under a three-segment group prefix (the *base topic*):
//!
//! | Direction | Topic | Payload |
//! |-----------|-------|---------|
//! | device → hub | `<base>/<device_id>/status` | opaque state string |
//! | hub → device | `<base>/<device_id>/set` | command, e.g. `ON` |
//! | hub → device | `<base>/<device_id>` | literal `GET_STATE` |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;

/// Subtopic on which devices report their state.
pub const STATUS_SUBTOPIC: &str = "status";
/// Subtopic on which devices receive commands.
pub const COMMAND_SUBTOPIC: &str = "set";
/// Payload asking a device to republish its current state.
pub const STATUS_REQUEST_PAYLOAD: &str = "GET_STATE";

const PREFIX_SEGMENTS: usize = 3;
const STATUS_SEGMENTS: usize = PREFIX_SEGMENTS + 2;

/// Why an inbound topic was not routed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopicError {
    #[error("expected {STATUS_SEGMENTS} topic segments, got {0}")]
    Malformed(usize),

    #[error("unexpected subtopic {0:?}")]
    UnexpectedSubtopic(String),

    #[error("base topic must have {PREFIX_SEGMENTS} non-empty segments without wildcards")]
    InvalidBase,
}

/// Extract the device segment from a `<a>/<b>/<c>/<device_id>/status` topic.
///
/// The group prefix itself is not compared against the configured base; the
/// subscription already restricts what the broker delivers.
///
/// # Errors
///
/// [`TopicError::Malformed`] when the segment count is not five,
/// [`TopicError::UnexpectedSubtopic`] when the last segment is not `status`.
pub fn parse_status_topic(topic: &str) -> Result<&str, TopicError> {
    let parts: Vec<&str> = topic.split('/').collect();
    if parts.len() != STATUS_SEGMENTS {
        return Err(TopicError::Malformed(parts.len()));
    }
    let subtopic = parts[STATUS_SEGMENTS - 1];
    if subtopic != STATUS_SUBTOPIC {
        return Err(TopicError::UnexpectedSubtopic(subtopic.to_string()));
    }
    Ok(parts[PREFIX_SEGMENTS])
}

/// Match a topic against a subscription filter using MQTT wildcard rules
/// (`+` matches one segment, a trailing `#` matches the rest).
#[must_use]
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_parts = filter.split('/');
    let mut topic_parts = topic.split('/');
    loop {
        match (filter_parts.next(), topic_parts.next()) {
            (Some("#"), _) => return filter_parts.next().is_none(),
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Validated three-segment group prefix, e.g. `redes2/2303/01`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BaseTopic(String);

impl BaseTopic {
    /// Validate a base topic. A single trailing `/` is tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`TopicError::InvalidBase`] if the prefix does not have three
    /// non-empty segments or contains a wildcard.
    pub fn new(value: impl Into<String>) -> Result<Self, TopicError> {
        let value = value.into();
        let trimmed = value.strip_suffix('/').unwrap_or(&value);
        let parts: Vec<&str> = trimmed.split('/').collect();
        let valid = parts.len() == PREFIX_SEGMENTS
            && parts
                .iter()
                .all(|p| !p.is_empty() && !p.contains(['+', '#']));
        if !valid {
            return Err(TopicError::InvalidBase);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filter matching every device's status topic: `<base>/+/status`.
    #[must_use]
    pub fn status_subscription(&self) -> String {
        format!("{}/+/{STATUS_SUBTOPIC}", self.0)
    }

    /// `<base>/<device_id>/status`
    #[must_use]
    pub fn status_topic(&self, device_id: &DeviceId) -> String {
        format!("{}/{device_id}/{STATUS_SUBTOPIC}", self.0)
    }

    /// `<base>/<device_id>/set`
    #[must_use]
    pub fn command_topic(&self, device_id: &DeviceId) -> String {
        format!("{}/{device_id}/{COMMAND_SUBTOPIC}", self.0)
    }

    /// `<base>/<device_id>`
    #[must_use]
    pub fn status_request_topic(&self, device_id: &DeviceId) -> String {
        format!("{}/{device_id}", self.0)
    }
}

impl fmt::Display for BaseTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BaseTopic {
    type Error = TopicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BaseTopic> for String {
    fn from(base: BaseTopic) -> Self {
        base.0
    }
}
