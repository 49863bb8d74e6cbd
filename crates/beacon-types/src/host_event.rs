//! Events flowing from the embedded experience back toward the host
//! application.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event types the embedded experience can raise toward the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostEventType {
    /// The user interacted with the experience.
    #[serde(rename = "USERACTIVITY")]
    UserActivity,
    /// A transfer was successfully submitted.
    #[serde(rename = "TRANSFER_SUBMITTED")]
    TransferSubmitted,
    /// The experience surfaced an error to the user.
    #[serde(rename = "ERROR")]
    Error,
    /// The experience was launched.
    #[serde(rename = "LAUNCH")]
    Launch,
    /// The experience was closed by the user.
    #[serde(rename = "CLOSE")]
    Close,
}

impl HostEventType {
    /// Returns the canonical wire string for this event type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserActivity => "USERACTIVITY",
            Self::TransferSubmitted => "TRANSFER_SUBMITTED",
            Self::Error => "ERROR",
            Self::Launch => "LAUNCH",
            Self::Close => "CLOSE",
        }
    }
}

impl std::fmt::Display for HostEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HostEventType {
    type Err = ParseHostEventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Wire strings arrive in mixed case from some experience versions.
        match s.to_ascii_uppercase().as_str() {
            "USERACTIVITY" => Ok(Self::UserActivity),
            "TRANSFER_SUBMITTED" => Ok(Self::TransferSubmitted),
            "ERROR" => Ok(Self::Error),
            "LAUNCH" => Ok(Self::Launch),
            "CLOSE" => Ok(Self::Close),
            _ => Err(ParseHostEventTypeError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown host event type string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized host event type: {0}")]
pub struct ParseHostEventTypeError(pub String);

/// A parsed host-bound event, ready for hook dispatch.
#[derive(Debug, Clone)]
pub struct HostEvent {
    /// The event type.
    pub event_type: HostEventType,
    /// Free-form payload attached by the experience.
    pub data: Map<String, Value>,
}

impl HostEvent {
    /// Creates a host event with an empty payload.
    pub fn new(event_type: HostEventType) -> Self {
        Self {
            event_type,
            data: Map::new(),
        }
    }

    /// Creates a host event carrying a payload.
    pub fn with_data(event_type: HostEventType, data: Map<String, Value>) -> Self {
        Self { event_type, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_event_type_round_trip() {
        for event_type in [
            HostEventType::UserActivity,
            HostEventType::TransferSubmitted,
            HostEventType::Error,
            HostEventType::Launch,
            HostEventType::Close,
        ] {
            let s = event_type.as_str();
            let restored: HostEventType = s.parse().expect("should parse wire string");
            assert_eq!(restored, event_type);
        }
    }

    #[test]
    fn host_event_type_parse_is_case_insensitive() {
        let parsed: HostEventType = "userActivity".parse().expect("mixed case should parse");
        assert_eq!(parsed, HostEventType::UserActivity);
    }

    #[test]
    fn host_event_type_from_invalid() {
        assert!("NAVIGATE".parse::<HostEventType>().is_err());
        assert!("".parse::<HostEventType>().is_err());
    }

    #[test]
    fn host_event_type_display() {
        assert_eq!(HostEventType::TransferSubmitted.to_string(), "TRANSFER_SUBMITTED");
        assert_eq!(HostEventType::Close.to_string(), "CLOSE");
    }
}
