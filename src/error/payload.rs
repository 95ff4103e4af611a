//! Rotation payload error types.
//!
//! A payload is either applied whole or rejected whole. Every variant here
//! is recovered locally: the update is skipped and the next poll brings a
//! fresh snapshot.

use std::fmt;

/// Reasons a rotation payload is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadError {
    /// The payload was not a JSON object.
    NotAnObject,

    /// The server set the `error` field (e.g. "Unselected client").
    Upstream { message: String },

    /// One side of the pair is absent or not an object.
    MissingSide { side: &'static str },

    /// A field inside a side has the wrong type or is absent.
    MalformedField {
        side: &'static str,
        field: &'static str,
        message: String,
    },
}

impl PayloadError {
    /// Get an operator-facing error message.
    pub fn user_message(&self) -> String {
        match self {
            PayloadError::NotAnObject => "Rotation update was not a JSON object.".to_string(),
            PayloadError::Upstream { message } => {
                format!("The rotation server reported an error: {}", message)
            }
            PayloadError::MissingSide { side } => {
                format!("Rotation update is missing the '{}' side.", side)
            }
            PayloadError::MalformedField { side, field, .. } => {
                format!("Rotation update has an invalid '{}.{}' field.", side, field)
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            PayloadError::NotAnObject => "E_PAYLOAD_SHAPE",
            PayloadError::Upstream { .. } => "E_PAYLOAD_UPSTREAM",
            PayloadError::MissingSide { .. } => "E_PAYLOAD_SIDE",
            PayloadError::MalformedField { .. } => "E_PAYLOAD_FIELD",
        }
    }

    /// Whether the server flagged this payload itself.
    pub fn is_upstream(&self) -> bool {
        matches!(self, PayloadError::Upstream { .. })
    }
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::NotAnObject => write!(f, "Payload is not an object"),
            PayloadError::Upstream { message } => write!(f, "Upstream error: {}", message),
            PayloadError::MissingSide { side } => write!(f, "Missing side: {}", side),
            PayloadError::MalformedField {
                side,
                field,
                message,
            } => write!(f, "Malformed field {}.{}: {}", side, field, message),
        }
    }
}

impl std::error::Error for PayloadError {}
