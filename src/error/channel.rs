//! Duplex channel error types.
//!
//! This module defines errors that occur while talking to the rotation
//! server over the duplex event channel: connecting, emitting requests,
//! and decoding frames.

use std::fmt;

/// Channel-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// Connection to the server failed.
    ConnectionFailed { url: String, message: String },

    /// The channel is not connected (or was shut down).
    Disconnected,

    /// An outbound event could not be sent.
    SendFailed { event: String, message: String },

    /// An inbound frame could not be decoded.
    InvalidFrame { message: String },
}

impl ChannelError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChannelError::ConnectionFailed { .. } => true,
            ChannelError::Disconnected => true,
            ChannelError::SendFailed { .. } => true,
            ChannelError::InvalidFrame { .. } => false,
        }
    }

    /// Get an operator-facing error message.
    pub fn user_message(&self) -> String {
        match self {
            ChannelError::ConnectionFailed { url, .. } => {
                format!("Unable to reach the rotation server at {}.", url)
            }
            ChannelError::Disconnected => "The channel to the rotation server is closed.".to_string(),
            ChannelError::SendFailed { event, .. } => {
                format!("Could not send '{}' to the rotation server.", event)
            }
            ChannelError::InvalidFrame { .. } => {
                "Received a frame the client could not understand.".to_string()
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ChannelError::ConnectionFailed { .. } => "E_CHAN_CONN",
            ChannelError::Disconnected => "E_CHAN_CLOSED",
            ChannelError::SendFailed { .. } => "E_CHAN_SEND",
            ChannelError::InvalidFrame { .. } => "E_CHAN_FRAME",
        }
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::ConnectionFailed { url, message } => {
                write!(f, "Connection to {} failed: {}", url, message)
            }
            ChannelError::Disconnected => write!(f, "Disconnected from server"),
            ChannelError::SendFailed { event, message } => {
                write!(f, "Send of '{}' failed: {}", event, message)
            }
            ChannelError::InvalidFrame { message } => write!(f, "Invalid frame: {}", message),
        }
    }
}

impl std::error::Error for ChannelError {}
