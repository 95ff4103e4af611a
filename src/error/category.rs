//! Error category classification for unified error handling.
//!
//! This module provides a high-level categorization of errors to enable
//! consistent handling, recovery strategies, and operator messaging.

use std::fmt;

/// High-level categorization of errors for handling decisions.
///
/// Categories enable consistent:
/// - Retry policies (transient vs. permanent errors)
/// - Operator messaging (what went wrong and where)
/// - Recovery strategies (skip the update, tear down, or abort startup)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Channel-related errors (connection, send, disconnect).
    /// Generally transient and retryable.
    Network,

    /// The remote peer sent something unusable (upstream error field,
    /// missing side of the pair). The next poll usually recovers.
    Server,

    /// Local programming or wiring errors (bad frame, unsupported language).
    /// Not retryable.
    Client,

    /// Configuration errors (missing user id, unknown family, bad catalog path).
    /// Not retryable until configuration is corrected.
    Configuration,

    /// System/OS errors (filesystem, runtime).
    System,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient
    /// and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::System => "system",
        }
    }

    /// Returns a human-readable description of the category.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Channel connectivity issue",
            ErrorCategory::Server => "Upstream data issue",
            ErrorCategory::Client => "Application error",
            ErrorCategory::Configuration => "Configuration problem",
            ErrorCategory::System => "System error",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check that the rotation server is reachable",
            ErrorCategory::Server => "The next update usually recovers; check the server logs if it persists",
            ErrorCategory::Client => "This may be a bug. Please report this issue if it persists",
            ErrorCategory::Configuration => "Check PAIRSYNC_* environment variables and command-line flags",
            ErrorCategory::System => "Check file permissions and catalog locations",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
