//! Unified error type for pairsync.
//!
//! `SyncError` consolidates the domain errors so callers at the edges
//! (the binary, the reconnect supervisor) can categorize and log them
//! uniformly.

use std::fmt;

use super::category::ErrorCategory;
use super::channel::ChannelError;
use super::context::ErrorContext;
use super::localization::LocalizationError;
use super::payload::PayloadError;

/// Unified error type for pairsync.
#[derive(Debug)]
pub enum SyncError {
    /// Duplex channel errors.
    Channel(ChannelError),

    /// Rejected rotation payloads.
    Payload(PayloadError),

    /// Catalog loading and translation errors.
    Localization(LocalizationError),

    /// Invalid or incomplete configuration.
    Config { message: String },

    /// Wrapped error with additional context.
    WithContext {
        error: Box<SyncError>,
        context: ErrorContext,
    },
}

impl SyncError {
    /// Build a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        SyncError::Config {
            message: message.into(),
        }
    }

    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::Channel(ChannelError::InvalidFrame { .. }) => ErrorCategory::Client,
            SyncError::Channel(_) => ErrorCategory::Network,
            SyncError::Payload(_) => ErrorCategory::Server,
            SyncError::Localization(err) => match err {
                LocalizationError::CatalogRead { .. } => ErrorCategory::System,
                LocalizationError::CatalogFetch { .. } => ErrorCategory::Network,
                LocalizationError::UnsupportedLanguage { .. } => ErrorCategory::Configuration,
                _ => ErrorCategory::Client,
            },
            SyncError::Config { .. } => ErrorCategory::Configuration,
            SyncError::WithContext { error, .. } => error.category(),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Channel(err) => err.is_retryable(),
            SyncError::Payload(_) => true,
            SyncError::Localization(LocalizationError::CatalogFetch { .. }) => true,
            SyncError::Localization(_) => false,
            SyncError::Config { .. } => false,
            SyncError::WithContext { error, .. } => error.is_retryable(),
        }
    }

    /// Get an operator-facing error message.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Channel(err) => err.user_message(),
            SyncError::Payload(err) => err.user_message(),
            SyncError::Localization(err) => err.user_message(),
            SyncError::Config { message } => format!("Invalid configuration: {}", message),
            SyncError::WithContext { error, context } => {
                format!("{}\n\nContext: {}", error.user_message(), context)
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::Channel(err) => err.error_code(),
            SyncError::Payload(err) => err.error_code(),
            SyncError::Localization(err) => err.error_code(),
            SyncError::Config { .. } => "E_CONFIG",
            SyncError::WithContext { error, .. } => error.error_code(),
        }
    }

    /// Attach context to this error.
    pub fn with_context(self, ctx: ErrorContext) -> Self {
        SyncError::WithContext {
            error: Box::new(self),
            context: ctx,
        }
    }

    /// Get the context if this error has one attached.
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            SyncError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Get the inner error without context.
    pub fn inner(&self) -> &SyncError {
        match self {
            SyncError::WithContext { error, .. } => error.inner(),
            _ => self,
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Channel(err) => write!(f, "{}", err),
            SyncError::Payload(err) => write!(f, "{}", err),
            SyncError::Localization(err) => write!(f, "{}", err),
            SyncError::Config { message } => write!(f, "Configuration error: {}", message),
            SyncError::WithContext { error, context } => write!(f, "{} ({})", error, context),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Channel(err) => Some(err),
            SyncError::Payload(err) => Some(err),
            SyncError::Localization(err) => Some(err),
            SyncError::Config { .. } => None,
            SyncError::WithContext { error, .. } => error.source(),
        }
    }
}

impl From<ChannelError> for SyncError {
    fn from(err: ChannelError) -> Self {
        SyncError::Channel(err)
    }
}

impl From<PayloadError> for SyncError {
    fn from(err: PayloadError) -> Self {
        SyncError::Payload(err)
    }
}

impl From<LocalizationError> for SyncError {
    fn from(err: LocalizationError) -> Self {
        SyncError::Localization(err)
    }
}
