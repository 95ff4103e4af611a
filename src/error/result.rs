//! Result type alias for pairsync operations.

use super::context::ErrorContext;
use super::sync_error::SyncError;

/// Type alias for Results using SyncError.
pub type SyncResult<T> = Result<T, SyncError>;

/// Extension trait for Result types to add context to errors.
pub trait ResultExt<T> {
    /// Add context to an error if the result is Err.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use pairsync::error::{ErrorContext, ResultExt};
    ///
    /// let gateway = LocalizationGateway::initialize(&source, None)
    ///     .await
    ///     .context(ErrorContext::new("initialize_localization"))?;
    /// ```
    fn context(self, ctx: ErrorContext) -> SyncResult<T>;

    /// Add context using a closure (only called on error).
    fn with_context<F>(self, f: F) -> SyncResult<T>
    where
        F: FnOnce() -> ErrorContext;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<SyncError>,
{
    fn context(self, ctx: ErrorContext) -> SyncResult<T> {
        self.map_err(|e| e.into().with_context(ctx))
    }

    fn with_context<F>(self, f: F) -> SyncResult<T>
    where
        F: FnOnce() -> ErrorContext,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
