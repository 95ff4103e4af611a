//! Unified error handling architecture for pairsync.
//!
//! - **Error Categories**: High-level classification for handling decisions
//! - **Domain-specific Errors**: Channel, Payload and Localization errors
//! - **Unified Error Type**: `SyncError` consolidates all error types
//! - **Error Context**: Session and family information attached to errors
//! - **Result Type Alias**: `SyncResult<T>` for consistent return types
//!
//! # Error Categories
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Channel connect/send/disconnect | Yes |
//! | Server | Upstream payload errors | Yes |
//! | Client | Undecodable frames, bad catalogs | No |
//! | Configuration | Missing user id, unknown family | No |
//! | System | Catalog files unreadable | No |
//!
//! None of these errors may leave the in-flight guard held, a poll timer
//! running after teardown, or two countdowns on one slot.

mod category;
mod channel;
mod context;
mod localization;
mod payload;
mod result;
mod sync_error;

pub use category::ErrorCategory;
pub use channel::ChannelError;
pub use context::ErrorContext;
pub use localization::LocalizationError;
pub use payload::PayloadError;
pub use result::{ResultExt, SyncResult};
pub use sync_error::SyncError;
