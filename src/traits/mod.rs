//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`DuplexChannel`] - Event channel to the rotation server
//! - [`Localizer`] - Symbolic key to localized text
//! - [`SecretSlot`] - Host slot showing one side of a secret pair
//! - [`CountdownSurface`] - Host countdown visuals
//! - [`LocalizedDocument`] - Host labels tagged with symbolic keys

pub mod channel;
pub mod display;
pub mod localizer;

pub use channel::{DuplexChannel, Subscription};
pub use display::{CountdownSurface, LocalizedDocument, SecretSlot};
pub use localizer::Localizer;
