//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`TungsteniteChannel`] - Duplex channel using tokio-tungstenite
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockChannel`] - Event injection and connection state control
//! - [`mock::StubLocalizer`] - Fixed translations

pub mod mock;
pub mod tungstenite_channel;

pub use mock::{MockChannel, StubLocalizer};
pub use tungstenite_channel::TungsteniteChannel;
