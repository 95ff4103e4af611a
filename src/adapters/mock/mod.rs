//! Mock implementations for testing.
//!
//! This module provides mock implementations of the channel and
//! localization traits, enabling tests without a server or catalog files.
//!
//! # Available Mocks
//!
//! - [`MockChannel`] - Duplex channel with event injection and state control
//! - [`StubLocalizer`] - Localizer backed by an in-memory map

pub mod channel;
pub mod localizer;

pub use channel::MockChannel;
pub use localizer::StubLocalizer;
