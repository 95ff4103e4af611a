//! pairsync - keeps rotating client/advisor secret pairs in sync with a
//! rotation server, with a countdown of each secret's remaining validity.
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod channel;
pub mod cli;
pub mod config;
pub mod countdown;
pub mod display;
pub mod error;
pub mod localization;
pub mod models;
pub mod sync;
pub mod traits;
