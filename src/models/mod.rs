//! Data models exchanged with the rotation server.

pub mod payload;

pub use payload::{RotationPayload, SecretFamily, SecretSide};
