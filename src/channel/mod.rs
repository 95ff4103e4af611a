//! Duplex event channel to the rotation server.
//!
//! The server pushes rotation snapshots as named events and answers
//! `request_update` pulls. This module provides the wire framing and a
//! WebSocket client with automatic reconnection; controllers only ever see
//! it through [`crate::traits::DuplexChannel`].

pub mod client;
pub mod messages;

pub use client::{ChannelClient, ChannelClientConfig, ChannelState};
pub use messages::{
    ChannelFrame, InboundEvent, OutboundEvent, RequestUpdate, REQUEST_UPDATE_EVENT,
    UPDATE_PASSKEYS_EVENT, UPDATE_PASSWORDS_EVENT,
};
