//! Duplex channel trait abstraction.
//!
//! Controllers depend only on the ability to emit an event, subscribe to a
//! named event, and watch for disconnects. Subscriptions are handles:
//! dropping one unsubscribes, so releasing a session's resources is just
//! dropping what it owns.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tracing::warn;

use crate::channel::{ChannelState, InboundEvent, OutboundEvent};
use crate::error::ChannelError;

/// Subscription to one named server event.
///
/// Dropping the subscription is the equivalent of `off(event, handler)`.
#[derive(Debug)]
pub struct Subscription {
    event: String,
    rx: broadcast::Receiver<InboundEvent>,
}

impl Subscription {
    /// Wrap a receiver of all inbound events, filtering on `event`.
    pub fn new(event: impl Into<String>, rx: broadcast::Receiver<InboundEvent>) -> Self {
        Self {
            event: event.into(),
            rx,
        }
    }

    /// Name of the subscribed event.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Wait for the next payload of the subscribed event.
    ///
    /// Returns `None` once the channel has been dropped. If this receiver
    /// lagged, the skipped snapshots are lost; only later ones are delivered.
    pub async fn recv(&mut self) -> Option<Value> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.name == self.event => return Some(event.data),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(event = %self.event, skipped, "Subscription lagged, snapshots skipped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Trait for duplex event channel operations.
///
/// # Example
///
/// ```ignore
/// use pairsync::traits::DuplexChannel;
/// use pairsync::channel::{OutboundEvent, RequestUpdate};
///
/// async fn pull<C: DuplexChannel>(channel: &C) -> Result<(), ChannelError> {
///     let mut updates = channel.on("update_passwords");
///     channel
///         .emit(OutboundEvent::RequestUpdate(RequestUpdate::new("42")))
///         .await?;
///     let payload = updates.recv().await;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait DuplexChannel: Send + Sync {
    /// Send an event to the server.
    async fn emit(&self, event: OutboundEvent) -> Result<(), ChannelError>;

    /// Subscribe to a named server event.
    fn on(&self, event: &str) -> Subscription;

    /// Get a receiver for connection state changes.
    ///
    /// Any transition away from `Connected` is the channel's disconnect
    /// event. Dropping the receiver unsubscribes from it.
    fn state(&self) -> watch::Receiver<ChannelState>;

    /// Gracefully shutdown the channel.
    fn shutdown(&self);
}
