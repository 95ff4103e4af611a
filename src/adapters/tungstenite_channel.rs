//! Tungstenite-based duplex channel adapter.
//!
//! Wraps [`ChannelClient`] and fans its incoming events out to any number
//! of named subscriptions.

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::channel::{ChannelClient, ChannelClientConfig, ChannelFrame, ChannelState, InboundEvent, OutboundEvent};
use crate::error::ChannelError;
use crate::traits::{DuplexChannel, Subscription};

/// Capacity of the per-subscriber event buffer.
const EVENT_BUFFER: usize = 64;

/// Duplex channel over a tokio-tungstenite WebSocket.
///
/// # Example
///
/// ```ignore
/// use pairsync::adapters::TungsteniteChannel;
/// use pairsync::channel::ChannelClientConfig;
///
/// let channel = TungsteniteChannel::connect(ChannelClientConfig::default()).await?;
/// let mut updates = channel.on("update_passwords");
/// ```
pub struct TungsteniteChannel {
    /// Outgoing frames, consumed by the connection loop
    sender: mpsc::Sender<ChannelFrame>,
    /// Fan-out of incoming events
    events: broadcast::Sender<InboundEvent>,
    /// Connection state published by the connection loop
    state_rx: watch::Receiver<ChannelState>,
    /// Stops the connection loop
    shutdown_tx: watch::Sender<bool>,
    /// Task forwarding client events into `events`
    forward: JoinHandle<()>,
}

impl TungsteniteChannel {
    /// Connect to the rotation server.
    pub async fn connect(config: ChannelClientConfig) -> Result<Self, ChannelError> {
        let mut client = ChannelClient::connect(config).await?;

        let sender = client.sender();
        let state_rx = client.state_receiver();
        let shutdown_tx = client.shutdown_handle();

        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let events_for_task = events.clone();

        let forward = tokio::spawn(async move {
            while let Some(event) = client.recv().await {
                // No subscriber for this event is not an error.
                let _ = events_for_task.send(event);
            }
            debug!("Channel client stream ended");
        });

        Ok(Self {
            sender,
            events,
            state_rx,
            shutdown_tx,
            forward,
        })
    }
}

#[async_trait]
impl DuplexChannel for TungsteniteChannel {
    async fn emit(&self, event: OutboundEvent) -> Result<(), ChannelError> {
        if !self.state_rx.borrow().is_connected() {
            return Err(ChannelError::Disconnected);
        }

        let frame = event.to_frame().map_err(|e| ChannelError::SendFailed {
            event: event.name().to_string(),
            message: e.to_string(),
        })?;

        self.sender
            .send(frame)
            .await
            .map_err(|e| ChannelError::SendFailed {
                event: event.name().to_string(),
                message: e.to_string(),
            })
    }

    fn on(&self, event: &str) -> Subscription {
        Subscription::new(event, self.events.subscribe())
    }

    fn state(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for TungsteniteChannel {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        self.forward.abort();
    }
}
