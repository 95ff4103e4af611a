//! Mock duplex channel for testing.
//!
//! Provides a channel that allows event injection, captures emitted
//! events, and lets tests drive the connection state.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};

use crate::channel::{ChannelState, InboundEvent, OutboundEvent};
use crate::error::ChannelError;
use crate::models::{RotationPayload, SecretFamily};
use crate::traits::{DuplexChannel, Subscription};

/// Mock duplex channel for testing.
///
/// This mock allows:
/// - Injecting server events
/// - Capturing emitted events
/// - Driving the connection state (disconnect, reconnect)
/// - Counting live subscriptions and state watchers
///
/// # Example
///
/// ```ignore
/// use pairsync::adapters::mock::MockChannel;
///
/// let channel = MockChannel::new();
/// let mut updates = channel.on("update_passwords");
///
/// channel.inject("update_passwords", json!({ "error": "upstream_failure" }));
/// assert!(updates.recv().await.is_some());
///
/// channel.simulate_disconnect();
/// ```
pub struct MockChannel {
    /// Broadcast sender for injected events
    incoming_tx: broadcast::Sender<InboundEvent>,
    /// Watch sender for connection state
    state_tx: watch::Sender<ChannelState>,
    /// Captured outgoing events
    emitted: Arc<Mutex<Vec<OutboundEvent>>>,
    /// Whether emit should fail
    emit_should_fail: AtomicBool,
}

impl MockChannel {
    /// Create a new mock channel in connected state.
    pub fn new() -> Self {
        Self::with_state(ChannelState::Connected)
    }

    /// Create a new mock channel in disconnected state.
    pub fn disconnected() -> Self {
        Self::with_state(ChannelState::Disconnected)
    }

    fn with_state(state: ChannelState) -> Self {
        let (incoming_tx, _) = broadcast::channel(100);
        let (state_tx, _) = watch::channel(state);

        Self {
            incoming_tx,
            state_tx,
            emitted: Arc::new(Mutex::new(Vec::new())),
            emit_should_fail: AtomicBool::new(false),
        }
    }

    /// Inject a server event. Returns how many subscriptions can see it.
    pub fn inject(&self, event: &str, data: Value) -> usize {
        self.incoming_tx
            .send(InboundEvent::new(event, data))
            .unwrap_or(0)
    }

    /// Inject a decoded payload on its family's push event.
    pub fn inject_payload(&self, family: SecretFamily, payload: &RotationPayload) -> usize {
        self.inject(family.update_event(), payload.to_wire(family))
    }

    /// All events emitted so far.
    pub async fn emitted(&self) -> Vec<OutboundEvent> {
        self.emitted.lock().await.clone()
    }

    /// Number of events emitted so far.
    pub async fn emitted_count(&self) -> usize {
        self.emitted.lock().await.len()
    }

    /// Clear captured events.
    pub async fn clear(&self) {
        self.emitted.lock().await.clear();
    }

    /// Make every following emit fail.
    pub fn set_emit_should_fail(&self, should_fail: bool) {
        self.emit_should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Simulate the connection dropping.
    pub fn simulate_disconnect(&self) {
        self.state_tx.send_replace(ChannelState::Disconnected);
    }

    /// Simulate a reconnection attempt in progress.
    pub fn simulate_reconnecting(&self, attempt: u8) {
        self.state_tx
            .send_replace(ChannelState::Reconnecting { attempt });
    }

    /// Simulate the connection coming back.
    pub fn simulate_reconnected(&self) {
        self.state_tx.send_replace(ChannelState::Connected);
    }

    /// Number of live subscriptions across all events.
    pub fn subscriber_count(&self) -> usize {
        self.incoming_tx.receiver_count()
    }

    /// Number of live connection state receivers.
    pub fn state_watcher_count(&self) -> usize {
        self.state_tx.receiver_count()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DuplexChannel for MockChannel {
    async fn emit(&self, event: OutboundEvent) -> Result<(), ChannelError> {
        if self.emit_should_fail.load(Ordering::SeqCst) {
            return Err(ChannelError::SendFailed {
                event: event.name().to_string(),
                message: "mock emit failure".to_string(),
            });
        }
        if !self.state_tx.borrow().is_connected() {
            return Err(ChannelError::Disconnected);
        }
        self.emitted.lock().await.push(event);
        Ok(())
    }

    fn on(&self, event: &str) -> Subscription {
        Subscription::new(event, self.incoming_tx.subscribe())
    }

    fn state(&self) -> watch::Receiver<ChannelState> {
        self.state_tx.subscribe()
    }

    fn shutdown(&self) {
        self.simulate_disconnect();
    }
}
