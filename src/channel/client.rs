use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::messages::{ChannelFrame, InboundEvent};
use crate::error::ChannelError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Duplex channel connection state
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelState {
    Connected,
    Reconnecting { attempt: u8 },
    Disconnected,
}

impl ChannelState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ChannelState::Connected)
    }
}

/// Configuration for the channel client
#[derive(Debug, Clone)]
pub struct ChannelClientConfig {
    /// Full WebSocket URL, e.g. `ws://127.0.0.1:5000/ws`
    pub url: String,
    pub max_retries: u8,
    pub max_backoff_secs: u64,
}

impl Default for ChannelClientConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:5000/ws".to_string(),
            max_retries: 5,
            max_backoff_secs: 30,
        }
    }
}

/// WebSocket client speaking the `{event, data}` framing
pub struct ChannelClient {
    /// Frames to send to the server
    outgoing_tx: mpsc::Sender<ChannelFrame>,
    /// Events received from the server
    incoming_rx: mpsc::Receiver<InboundEvent>,
    /// Watch receiver for connection state changes
    state_rx: watch::Receiver<ChannelState>,
    /// Set to true to stop the connection loop
    shutdown_tx: watch::Sender<bool>,
}

impl ChannelClient {
    /// Connect to the server.
    ///
    /// Returns a ChannelClient on success, or ChannelError if the initial
    /// connection fails. Later drops are retried with exponential backoff.
    pub async fn connect(config: ChannelClientConfig) -> Result<Self, ChannelError> {
        let (ws_stream, _) =
            connect_async(config.url.as_str())
                .await
                .map_err(|e| ChannelError::ConnectionFailed {
                    url: config.url.clone(),
                    message: e.to_string(),
                })?;

        info!("Connected to rotation server at {}", config.url);

        let (ws_sink, ws_source) = ws_stream.split();

        let (incoming_tx, incoming_rx) = mpsc::channel::<InboundEvent>(100);
        let (outgoing_tx, outgoing_rx) = mpsc::channel::<ChannelFrame>(100);
        let (state_tx, state_rx) = watch::channel(ChannelState::Connected);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(run_connection_loop(
            config,
            ws_sink,
            ws_source,
            incoming_tx,
            outgoing_rx,
            state_tx,
            shutdown_rx,
        ));

        Ok(Self {
            outgoing_tx,
            incoming_rx,
            state_rx,
            shutdown_tx,
        })
    }

    /// Check if currently connected
    pub fn is_connected(&self) -> bool {
        self.state_rx.borrow().is_connected()
    }

    /// Subscribe to connection state changes
    pub fn state_receiver(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Sender half for outgoing frames, shareable across tasks
    pub fn sender(&self) -> mpsc::Sender<ChannelFrame> {
        self.outgoing_tx.clone()
    }

    /// Send a frame to the server
    pub async fn send(&self, frame: ChannelFrame) -> Result<(), ChannelError> {
        let event = frame.event.clone();
        self.outgoing_tx
            .send(frame)
            .await
            .map_err(|e| ChannelError::SendFailed {
                event,
                message: e.to_string(),
            })
    }

    /// Receive the next incoming event
    pub async fn recv(&mut self) -> Option<InboundEvent> {
        self.incoming_rx.recv().await
    }

    /// Handle that stops the connection loop when signalled
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    /// Gracefully shutdown the connection
    pub fn shutdown(&self) {
        info!("Shutting down channel client");
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for ChannelClient {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Decode one text frame. Malformed frames are reported, never fatal.
fn decode_frame(text: &str) -> Result<InboundEvent, ChannelError> {
    serde_json::from_str::<ChannelFrame>(text)
        .map(InboundEvent::from)
        .map_err(|e| ChannelError::InvalidFrame {
            message: e.to_string(),
        })
}

/// Run the main connection loop with reconnection logic
async fn run_connection_loop(
    config: ChannelClientConfig,
    mut ws_sink: WsSink,
    mut ws_source: WsSource,
    incoming_tx: mpsc::Sender<InboundEvent>,
    mut outgoing_rx: mpsc::Receiver<ChannelFrame>,
    state_tx: watch::Sender<ChannelState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        let dropped = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!("Shutdown signal received, closing connection");
                    let _ = ws_sink.close().await;
                    break;
                }
                false
            }
            msg = ws_source.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match decode_frame(&text) {
                            Ok(event) => {
                                debug!(event = %event.name, "Received frame");
                                if incoming_tx.send(event).await.is_err() {
                                    warn!("Incoming channel closed, shutting down");
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("{} - {}", e, text);
                            }
                        }
                        false
                    }
                    Some(Ok(Message::Ping(data))) => {
                        debug!("Received ping, sending pong");
                        let _ = ws_sink.send(Message::Pong(data)).await;
                        false
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Received close frame from server");
                        true
                    }
                    Some(Ok(_)) => false,
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        true
                    }
                    None => {
                        info!("WebSocket stream ended");
                        true
                    }
                }
            }
            frame = outgoing_rx.recv() => {
                match frame {
                    Some(frame) => {
                        match serde_json::to_string(&frame) {
                            Ok(json) => {
                                debug!(event = %frame.event, "Sending frame");
                                if let Err(e) = ws_sink.send(Message::Text(json)).await {
                                    error!("Failed to send frame: {}", e);
                                }
                            }
                            Err(e) => error!("Failed to serialize frame: {}", e),
                        }
                        false
                    }
                    None => {
                        debug!("Outgoing channel closed, shutting down");
                        break;
                    }
                }
            }
        };

        if dropped {
            let _ = state_tx.send(ChannelState::Disconnected);
            match attempt_reconnect(&config, &state_tx, &shutdown_rx).await {
                Some((new_sink, new_source)) => {
                    ws_sink = new_sink;
                    ws_source = new_source;
                    let _ = state_tx.send(ChannelState::Connected);
                }
                None => break,
            }
        }
    }

    info!("Connection loop ended");
    let _ = state_tx.send(ChannelState::Disconnected);
}

/// Backoff before reconnect attempt `attempt` (1-based): 1s, 2s, 4s, ... capped.
pub fn backoff_secs(attempt: u8, max_backoff_secs: u64) -> u64 {
    let exponent = u32::from(attempt.saturating_sub(1)).min(63);
    std::cmp::min(1u64 << exponent, max_backoff_secs)
}

/// Attempt to reconnect with exponential backoff
async fn attempt_reconnect(
    config: &ChannelClientConfig,
    state_tx: &watch::Sender<ChannelState>,
    shutdown_rx: &watch::Receiver<bool>,
) -> Option<(WsSink, WsSource)> {
    for attempt in 1..=config.max_retries {
        if *shutdown_rx.borrow() {
            debug!("Shutdown requested during reconnection");
            return None;
        }

        let _ = state_tx.send(ChannelState::Reconnecting { attempt });

        let wait = backoff_secs(attempt, config.max_backoff_secs);
        info!(
            "Reconnection attempt {} of {}, waiting {}s",
            attempt, config.max_retries, wait
        );

        tokio::time::sleep(Duration::from_secs(wait)).await;

        if *shutdown_rx.borrow() {
            debug!("Shutdown requested during backoff");
            return None;
        }

        match connect_async(config.url.as_str()).await {
            Ok((ws_stream, _)) => {
                info!("Reconnected successfully on attempt {}", attempt);
                return Some(ws_stream.split());
            }
            Err(e) => {
                warn!("Reconnection attempt {} failed: {}", attempt, e);
            }
        }
    }

    error!(
        "Failed to reconnect after {} attempts, giving up",
        config.max_retries
    );
    None
}
