//! Reconnect supervision.
//!
//! A disconnect tears a session down for good. The supervisor plays the
//! host's part of the reconnect cycle: whenever the channel is connected
//! and the controller is not subscribed, it activates the controller again.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::controller::{ControllerState, SyncController};
use crate::traits::DuplexChannel;

/// Keep `controller` subscribed on `channel` until `shutdown` fires (or its
/// sender is dropped), then tear the current session down.
pub async fn supervise(
    controller: Arc<SyncController>,
    channel: Arc<dyn DuplexChannel>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut channel_state = channel.state();
    let mut controller_state = controller.state_receiver();

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        let connected = channel_state.borrow_and_update().is_connected();
        let subscribed = *controller_state.borrow_and_update() == ControllerState::Subscribed;

        if connected && !subscribed {
            if let Err(e) = controller.activate(Arc::clone(&channel)).await {
                warn!(
                    family = %controller.family(),
                    error_code = e.error_code(),
                    "Activation failed: {}",
                    e
                );
            }
        }

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = channel_state.changed() => {
                if changed.is_err() {
                    info!(family = %controller.family(), "Channel closed, stopping supervision");
                    break;
                }
            }
            changed = controller_state.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    controller.teardown().await;
    info!(family = %controller.family(), "Supervision stopped");
}
