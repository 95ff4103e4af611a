//! Integration tests for the sync controller lifecycle.
//!
//! Time is paused in every async test: sleeps advance the clock
//! deterministically, and sleeping to half-second offsets keeps the poll
//! ticks and countdown ticks clear of the assertions.

mod common;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::watch;

use common::*;
use pairsync::adapters::mock::MockChannel;
use pairsync::channel::{ChannelState, OutboundEvent};
use pairsync::countdown::CountdownDriver;
use pairsync::display::{SecretDisplayAdapter, SlotBoard, SlotPair};
use pairsync::error::{ChannelError, SyncError};
use pairsync::models::SecretFamily;
use pairsync::sync::{
    supervise, ControllerState, CountdownPolicy, SyncController, UpdateOutcome,
    ADVISOR_COUNTDOWN_KEY, CLIENT_COUNTDOWN_KEY, MIN_POLL_INTERVAL,
};
use pairsync::traits::{DuplexChannel, SecretSlot, Subscription};

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// ============= Activation =============

#[tokio::test(start_paused = true)]
async fn test_activation_requests_an_update_immediately() {
    let rig = SyncRig::new(SecretFamily::Passkeys);

    rig.controller.activate(rig.channel()).await.unwrap();
    settle().await;

    let emitted = rig.mock.emitted().await;
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].name(), "request_update");
    assert_eq!(emitted[0].user_id(), TEST_USER_ID);
    assert_eq!(rig.controller.state(), ControllerState::Subscribed);
    assert_eq!(rig.mock.subscriber_count(), 1);
    assert_eq!(rig.mock.state_watcher_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_activation_on_disconnected_channel_fails_cleanly() {
    let rig = SyncRig::new(SecretFamily::Passwords);
    let mock = Arc::new(MockChannel::disconnected());

    let err = rig.controller.activate(mock.clone()).await.unwrap_err();

    assert!(matches!(
        err.inner(),
        SyncError::Channel(ChannelError::Disconnected)
    ));
    assert_eq!(err.context().map(|c| c.operation.as_str()), Some("activate"));
    assert_eq!(rig.controller.state(), ControllerState::Idle);
    assert_eq!(mock.emitted_count().await, 0);
    assert_eq!(mock.subscriber_count(), 0);
    assert_eq!(mock.state_watcher_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_initial_request_failure_keeps_session_alive() {
    let rig = SyncRig::new(SecretFamily::Passwords);
    rig.mock.set_emit_should_fail(true);

    let handle = rig.controller.activate(rig.channel()).await.unwrap();
    advance(2500).await;

    assert_eq!(rig.controller.state(), ControllerState::Subscribed);
    assert!(!handle.is_torn_down());
    assert_eq!(rig.mock.emitted_count().await, 0);

    // Requests resume on the next tick once the channel accepts them.
    rig.mock.set_emit_should_fail(false);
    advance(1000).await;
    assert_eq!(rig.mock.emitted_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_reactivation_keeps_a_single_subscription() {
    let rig = SyncRig::new(SecretFamily::Passkeys);

    let first = rig.controller.activate(rig.channel()).await.unwrap();
    let second = rig.controller.activate(rig.channel()).await.unwrap();
    settle().await;

    assert!(first.is_torn_down());
    assert!(!second.is_torn_down());
    assert_eq!(rig.mock.subscriber_count(), 1);
    assert_eq!(rig.mock.state_watcher_count(), 1);
    assert_eq!(rig.controller.state(), ControllerState::Subscribed);
    assert_eq!(rig.mock.emitted_count().await, 2);

    // One payload, one application.
    assert_eq!(rig.push(passkeys("AB12", 30, "ZZ99", 30)), 1);
    settle().await;
    assert_eq!(rig.client_slot().text, "AB12");
}

/// Mock channel whose `emit` suspends before sending.
struct YieldingChannel(Arc<MockChannel>);

#[async_trait]
impl DuplexChannel for YieldingChannel {
    async fn emit(&self, event: OutboundEvent) -> Result<(), ChannelError> {
        tokio::task::yield_now().await;
        self.0.emit(event).await
    }

    fn on(&self, event: &str) -> Subscription {
        self.0.on(event)
    }

    fn state(&self) -> watch::Receiver<ChannelState> {
        self.0.state()
    }

    fn shutdown(&self) {
        self.0.shutdown()
    }
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_activations_leave_one_session() {
    let rig = SyncRig::new(SecretFamily::Passwords);
    let channel: Arc<dyn DuplexChannel> = Arc::new(YieldingChannel(rig.mock.clone()));

    let (first, second) = tokio::join!(
        rig.controller.activate(Arc::clone(&channel)),
        rig.controller.activate(Arc::clone(&channel)),
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    settle().await;

    assert!(first.is_torn_down());
    assert!(!second.is_torn_down());
    assert_eq!(rig.mock.subscriber_count(), 1);
    assert_eq!(rig.mock.state_watcher_count(), 1);
    assert_eq!(rig.mock.emitted_count().await, 2);

    assert!(rig.controller.teardown().await);
    advance(2500).await;

    assert_eq!(rig.controller.state(), ControllerState::TornDown);
    assert_eq!(rig.mock.subscriber_count(), 0);
    assert_eq!(rig.mock.state_watcher_count(), 0);
    assert_eq!(rig.mock.emitted_count().await, 2);
}

// ============= Applying payloads =============

#[tokio::test(start_paused = true)]
async fn test_payload_fills_slots_and_resets_countdown() {
    let rig = SyncRig::new(SecretFamily::Passkeys);
    rig.controller.activate(rig.channel()).await.unwrap();

    rig.push(passkeys("AB12", 30, "ZZ99", 30));
    settle().await;

    let client = rig.client_slot();
    let advisor = rig.advisor_slot();
    assert_eq!(client.text, "AB12");
    assert_eq!(advisor.text, "ZZ99");
    assert!(!client.degraded);
    assert!(!advisor.degraded);
    assert_eq!(client.instruction_text, "Ask the client for this passkey");
    assert_eq!(advisor.instruction_text, "Give this passkey to the client");

    assert_degrees(rig.client_phase(), 0.0);
    assert!(rig.countdown.is_active(CLIENT_COUNTDOWN_KEY));
    assert!(!rig.controller.in_flight_guard().is_in_flight());
}

#[tokio::test(start_paused = true)]
async fn test_countdown_ticks_after_payload() {
    let rig = SyncRig::new(SecretFamily::Passwords);
    rig.controller.activate(rig.channel()).await.unwrap();

    rig.push(passwords("hunter2", 30, "s3cret", 30));
    settle().await;
    advance(1500).await;

    assert_eq!(rig.countdown.remaining_ttl(CLIENT_COUNTDOWN_KEY), Some(29));
    assert_degrees(rig.client_phase(), 0.0);

    advance(1000).await;
    assert_eq!(rig.countdown.remaining_ttl(CLIENT_COUNTDOWN_KEY), Some(28));
    assert_degrees(rig.client_phase(), 12.0);

    advance(1000).await;
    assert_degrees(rig.client_phase(), 24.0);
}

#[tokio::test(start_paused = true)]
async fn test_new_payload_restarts_countdown() {
    let rig = SyncRig::new(SecretFamily::Passwords);
    rig.controller.activate(rig.channel()).await.unwrap();

    rig.push(passwords("hunter2", 10, "s3cret", 10));
    settle().await;
    advance(3500).await;
    assert_eq!(rig.countdown.remaining_ttl(CLIENT_COUNTDOWN_KEY), Some(7));

    rig.push(passwords("correcthorse", 30, "battery", 30));
    settle().await;

    assert_eq!(rig.client_slot().text, "correcthorse");
    assert_eq!(rig.countdown.remaining_ttl(CLIENT_COUNTDOWN_KEY), Some(30));
    assert_eq!(rig.countdown.active_count(), 1);
    assert_degrees(rig.client_phase(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_expiring_secret_is_degraded_and_countdown_stops() {
    let rig = SyncRig::new(SecretFamily::Passkeys);
    rig.controller.activate(rig.channel()).await.unwrap();

    rig.push(passkeys("AB12", 0, "ZZ99", 30));
    settle().await;

    assert!(rig.client_slot().degraded);
    assert!(!rig.advisor_slot().degraded);
    assert_degrees(rig.client_phase(), 360.0);
    assert!(rig.countdown.is_active(CLIENT_COUNTDOWN_KEY));

    advance(1500).await;
    assert!(!rig.countdown.is_active(CLIENT_COUNTDOWN_KEY));
    assert_degrees(rig.client_phase(), 360.0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_value_shows_localized_placeholder() {
    let rig = SyncRig::new(SecretFamily::Passkeys);
    rig.controller.activate(rig.channel()).await.unwrap();

    rig.push(json!({
        "client": { "user_passkey": null, "user_ttl": 0 },
        "advisor_client": { "advisor_passkey": "", "advisor_ttl": 0 },
    }));
    settle().await;

    assert_eq!(rig.client_slot().text, "Updating...");
    assert_eq!(rig.advisor_slot().text, "Updating...");
    assert!(rig.client_slot().degraded);
}

#[tokio::test(start_paused = true)]
async fn test_upstream_error_leaves_slots_untouched() {
    let rig = SyncRig::new(SecretFamily::Passkeys);
    rig.controller.activate(rig.channel()).await.unwrap();
    settle().await;
    let before = rig.board.revision();

    rig.push(json!({ "error": "upstream_failure" }));
    settle().await;

    assert_eq!(rig.board.revision(), before);
    assert_eq!(rig.client_slot().text, "");
    assert!(!rig.countdown.is_active(CLIENT_COUNTDOWN_KEY));
    assert!(!rig.controller.in_flight_guard().is_in_flight());
    assert_eq!(rig.controller.state(), ControllerState::Subscribed);

    // The session keeps going; the next good payload is applied.
    rig.push(passkeys("AB12", 30, "ZZ99", 30));
    settle().await;
    assert_eq!(rig.client_slot().text, "AB12");
}

#[test]
fn test_on_update_outcomes() {
    let rig = SyncRig::new(SecretFamily::Passwords);

    assert_eq!(
        rig.controller.on_update(&json!({ "error": "upstream_failure" })),
        UpdateOutcome::Rejected
    );
    assert_eq!(
        rig.controller.on_update(&json!({ "client": {} })),
        UpdateOutcome::Rejected
    );

    let permit = rig.controller.in_flight_guard().try_acquire().unwrap();
    assert_eq!(
        rig.controller.on_update(&passwords("hunter2", 30, "s3cret", 30)),
        UpdateOutcome::Dropped
    );
    drop(permit);

    // No runtime here: the countdown is drawn but does not tick.
    assert_eq!(
        rig.controller.on_update(&passwords("hunter2", 30, "s3cret", 30)),
        UpdateOutcome::Applied
    );
    assert_eq!(rig.client_slot().text, "hunter2");
    assert_degrees(rig.client_phase(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_other_family_events_are_ignored() {
    let rig = SyncRig::new(SecretFamily::Passkeys);
    rig.controller.activate(rig.channel()).await.unwrap();

    rig.mock.inject(
        SecretFamily::Passwords.update_event(),
        passwords("hunter2", 30, "s3cret", 30),
    );
    settle().await;

    assert_eq!(rig.client_slot().text, "");
    assert!(!rig.countdown.is_active(CLIENT_COUNTDOWN_KEY));
}

// ============= Countdown policy =============

#[tokio::test(start_paused = true)]
async fn test_client_only_policy_leaves_advisor_visual_alone() {
    let rig = SyncRig::new(SecretFamily::Passkeys);
    rig.controller.activate(rig.channel()).await.unwrap();

    rig.push(passkeys("AB12", 30, "ZZ99", 15));
    settle().await;

    assert_degrees(rig.client_phase(), 0.0);
    assert_degrees(rig.advisor_phase(), 0.0);
    assert!(!rig.countdown.is_active(ADVISOR_COUNTDOWN_KEY));
    assert_eq!(rig.countdown.active_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_per_side_policy_drives_both_visuals() {
    let rig = SyncRig::with_policy(SecretFamily::Passkeys, CountdownPolicy::PerSide);
    rig.controller.activate(rig.channel()).await.unwrap();

    rig.push(passkeys("AB12", 30, "ZZ99", 15));
    settle().await;

    assert_degrees(rig.client_phase(), 0.0);
    assert_degrees(rig.advisor_phase(), 180.0);
    assert_eq!(rig.countdown.active_count(), 2);

    rig.controller.teardown().await;
    assert_eq!(rig.countdown.active_count(), 0);
}

// ============= Polling and the in-flight guard =============

#[tokio::test(start_paused = true)]
async fn test_poll_requests_once_per_interval() {
    let rig = SyncRig::new(SecretFamily::Passwords);
    let handle = rig.controller.activate(rig.channel()).await.unwrap();

    advance(2500).await;
    assert_eq!(rig.mock.emitted_count().await, 3);

    assert!(handle.teardown().await);
    advance(5000).await;
    assert_eq!(rig.mock.emitted_count().await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_custom_poll_interval() {
    let board = SlotBoard::new();
    let slots = board.mount_family(SecretFamily::Passwords);
    let controller = SyncController::new(
        TEST_USER_ID,
        SecretFamily::Passwords,
        SecretDisplayAdapter::new(Arc::new(test_localizer())),
        slots,
        Arc::new(CountdownDriver::new(board.clone())),
    )
    .with_poll_interval(Duration::from_millis(250));
    let mock = Arc::new(MockChannel::new());

    controller.activate(mock.clone()).await.unwrap();
    advance(1100).await;

    // Immediate request plus ticks at 250, 500, 750 and 1000 ms.
    assert_eq!(mock.emitted_count().await, 5);
}

#[tokio::test(start_paused = true)]
async fn test_zero_poll_interval_is_raised_to_minimum() {
    let board = SlotBoard::new();
    let slots = board.mount_family(SecretFamily::Passwords);
    let controller = SyncController::new(
        TEST_USER_ID,
        SecretFamily::Passwords,
        SecretDisplayAdapter::new(Arc::new(test_localizer())),
        slots,
        Arc::new(CountdownDriver::new(board.clone())),
    )
    .with_poll_interval(Duration::ZERO);
    assert_eq!(controller.poll_interval(), MIN_POLL_INTERVAL);
    let mock = Arc::new(MockChannel::new());

    controller.activate(mock.clone()).await.unwrap();
    advance(10).await;

    assert_eq!(controller.state(), ControllerState::Subscribed);
    assert_eq!(mock.subscriber_count(), 1);
    assert!(mock.emitted_count().await > 1);
}

#[tokio::test(start_paused = true)]
async fn test_poll_skipped_while_update_in_flight() {
    let rig = SyncRig::new(SecretFamily::Passwords);
    rig.controller.activate(rig.channel()).await.unwrap();

    let permit = rig.controller.in_flight_guard().try_acquire().unwrap();
    advance(2500).await;
    assert_eq!(rig.mock.emitted_count().await, 1);

    drop(permit);
    advance(1000).await;
    assert_eq!(rig.mock.emitted_count().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_payload_dropped_while_update_in_flight() {
    let rig = SyncRig::new(SecretFamily::Passkeys);
    rig.controller.activate(rig.channel()).await.unwrap();
    settle().await;

    let permit = rig.controller.in_flight_guard().try_acquire().unwrap();
    let before = rig.board.revision();
    rig.push(passkeys("AB12", 30, "ZZ99", 30));
    settle().await;

    assert_eq!(rig.board.revision(), before);
    assert_eq!(rig.client_slot().text, "");
    assert!(rig.controller.in_flight_guard().is_in_flight());

    // Dropped, not queued: releasing the guard does not replay it.
    drop(permit);
    settle().await;
    assert_eq!(rig.client_slot().text, "");

    rig.push(passkeys("CD34", 30, "YY88", 30));
    settle().await;
    assert_eq!(rig.client_slot().text, "CD34");
}

struct FlakySlot {
    panic_on_write: AtomicBool,
    text: std::sync::Mutex<String>,
}

impl SecretSlot for FlakySlot {
    fn set_secret_text(&self, text: &str) {
        if self.panic_on_write.load(Ordering::SeqCst) {
            panic!("slot renderer crashed");
        }
        *self.text.lock().unwrap() = text.to_string();
    }

    fn set_degraded(&self, _degraded: bool) {}

    fn instruction_key(&self) -> Option<String> {
        None
    }

    fn set_instruction_text(&self, _text: &str) {}
}

#[test]
fn test_panicking_slot_releases_in_flight_flag() {
    let board = SlotBoard::new();
    let slot = Arc::new(FlakySlot {
        panic_on_write: AtomicBool::new(true),
        text: std::sync::Mutex::new(String::new()),
    });
    let controller = SyncController::new(
        TEST_USER_ID,
        SecretFamily::Passwords,
        SecretDisplayAdapter::new(Arc::new(test_localizer())),
        SlotPair::client_only(slot.clone()),
        Arc::new(CountdownDriver::new(board)),
    );
    let payload = passwords("hunter2", 30, "s3cret", 30);

    let result = catch_unwind(AssertUnwindSafe(|| controller.on_update(&payload)));
    assert!(result.is_err());
    assert!(!controller.in_flight_guard().is_in_flight());

    slot.panic_on_write.store(false, Ordering::SeqCst);
    assert_eq!(controller.on_update(&payload), UpdateOutcome::Applied);
    assert_eq!(*slot.text.lock().unwrap(), "hunter2");
}

#[tokio::test(start_paused = true)]
async fn test_session_survives_panicking_slot() {
    let board = SlotBoard::new();
    let slot = Arc::new(FlakySlot {
        panic_on_write: AtomicBool::new(true),
        text: std::sync::Mutex::new(String::new()),
    });
    let controller = SyncController::new(
        TEST_USER_ID,
        SecretFamily::Passwords,
        SecretDisplayAdapter::new(Arc::new(test_localizer())),
        SlotPair::client_only(slot.clone()),
        Arc::new(CountdownDriver::new(board)),
    );
    let mock = Arc::new(MockChannel::new());
    let handle = controller.activate(mock.clone()).await.unwrap();

    mock.inject(
        SecretFamily::Passwords.update_event(),
        passwords("hunter2", 30, "s3cret", 30),
    );
    settle().await;

    assert!(!handle.is_torn_down());
    assert_eq!(controller.state(), ControllerState::Subscribed);
    assert!(!controller.in_flight_guard().is_in_flight());
    assert_eq!(mock.subscriber_count(), 1);

    slot.panic_on_write.store(false, Ordering::SeqCst);
    mock.inject(
        SecretFamily::Passwords.update_event(),
        passwords("correcthorse", 30, "battery", 30),
    );
    settle().await;
    assert_eq!(*slot.text.lock().unwrap(), "correcthorse");

    // Polling carries on: the immediate request plus ticks at 1, 2 and 3 s.
    advance(3500).await;
    assert_eq!(mock.emitted_count().await, 4);
}

// ============= Teardown =============

#[tokio::test(start_paused = true)]
async fn test_teardown_releases_everything_once() {
    let rig = SyncRig::new(SecretFamily::Passkeys);
    let handle = rig.controller.activate(rig.channel()).await.unwrap();
    rig.push(passkeys("AB12", 30, "ZZ99", 30));
    settle().await;
    assert!(rig.countdown.is_active(CLIENT_COUNTDOWN_KEY));

    assert!(handle.teardown().await);
    assert!(!handle.teardown().await);
    assert!(!rig.controller.teardown().await);

    assert!(handle.is_torn_down());
    assert_eq!(rig.controller.state(), ControllerState::TornDown);
    assert_eq!(rig.mock.subscriber_count(), 0);
    assert_eq!(rig.mock.state_watcher_count(), 0);
    assert!(!rig.countdown.is_active(CLIENT_COUNTDOWN_KEY));

    // Slots keep their last values; nothing writes to them any more.
    let revision = rig.board.revision();
    assert_eq!(rig.push(passkeys("CD34", 30, "YY88", 30)), 0);
    advance(5000).await;
    assert_eq!(rig.client_slot().text, "AB12");
    assert_eq!(rig.board.revision(), revision);
    assert_eq!(rig.mock.emitted_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_tears_session_down() {
    let rig = SyncRig::new(SecretFamily::Passwords);
    let handle = rig.controller.activate(rig.channel()).await.unwrap();
    rig.push(passwords("hunter2", 30, "s3cret", 30));
    settle().await;

    rig.mock.simulate_disconnect();
    settle().await;

    assert!(handle.is_torn_down());
    assert_eq!(rig.controller.state(), ControllerState::TornDown);
    assert_eq!(rig.mock.subscriber_count(), 0);
    assert_eq!(rig.mock.state_watcher_count(), 0);
    assert!(!rig.countdown.is_active(CLIENT_COUNTDOWN_KEY));

    // Later teardown requests are no-ops.
    assert!(!handle.teardown().await);
    assert!(!rig.controller.teardown().await);

    // Reconnecting alone does not resubscribe.
    rig.mock.simulate_reconnected();
    advance(3000).await;
    assert_eq!(rig.mock.emitted_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_reconnecting_state_counts_as_disconnect() {
    let rig = SyncRig::new(SecretFamily::Passwords);
    let handle = rig.controller.activate(rig.channel()).await.unwrap();

    rig.mock.simulate_reconnecting(1);
    settle().await;

    assert!(handle.is_torn_down());
    assert_eq!(rig.controller.state(), ControllerState::TornDown);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_controller_tears_session_down() {
    let rig = SyncRig::new(SecretFamily::Passkeys);
    let handle = rig.controller.activate(rig.channel()).await.unwrap();
    let SyncRig { mock, controller, .. } = rig;

    drop(controller);
    settle().await;

    assert!(handle.is_torn_down());
    assert_eq!(mock.subscriber_count(), 0);
    assert_eq!(mock.state_watcher_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_only_cancels_owned_countdowns() {
    let board = SlotBoard::new();
    board.mount_countdown(CLIENT_COUNTDOWN_KEY);
    let countdown = Arc::new(CountdownDriver::new(board.clone()));
    let build = |family: SecretFamily| {
        SyncController::new(
            TEST_USER_ID,
            family,
            SecretDisplayAdapter::new(Arc::new(test_localizer())),
            board.mount_family(family),
            Arc::clone(&countdown),
        )
    };
    let passkeys_controller = build(SecretFamily::Passkeys);
    let passwords_controller = build(SecretFamily::Passwords);
    let mock = Arc::new(MockChannel::new());

    passkeys_controller.activate(mock.clone()).await.unwrap();
    passwords_controller.activate(mock.clone()).await.unwrap();

    mock.inject(
        SecretFamily::Passkeys.update_event(),
        passkeys("AB12", 30, "ZZ99", 30),
    );
    settle().await;
    mock.inject(
        SecretFamily::Passwords.update_event(),
        passwords("hunter2", 20, "s3cret", 20),
    );
    settle().await;

    // The passwords payload took over the shared visual.
    assert_eq!(countdown.remaining_ttl(CLIENT_COUNTDOWN_KEY), Some(20));

    assert!(passkeys_controller.teardown().await);
    assert!(countdown.is_active(CLIENT_COUNTDOWN_KEY));

    assert!(passwords_controller.teardown().await);
    assert!(!countdown.is_active(CLIENT_COUNTDOWN_KEY));
}

// ============= Reconnect supervision =============

#[tokio::test(start_paused = true)]
async fn test_supervisor_resubscribes_after_reconnect() {
    let rig = SyncRig::new(SecretFamily::Passkeys);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let supervisor = tokio::spawn(supervise(
        Arc::clone(&rig.controller),
        rig.channel(),
        shutdown_rx,
    ));
    settle().await;

    assert_eq!(rig.controller.state(), ControllerState::Subscribed);
    assert_eq!(rig.mock.emitted_count().await, 1);

    rig.mock.simulate_disconnect();
    settle().await;
    assert_eq!(rig.controller.state(), ControllerState::TornDown);

    rig.mock.simulate_reconnecting(1);
    settle().await;
    assert_eq!(rig.controller.state(), ControllerState::TornDown);

    rig.mock.simulate_reconnected();
    settle().await;
    assert_eq!(rig.controller.state(), ControllerState::Subscribed);
    assert_eq!(rig.mock.subscriber_count(), 1);

    let emitted = rig.mock.emitted().await;
    assert_eq!(emitted.len(), 2);
    assert!(emitted
        .iter()
        .all(|event| matches!(event, OutboundEvent::RequestUpdate(req) if req.user_id == TEST_USER_ID)));

    rig.push(passkeys("AB12", 30, "ZZ99", 30));
    settle().await;
    assert_eq!(rig.client_slot().text, "AB12");

    shutdown_tx.send(true).unwrap();
    supervisor.await.unwrap();

    assert_eq!(rig.controller.state(), ControllerState::TornDown);
    assert_eq!(rig.mock.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_supervisor_waits_for_connection() {
    let rig = SyncRig::new(SecretFamily::Passwords);
    let mock = Arc::new(MockChannel::disconnected());
    let channel: Arc<dyn DuplexChannel> = mock.clone();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let supervisor = tokio::spawn(supervise(Arc::clone(&rig.controller), channel, shutdown_rx));
    settle().await;

    assert_eq!(rig.controller.state(), ControllerState::Idle);
    assert_eq!(mock.emitted_count().await, 0);

    mock.simulate_reconnected();
    settle().await;
    assert_eq!(rig.controller.state(), ControllerState::Subscribed);

    drop(shutdown_tx);
    supervisor.await.unwrap();
    assert_eq!(rig.controller.state(), ControllerState::TornDown);
}
