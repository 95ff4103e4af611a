//! Sync Channel Controller.
//!
//! One controller per secret family and user. Activation subscribes to the
//! family's push event, pulls once immediately and then on every poll tick,
//! and applies each payload through the display adapter and the countdown
//! driver. A disconnect, an explicit teardown, or a later activation ends
//! the session and releases everything it owns.
//!
//! ```text
//!   Idle ──activate──▶ Subscribed ──teardown / disconnect──▶ TornDown
//!                          ▲                                    │
//!                          └──────────── activate ──────────────┘
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::guard::InFlightGuard;
use super::teardown::{SessionExit, SessionShared, TeardownHandle};
use crate::channel::{ChannelState, OutboundEvent, RequestUpdate};
use crate::countdown::{CountdownDriver, CountdownTicket};
use crate::display::{SecretDisplayAdapter, SlotPair};
use crate::error::{ChannelError, ErrorContext, SyncError, SyncResult};
use crate::models::{RotationPayload, SecretFamily};
use crate::traits::{DuplexChannel, Subscription};

/// Countdown key of the client side, shared by both families' views.
pub const CLIENT_COUNTDOWN_KEY: &str = "client";
/// Countdown key of the advisor side, driven only under [`CountdownPolicy::PerSide`].
pub const ADVISOR_COUNTDOWN_KEY: &str = "advisor";
/// Default cadence of pull requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Shortest accepted poll interval; shorter ones are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle of a controller session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Subscribed,
    TornDown,
}

/// Which countdowns an applied payload resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountdownPolicy {
    /// One shared visual timer, keyed `client`, driven by the client TTL.
    #[default]
    ClientOnly,
    /// Also drive an `advisor` countdown from the advisor TTL.
    PerSide,
}

impl CountdownPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountdownPolicy::ClientOnly => "client-only",
            CountdownPolicy::PerSide => "per-side",
        }
    }
}

impl fmt::Display for CountdownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CountdownPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "client-only" | "client" => Ok(CountdownPolicy::ClientOnly),
            "per-side" | "both" => Ok(CountdownPolicy::PerSide),
            other => Err(format!("unknown countdown policy '{}'", other)),
        }
    }
}

/// What happened to one received payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Written to the slots and the countdown was reset.
    Applied,
    /// Another payload was still being applied.
    Dropped,
    /// Malformed or carrying an upstream error; nothing was written.
    Rejected,
}

pub(crate) struct ControllerInner {
    session_id: Uuid,
    user_id: String,
    family: SecretFamily,
    adapter: SecretDisplayAdapter,
    slots: SlotPair,
    countdown: Arc<CountdownDriver>,
    guard: InFlightGuard,
    state: watch::Sender<ControllerState>,
    tickets: StdMutex<HashMap<&'static str, CountdownTicket>>,
}

impl ControllerInner {
    fn handle_update(&self, data: &Value, policy: CountdownPolicy) -> UpdateOutcome {
        let Some(_permit) = self.guard.try_acquire() else {
            debug!(
                session_id = %self.session_id,
                family = %self.family,
                "Update already in flight, dropping payload"
            );
            return UpdateOutcome::Dropped;
        };

        match self.adapter.apply(self.family, data, &self.slots) {
            Ok(payload) => {
                self.reset_countdowns(&payload, policy);
                UpdateOutcome::Applied
            }
            Err(_) => UpdateOutcome::Rejected,
        }
    }

    fn reset_countdowns(&self, payload: &RotationPayload, policy: CountdownPolicy) {
        let mut reset = vec![(
            CLIENT_COUNTDOWN_KEY,
            self.countdown
                .reset(CLIENT_COUNTDOWN_KEY, payload.client.ttl_seconds),
        )];
        if policy == CountdownPolicy::PerSide {
            reset.push((
                ADVISOR_COUNTDOWN_KEY,
                self.countdown
                    .reset(ADVISOR_COUNTDOWN_KEY, payload.advisor.ttl_seconds),
            ));
        }

        let mut tickets = self.lock_tickets();
        for (key, ticket) in reset {
            tickets.insert(key, ticket);
        }
    }

    /// Cancel the countdowns this controller still owns and mark it torn down.
    pub(crate) fn release(&self) {
        let owned: Vec<CountdownTicket> = self.lock_tickets().drain().map(|(_, t)| t).collect();
        let cancelled = owned
            .iter()
            .filter(|ticket| self.countdown.cancel_owned(ticket))
            .count();

        self.state.send_replace(ControllerState::TornDown);
        info!(
            session_id = %self.session_id,
            family = %self.family,
            cancelled_countdowns = cancelled,
            "Session torn down"
        );
    }

    fn lock_tickets(&self) -> MutexGuard<'_, HashMap<&'static str, CountdownTicket>> {
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps one secret family's slots in sync with the rotation server.
pub struct SyncController {
    inner: Arc<ControllerInner>,
    policy: CountdownPolicy,
    poll_interval: Duration,
    /// Held across a whole activation or teardown, so they never interleave.
    session: Mutex<Option<TeardownHandle>>,
}

impl SyncController {
    pub fn new(
        user_id: impl Into<String>,
        family: SecretFamily,
        adapter: SecretDisplayAdapter,
        slots: SlotPair,
        countdown: Arc<CountdownDriver>,
    ) -> Self {
        let (state, _) = watch::channel(ControllerState::Idle);
        Self {
            inner: Arc::new(ControllerInner {
                session_id: Uuid::new_v4(),
                user_id: user_id.into(),
                family,
                adapter,
                slots,
                countdown,
                guard: InFlightGuard::new(),
                state,
                tickets: StdMutex::new(HashMap::new()),
            }),
            policy: CountdownPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            session: Mutex::new(None),
        }
    }

    pub fn with_countdown_policy(mut self, policy: CountdownPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the pull cadence, at least [`MIN_POLL_INTERVAL`].
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    pub fn family(&self) -> SecretFamily {
        self.inner.family
    }

    pub fn countdown_policy(&self) -> CountdownPolicy {
        self.policy
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn state(&self) -> ControllerState {
        *self.inner.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn state_receiver(&self) -> watch::Receiver<ControllerState> {
        self.inner.state.subscribe()
    }

    pub fn in_flight_guard(&self) -> &InFlightGuard {
        &self.inner.guard
    }

    /// Apply one received payload, unless another one is in flight.
    pub fn on_update(&self, data: &Value) -> UpdateOutcome {
        self.inner.handle_update(data, self.policy)
    }

    /// Start a session on `channel`.
    ///
    /// Any previous session is torn down first. Fails without side effects
    /// when the channel is not connected. Concurrent activations run one
    /// after the other, so only the last one's session survives.
    pub async fn activate(&self, channel: Arc<dyn DuplexChannel>) -> SyncResult<TeardownHandle> {
        let mut session = self.session.lock().await;
        if let Some(stale) = session.take() {
            if stale.teardown().await {
                debug!(session_id = %self.inner.session_id, "Tore down stale session");
            }
        }

        let mut disconnects = channel.state();
        if !disconnects.borrow_and_update().is_connected() {
            return Err(SyncError::from(ChannelError::Disconnected)
                .with_context(self.error_context("activate")));
        }

        let updates = channel.on(self.inner.family.update_event());
        let request = OutboundEvent::RequestUpdate(RequestUpdate::new(self.inner.user_id.clone()));
        if let Err(e) = channel.emit(request.clone()).await {
            warn!(
                session_id = %self.inner.session_id,
                error_code = e.error_code(),
                "Initial update request failed: {}",
                e
            );
        }

        self.inner.state.send_replace(ControllerState::Subscribed);
        info!(
            session_id = %self.inner.session_id,
            family = %self.inner.family,
            user_id = %self.inner.user_id,
            policy = %self.policy,
            "Subscribed to rotation updates"
        );

        let shared = Arc::new(SessionShared::new(Arc::clone(&self.inner)));
        let task = tokio::spawn(run_session(
            Arc::clone(&shared),
            channel,
            updates,
            disconnects,
            request,
            self.policy,
            self.poll_interval,
        ));
        shared.attach(task);

        let handle = TeardownHandle::new(shared);
        *session = Some(handle.clone());
        Ok(handle)
    }

    /// Tear down the current session, if any.
    pub async fn teardown(&self) -> bool {
        let mut session = self.session.lock().await;
        match session.take() {
            Some(handle) => handle.teardown().await,
            None => false,
        }
    }

    fn error_context(&self, operation: &str) -> ErrorContext {
        ErrorContext::new(operation)
            .with_session_id(self.inner.session_id.to_string())
            .with_family(self.inner.family.as_str())
            .with_component("sync_controller")
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        if let Some(handle) = self.session.get_mut().take() {
            handle.teardown_now();
        }
    }
}

async fn run_session(
    shared: Arc<SessionShared>,
    channel: Arc<dyn DuplexChannel>,
    mut updates: Subscription,
    mut disconnects: watch::Receiver<ChannelState>,
    request: OutboundEvent,
    policy: CountdownPolicy,
    poll_interval: Duration,
) {
    let inner = Arc::clone(shared.inner());
    // Releases the session however this task ends, abort and panic included.
    let _exit = SessionExit::new(shared);
    let mut poll = interval_at(Instant::now() + poll_interval, poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(data) => {
                    match catch_unwind(AssertUnwindSafe(|| inner.handle_update(&data, policy))) {
                        Ok(outcome) => {
                            debug!(session_id = %inner.session_id, ?outcome, "Handled rotation payload");
                        }
                        Err(panic) => {
                            error!(
                                session_id = %inner.session_id,
                                family = %inner.family,
                                "Applying rotation payload panicked: {}",
                                panic_message(&*panic)
                            );
                        }
                    }
                }
                None => {
                    info!(session_id = %inner.session_id, "Channel closed, ending session");
                    break;
                }
            },
            _ = poll.tick() => {
                if inner.guard.is_in_flight() {
                    debug!(session_id = %inner.session_id, "Update in flight, skipping poll");
                } else if let Err(e) = channel.emit(request.clone()).await {
                    warn!(
                        session_id = %inner.session_id,
                        error_code = e.error_code(),
                        "Update request failed: {}",
                        e
                    );
                }
            }
            changed = disconnects.changed() => {
                let connected = changed.is_ok() && disconnects.borrow_and_update().is_connected();
                if !connected {
                    info!(session_id = %inner.session_id, "Channel disconnected, ending session");
                    break;
                }
            }
        }
    }

    drop(updates);
    drop(disconnects);
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
