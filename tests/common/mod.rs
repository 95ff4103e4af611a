//! Common test utilities for integration tests.
//!
//! Builds a controller wired to a mock channel and an in-memory board, and
//! provides payload builders for both secret families.
//!
//! # Example
//!
//! ```ignore
//! let rig = SyncRig::new(SecretFamily::Passkeys);
//! let handle = rig.controller.activate(rig.channel()).await.unwrap();
//! rig.mock.inject(SecretFamily::Passkeys.update_event(), passkeys("AB12", 30, "ZZ99", 30));
//! settle().await;
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};

use pairsync::adapters::mock::{MockChannel, StubLocalizer};
use pairsync::countdown::CountdownDriver;
use pairsync::display::{SecretDisplayAdapter, SlotBoard, SlotView};
use pairsync::models::SecretFamily;
use pairsync::sync::{CountdownPolicy, SyncController, ADVISOR_COUNTDOWN_KEY, CLIENT_COUNTDOWN_KEY};
use pairsync::traits::DuplexChannel;

pub const TEST_USER_ID: &str = "42";

/// Localizer with the English texts the tests look for.
pub fn test_localizer() -> StubLocalizer {
    StubLocalizer::new()
        .with("updating", "Updating...")
        .with("auth", "Authentication")
        .with("passkey_advisor_from_client", "Ask the client for this passkey")
        .with("passkey_advisor_to_client", "Give this passkey to the client")
        .with("password_advisor_from_client", "Ask the client for this password")
        .with("password_advisor_to_client", "Give this password to the client")
}

/// Passkeys payload as pushed on `update_passkeys_pairs`.
pub fn passkeys(client: &str, client_ttl: i64, advisor: &str, advisor_ttl: i64) -> Value {
    json!({
        "client": { "user_passkey": client, "user_ttl": client_ttl },
        "advisor_client": { "advisor_passkey": advisor, "advisor_ttl": advisor_ttl },
        "client_user_name": "Jane Doe",
        "advisor_user_name": "John Roe",
    })
}

/// Passwords payload as pushed on `update_passwords`.
pub fn passwords(client: &str, client_ttl: i64, advisor: &str, advisor_ttl: i64) -> Value {
    json!({
        "client": { "user_pwd": client, "user_ttl": client_ttl },
        "advisor_client": { "advisor_pwd": advisor, "advisor_ttl": advisor_ttl },
    })
}

/// Payload for `family` with both values and TTLs given.
pub fn payload_for(
    family: SecretFamily,
    client: &str,
    client_ttl: i64,
    advisor: &str,
    advisor_ttl: i64,
) -> Value {
    match family {
        SecretFamily::Passkeys => passkeys(client, client_ttl, advisor, advisor_ttl),
        SecretFamily::Passwords => passwords(client, client_ttl, advisor, advisor_ttl),
    }
}

/// Slot ids `(client, advisor)` the board mounts for `family`.
pub fn slot_ids(family: SecretFamily) -> (&'static str, &'static str) {
    match family {
        SecretFamily::Passkeys => ("client_passkey", "advisor_client_passkey"),
        SecretFamily::Passwords => ("client_pwd", "advisor_client_pwd"),
    }
}

/// A controller on a mock channel, rendering into its own board.
pub struct SyncRig {
    pub family: SecretFamily,
    pub board: Arc<SlotBoard>,
    pub mock: Arc<MockChannel>,
    pub countdown: Arc<CountdownDriver>,
    pub controller: Arc<SyncController>,
}

impl SyncRig {
    pub fn new(family: SecretFamily) -> Self {
        Self::with_policy(family, CountdownPolicy::ClientOnly)
    }

    pub fn with_policy(family: SecretFamily, policy: CountdownPolicy) -> Self {
        let board = SlotBoard::new();
        board.mount_countdown(CLIENT_COUNTDOWN_KEY);
        board.mount_countdown(ADVISOR_COUNTDOWN_KEY);
        let slots = board.mount_family(family);

        let countdown = Arc::new(CountdownDriver::new(board.clone()));
        let controller = SyncController::new(
            TEST_USER_ID,
            family,
            SecretDisplayAdapter::new(Arc::new(test_localizer())),
            slots,
            Arc::clone(&countdown),
        )
        .with_countdown_policy(policy);

        Self {
            family,
            board,
            mock: Arc::new(MockChannel::new()),
            countdown,
            controller: Arc::new(controller),
        }
    }

    /// The mock channel as the trait object controllers take.
    pub fn channel(&self) -> Arc<dyn DuplexChannel> {
        self.mock.clone()
    }

    /// Push a payload on this rig's family event.
    pub fn push(&self, data: Value) -> usize {
        self.mock.inject(self.family.update_event(), data)
    }

    pub fn client_slot(&self) -> SlotView {
        self.board
            .slot(slot_ids(self.family).0)
            .unwrap_or_default()
    }

    pub fn advisor_slot(&self) -> SlotView {
        self.board
            .slot(slot_ids(self.family).1)
            .unwrap_or_default()
    }

    pub fn client_phase(&self) -> f64 {
        self.board
            .countdown_phase(CLIENT_COUNTDOWN_KEY)
            .unwrap_or(f64::NAN)
    }

    pub fn advisor_phase(&self) -> f64 {
        self.board
            .countdown_phase(ADVISOR_COUNTDOWN_KEY)
            .unwrap_or(f64::NAN)
    }
}

/// Let spawned tasks run without advancing the clock.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Assert two angles match to within a rounding error.
pub fn assert_degrees(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}°, got {}°",
        expected,
        actual
    );
}
