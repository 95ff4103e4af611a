//! Secret Display Adapter.
//!
//! Writes a rotation payload into the host's slots: the secret value (or a
//! localized placeholder while the server is mid-rotation), the degraded
//! state, and a freshly translated instruction label.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::error::PayloadError;
use crate::models::{RotationPayload, SecretFamily, SecretSide};
use crate::traits::{Localizer, SecretSlot};

/// Localization key of the placeholder shown in place of an empty secret.
pub const UPDATING_KEY: &str = "updating";

/// The client and advisor slots of one secret family.
///
/// Either side may be absent when the host does not render it.
#[derive(Clone, Default)]
pub struct SlotPair {
    pub client: Option<Arc<dyn SecretSlot>>,
    pub advisor: Option<Arc<dyn SecretSlot>>,
}

impl SlotPair {
    pub fn new(client: Arc<dyn SecretSlot>, advisor: Arc<dyn SecretSlot>) -> Self {
        Self {
            client: Some(client),
            advisor: Some(advisor),
        }
    }

    pub fn client_only(client: Arc<dyn SecretSlot>) -> Self {
        Self {
            client: Some(client),
            advisor: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.client.is_none() && self.advisor.is_none()
    }
}

impl std::fmt::Debug for SlotPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotPair")
            .field("client", &self.client.is_some())
            .field("advisor", &self.advisor.is_some())
            .finish()
    }
}

/// Applies rotation payloads to display slots.
pub struct SecretDisplayAdapter {
    localizer: Arc<dyn Localizer>,
}

impl SecretDisplayAdapter {
    pub fn new(localizer: Arc<dyn Localizer>) -> Self {
        Self { localizer }
    }

    /// Decode `data` as a `family` payload and write it to `slots`.
    ///
    /// A rejected payload is logged and leaves every slot untouched.
    pub fn apply(
        &self,
        family: SecretFamily,
        data: &Value,
        slots: &SlotPair,
    ) -> Result<RotationPayload, PayloadError> {
        let payload = match RotationPayload::decode(family, data) {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    family = %family,
                    error_code = e.error_code(),
                    upstream = e.is_upstream(),
                    "Rejected rotation payload: {}",
                    e
                );
                return Err(e);
            }
        };

        if let Some(slot) = slots.client.as_deref() {
            self.write_side(slot, &payload.client, payload.client_user_name.as_deref());
        }
        if let Some(slot) = slots.advisor.as_deref() {
            self.write_side(slot, &payload.advisor, payload.advisor_user_name.as_deref());
        }

        debug!(
            family = %family,
            client_ttl = payload.client.ttl_seconds,
            advisor_ttl = payload.advisor.ttl_seconds,
            "Applied rotation payload"
        );
        Ok(payload)
    }

    fn write_side(&self, slot: &dyn SecretSlot, side: &SecretSide, owner: Option<&str>) {
        if side.has_value() {
            slot.set_secret_text(&side.secret_value);
        } else {
            slot.set_secret_text(&self.localizer.translate(UPDATING_KEY));
        }

        slot.set_degraded(side.is_rotating());

        if let Some(key) = slot.instruction_key() {
            slot.set_instruction_text(&self.localizer.translate(&key));
        }

        if let Some(name) = owner {
            slot.set_owner_name(name);
        }
    }
}
