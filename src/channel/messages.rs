use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server push carrying a passkey pair snapshot.
pub const UPDATE_PASSKEYS_EVENT: &str = "update_passkeys_pairs";
/// Server push carrying a password pair snapshot.
pub const UPDATE_PASSWORDS_EVENT: &str = "update_passwords";
/// Client pull asking the server to push a fresh snapshot.
pub const REQUEST_UPDATE_EVENT: &str = "request_update";

/// One text frame on the wire: `{"event": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChannelFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl ChannelFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

/// Event received from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub name: String,
    pub data: Value,
}

impl InboundEvent {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

impl From<ChannelFrame> for InboundEvent {
    fn from(frame: ChannelFrame) -> Self {
        Self {
            name: frame.event,
            data: frame.data,
        }
    }
}

/// Pull request payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequestUpdate {
    pub user_id: String,
}

impl RequestUpdate {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Events the client emits to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    RequestUpdate(RequestUpdate),
}

impl OutboundEvent {
    /// Event name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::RequestUpdate(_) => REQUEST_UPDATE_EVENT,
        }
    }

    /// Build the wire frame for this event.
    pub fn to_frame(&self) -> Result<ChannelFrame, serde_json::Error> {
        let data = match self {
            OutboundEvent::RequestUpdate(req) => serde_json::to_value(req)?,
        };
        Ok(ChannelFrame::new(self.name(), data))
    }

    /// The user id the request is tagged with.
    pub fn user_id(&self) -> &str {
        match self {
            OutboundEvent::RequestUpdate(req) => &req.user_id,
        }
    }
}
