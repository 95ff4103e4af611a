//! Rotation payloads as pushed by the server.
//!
//! Both secret families share one protocol and differ only in their event
//! name and the field names of the secret values:
//!
//! ```json
//! {
//!   "client":         { "user_passkey": "AB12", "user_ttl": 30 },
//!   "advisor_client": { "advisor_passkey": "ZZ99", "advisor_ttl": 30 },
//!   "client_user_name": "Jane Doe",
//!   "advisor_user_name": "John Roe"
//! }
//! ```
//!
//! Decoding is all-or-nothing: a payload is either fully usable or it is
//! rejected with a [`PayloadError`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::channel::messages::{UPDATE_PASSKEYS_EVENT, UPDATE_PASSWORDS_EVENT};
use crate::error::PayloadError;

const CLIENT_SIDE: &str = "client";
const ADVISOR_SIDE: &str = "advisor_client";
const CLIENT_TTL_FIELD: &str = "user_ttl";
const ADVISOR_TTL_FIELD: &str = "advisor_ttl";

/// The kind of rotating secret a stream carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretFamily {
    Passkeys,
    Passwords,
}

impl SecretFamily {
    /// Every family, in display order.
    pub const ALL: [SecretFamily; 2] = [SecretFamily::Passkeys, SecretFamily::Passwords];

    /// Server-push event carrying this family's payloads.
    pub fn update_event(&self) -> &'static str {
        match self {
            SecretFamily::Passkeys => UPDATE_PASSKEYS_EVENT,
            SecretFamily::Passwords => UPDATE_PASSWORDS_EVENT,
        }
    }

    /// Field holding the client's secret inside the `client` object.
    pub fn client_value_field(&self) -> &'static str {
        match self {
            SecretFamily::Passkeys => "user_passkey",
            SecretFamily::Passwords => "user_pwd",
        }
    }

    /// Field holding the advisor's secret inside the `advisor_client` object.
    pub fn advisor_value_field(&self) -> &'static str {
        match self {
            SecretFamily::Passkeys => "advisor_passkey",
            SecretFamily::Passwords => "advisor_pwd",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SecretFamily::Passkeys => "passkeys",
            SecretFamily::Passwords => "passwords",
        }
    }
}

impl fmt::Display for SecretFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecretFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passkeys" | "passkey" => Ok(SecretFamily::Passkeys),
            "passwords" | "password" | "pwd" => Ok(SecretFamily::Passwords),
            other => Err(format!("unknown secret family '{}'", other)),
        }
    }
}

/// One side (client or advisor) of a rotating-secret pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretSide {
    /// Current secret value. Empty while the server is mid-rotation.
    pub secret_value: String,
    /// Seconds before the value rotates. May be zero or negative.
    pub ttl_seconds: i64,
}

impl SecretSide {
    pub fn new(secret_value: impl Into<String>, ttl_seconds: i64) -> Self {
        Self {
            secret_value: secret_value.into(),
            ttl_seconds,
        }
    }

    /// Less than one second left: the value is about to be replaced.
    pub fn is_rotating(&self) -> bool {
        self.ttl_seconds < 1
    }

    pub fn has_value(&self) -> bool {
        !self.secret_value.is_empty()
    }
}

/// One snapshot of both sides of a rotating-secret pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPayload {
    pub client: SecretSide,
    pub advisor: SecretSide,
    pub client_user_name: Option<String>,
    pub advisor_user_name: Option<String>,
}

impl RotationPayload {
    pub fn new(client: SecretSide, advisor: SecretSide) -> Self {
        Self {
            client,
            advisor,
            client_user_name: None,
            advisor_user_name: None,
        }
    }

    /// Decode a raw event payload for `family`.
    ///
    /// Rejects the payload as a whole when the `error` field is set, when
    /// either side is missing, or when a TTL is absent or not a number.
    /// A null or missing secret value is accepted and decodes to an empty
    /// string (the server is mid-rotation).
    pub fn decode(family: SecretFamily, data: &Value) -> Result<Self, PayloadError> {
        let object = data.as_object().ok_or(PayloadError::NotAnObject)?;

        if let Some(message) = upstream_error(object) {
            return Err(PayloadError::Upstream { message });
        }

        let client = decode_side(
            object,
            CLIENT_SIDE,
            family.client_value_field(),
            CLIENT_TTL_FIELD,
        )?;
        let advisor = decode_side(
            object,
            ADVISOR_SIDE,
            family.advisor_value_field(),
            ADVISOR_TTL_FIELD,
        )?;

        Ok(Self {
            client,
            advisor,
            client_user_name: optional_string(object, "client_user_name"),
            advisor_user_name: optional_string(object, "advisor_user_name"),
        })
    }

    /// Encode the payload the way the server sends it for `family`.
    pub fn to_wire(&self, family: SecretFamily) -> Value {
        let mut value = json!({
            CLIENT_SIDE: {
                family.client_value_field(): self.client.secret_value,
                CLIENT_TTL_FIELD: self.client.ttl_seconds,
            },
            ADVISOR_SIDE: {
                family.advisor_value_field(): self.advisor.secret_value,
                ADVISOR_TTL_FIELD: self.advisor.ttl_seconds,
            },
        });
        if let Some(object) = value.as_object_mut() {
            if let Some(ref name) = self.client_user_name {
                object.insert("client_user_name".to_string(), json!(name));
            }
            if let Some(ref name) = self.advisor_user_name {
                object.insert("advisor_user_name".to_string(), json!(name));
            }
        }
        value
    }
}

/// A set `error` field: any value except null, `false` and `""`.
fn upstream_error(object: &Map<String, Value>) -> Option<String> {
    match object.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn decode_side(
    object: &Map<String, Value>,
    side: &'static str,
    value_field: &'static str,
    ttl_field: &'static str,
) -> Result<SecretSide, PayloadError> {
    let side_object = object
        .get(side)
        .and_then(Value::as_object)
        .ok_or(PayloadError::MissingSide { side })?;

    let secret_value = match side_object.get(value_field) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(PayloadError::MalformedField {
                side,
                field: value_field,
                message: format!("expected a string, got {}", other),
            })
        }
    };

    let ttl_seconds = match side_object.get(ttl_field) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.floor() as i64))
            .ok_or_else(|| PayloadError::MalformedField {
                side,
                field: ttl_field,
                message: format!("{} is out of range", n),
            })?,
        Some(other) => {
            return Err(PayloadError::MalformedField {
                side,
                field: ttl_field,
                message: format!("expected a number, got {}", other),
            })
        }
        None => {
            return Err(PayloadError::MalformedField {
                side,
                field: ttl_field,
                message: "missing".to_string(),
            })
        }
    };

    Ok(SecretSide {
        secret_value,
        ttl_seconds,
    })
}

fn optional_string(object: &Map<String, Value>, field: &str) -> Option<String> {
    object
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
