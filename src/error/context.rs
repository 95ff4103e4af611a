//! Error context for enriched error information.
//!
//! Context is attached to errors that cross a lifecycle boundary
//! (activation, catalog loading) so the operator log says which session
//! and which secret family they belong to.

use chrono::{DateTime, Utc};

/// Context information attached to errors for debugging.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    /// Human-readable description of the operation that failed.
    pub operation: String,

    /// Controller session the error belongs to, if any.
    pub session_id: Option<String>,

    /// Secret family (`passkeys` / `passwords`) the error belongs to, if any.
    pub family: Option<String>,

    /// Timestamp when the error occurred.
    pub timestamp: DateTime<Utc>,

    /// Optional component/module where the error originated.
    pub component: Option<String>,
}

impl ErrorContext {
    /// Create a new ErrorContext for an operation.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            session_id: None,
            family: None,
            timestamp: Utc::now(),
            component: None,
        }
    }

    /// Set the controller session id for this context.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Set the secret family for this context.
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    /// Set the component for this context.
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Get a formatted context string suitable for logging.
    pub fn to_log_string(&self) -> String {
        let mut parts = vec![format!("operation={}", self.operation)];

        if let Some(ref session_id) = self.session_id {
            parts.push(format!("session_id={}", session_id));
        }

        if let Some(ref family) = self.family {
            parts.push(format!("family={}", family));
        }

        if let Some(ref component) = self.component {
            parts.push(format!("component={}", component));
        }

        parts.push(format!("timestamp={}", self.timestamp.to_rfc3339()));

        parts.join(" ")
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new("unknown")
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.operation)?;

        if let Some(ref family) = self.family {
            write!(f, " family={}", family)?;
        }

        if let Some(ref session_id) = self.session_id {
            write!(f, " session={}", session_id)?;
        }

        Ok(())
    }
}
