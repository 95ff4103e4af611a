//! Stub localizer for testing.

use std::collections::HashMap;

use crate::traits::Localizer;

/// Localizer backed by a fixed key/text map.
///
/// Keys without an entry translate to themselves, like a real gateway with
/// a missing translation.
#[derive(Debug, Clone, Default)]
pub struct StubLocalizer {
    messages: HashMap<String, String>,
}

impl StubLocalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a translation.
    pub fn with(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.messages.insert(key.into(), text.into());
        self
    }
}

impl Localizer for StubLocalizer {
    fn lookup(&self, key: &str) -> Option<String> {
        self.messages.get(key).cloned()
    }
}
