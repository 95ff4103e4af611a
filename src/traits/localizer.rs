//! Localization capability injected into every component that shows text.

use tracing::warn;

/// Resolves symbolic text keys to localized strings.
pub trait Localizer: Send + Sync {
    /// Look a key up in the active language (with fallback), if present.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Translate a key, falling back to the key itself when no translation
    /// exists. A missing translation is logged, never fatal.
    fn translate(&self, key: &str) -> String {
        match self.lookup(key) {
            Some(text) => text,
            None => {
                warn!(key, "No translation found for the key");
                key.to_string()
            }
        }
    }
}
