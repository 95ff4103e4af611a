//! Localization error types.
//!
//! Catalog load failures are fatal to initialization and are returned to
//! the caller. A missing translation is never fatal; the variant exists so
//! it can be reported with the same codes as everything else.

use std::fmt;
use std::path::PathBuf;

/// Localization-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalizationError {
    /// A catalog file could not be read from disk.
    CatalogRead { path: PathBuf, message: String },

    /// A catalog could not be fetched over HTTP.
    CatalogFetch { url: String, message: String },

    /// A catalog was fetched but is not a valid messages file.
    InvalidCatalog { language: String, message: String },

    /// The language tag is not one of the supported languages.
    UnsupportedLanguage { tag: String },

    /// No translation exists for a key in the active or fallback language.
    MissingTranslation { key: String },
}

impl LocalizationError {
    /// Whether this error must abort localization initialization.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LocalizationError::MissingTranslation { .. })
    }

    /// Get an operator-facing error message.
    pub fn user_message(&self) -> String {
        match self {
            LocalizationError::CatalogRead { path, .. } => {
                format!("Could not read translation catalog {}.", path.display())
            }
            LocalizationError::CatalogFetch { url, .. } => {
                format!("Could not download translation catalog from {}.", url)
            }
            LocalizationError::InvalidCatalog { language, .. } => {
                format!("The '{}' translation catalog is not valid.", language)
            }
            LocalizationError::UnsupportedLanguage { tag } => {
                format!("Language '{}' is not supported.", tag)
            }
            LocalizationError::MissingTranslation { key } => {
                format!("No translation found for the key: {}", key)
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            LocalizationError::CatalogRead { .. } => "E_I18N_READ",
            LocalizationError::CatalogFetch { .. } => "E_I18N_FETCH",
            LocalizationError::InvalidCatalog { .. } => "E_I18N_CATALOG",
            LocalizationError::UnsupportedLanguage { .. } => "E_I18N_LANG",
            LocalizationError::MissingTranslation { .. } => "E_I18N_MISSING",
        }
    }
}

impl fmt::Display for LocalizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalizationError::CatalogRead { path, message } => {
                write!(f, "Failed to read catalog {}: {}", path.display(), message)
            }
            LocalizationError::CatalogFetch { url, message } => {
                write!(f, "Failed to fetch catalog {}: {}", url, message)
            }
            LocalizationError::InvalidCatalog { language, message } => {
                write!(f, "Invalid catalog for {}: {}", language, message)
            }
            LocalizationError::UnsupportedLanguage { tag } => {
                write!(f, "Unsupported language: {}", tag)
            }
            LocalizationError::MissingTranslation { key } => {
                write!(f, "Missing translation: {}", key)
            }
        }
    }
}

impl std::error::Error for LocalizationError {}
