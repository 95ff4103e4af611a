//! Localization Gateway.
//!
//! Process-wide, independently lifecycled: the host initializes it once and
//! hands it to every component as an `Arc<dyn Localizer>`.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::{info, warn};

use super::catalog::{Catalog, CatalogSource};
use super::language::Language;
use crate::error::LocalizationError;
use crate::traits::{LocalizedDocument, Localizer};

/// Resolves symbolic keys against the French and English catalogs.
pub struct LocalizationGateway {
    catalogs: HashMap<Language, Catalog>,
    active: RwLock<Language>,
    fallback: Language,
}

impl LocalizationGateway {
    /// Load both catalogs concurrently and select the active language.
    ///
    /// Any catalog that fails to load or parse aborts initialization; the
    /// host decides whether to continue without translations.
    pub async fn initialize(
        source: &CatalogSource,
        preference: Option<&str>,
    ) -> Result<Self, LocalizationError> {
        let client = reqwest::Client::new();
        let (french, english) = futures::try_join!(
            source.load(&client, Language::French),
            source.load(&client, Language::English),
        )?;

        let active = Language::from_preference(preference);
        info!(
            source = %source,
            language = %active,
            "Localization initialized"
        );
        Ok(Self::from_catalogs([french, english], active))
    }

    /// Build a gateway from catalogs already in memory.
    pub fn from_catalogs(catalogs: impl IntoIterator<Item = Catalog>, active: Language) -> Self {
        Self {
            catalogs: catalogs
                .into_iter()
                .map(|catalog| (catalog.language(), catalog))
                .collect(),
            active: RwLock::new(active),
            fallback: Language::DEFAULT,
        }
    }

    pub fn active_language(&self) -> Language {
        *self.active.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn fallback_language(&self) -> Language {
        self.fallback
    }

    /// Switch the active language. Slots pick it up on their next update.
    pub fn set_language(&self, language: Language) {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        let previous = *active;
        if previous != language {
            *active = language;
            info!(from = %previous, to = %language, "Switched language");
        }
    }

    /// Rewrite every tagged label of `document`. Returns how many keys were
    /// translated; untranslated keys are left as they are.
    pub fn apply_to_document(&self, document: &dyn LocalizedDocument) -> usize {
        let mut translated = 0;
        for key in document.localized_keys() {
            match self.lookup(&key) {
                Some(text) => {
                    document.set_localized_text(&key, &text);
                    translated += 1;
                }
                None => self.report_missing(&key),
            }
        }
        translated
    }

    fn catalog_text(&self, language: Language, key: &str) -> Option<String> {
        self.catalogs
            .get(&language)
            .and_then(|catalog| catalog.get(key))
            .map(str::to_string)
    }

    fn report_missing(&self, key: &str) {
        let err = LocalizationError::MissingTranslation {
            key: key.to_string(),
        };
        warn!(
            language = %self.active_language(),
            error_code = err.error_code(),
            "{}",
            err
        );
    }
}

impl Localizer for LocalizationGateway {
    fn lookup(&self, key: &str) -> Option<String> {
        let active = self.active_language();
        self.catalog_text(active, key).or_else(|| {
            if active == self.fallback {
                None
            } else {
                self.catalog_text(self.fallback, key)
            }
        })
    }

    fn translate(&self, key: &str) -> String {
        match self.lookup(key) {
            Some(text) => text,
            None => {
                self.report_missing(key);
                key.to_string()
            }
        }
    }
}
