//! Supported display languages and preference detection.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::LocalizationError;

/// Environment variables consulted for the preferred language, in order.
const LOCALE_ENV_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// A language with a message catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    French,
    English,
}

impl Language {
    /// Default and fallback language.
    pub const DEFAULT: Language = Language::English;

    pub const SUPPORTED: [Language; 2] = [Language::French, Language::English];

    /// Primary language subtag.
    pub fn code(&self) -> &'static str {
        match self {
            Language::French => "fr",
            Language::English => "en",
        }
    }

    /// Directory holding this language's `messages.json`.
    pub fn locale_dir(&self) -> &'static str {
        match self {
            Language::French => "fr_FR",
            Language::English => "en",
        }
    }

    /// Match a browser-style (`fr-FR`) or POSIX-style (`fr_FR.UTF-8`) tag
    /// on its primary subtag.
    pub fn from_tag(tag: &str) -> Option<Language> {
        let primary = tag
            .trim()
            .split(['-', '_', '.', '@'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        Language::SUPPORTED
            .into_iter()
            .find(|language| language.code() == primary)
    }

    /// Select the active language from a preference, falling back to the
    /// default when the preference is absent or unsupported.
    pub fn from_preference(preference: Option<&str>) -> Language {
        match preference.and_then(Language::from_tag) {
            Some(language) => language,
            None => {
                debug!(
                    preference = preference.unwrap_or("<none>"),
                    fallback = %Language::DEFAULT,
                    "Preferred language unsupported, using default"
                );
                Language::DEFAULT
            }
        }
    }

    /// Preferred language tag from the process locale environment.
    pub fn detect_preference() -> Option<String> {
        LOCALE_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty() && value != "C" && value != "POSIX")
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = LocalizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_tag(s).ok_or_else(|| LocalizationError::UnsupportedLanguage {
            tag: s.to_string(),
        })
    }
}
