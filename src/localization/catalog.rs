//! Message catalogs and where to load them from.
//!
//! A catalog is a `messages.json` file mapping each key to an entry:
//!
//! ```json
//! { "updating": { "message": "Updating..." } }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::language::Language;
use crate::error::LocalizationError;

const CATALOG_FILE: &str = "messages.json";

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    message: String,
}

/// Translations of one language.
#[derive(Debug, Clone)]
pub struct Catalog {
    language: Language,
    messages: HashMap<String, String>,
}

impl Catalog {
    /// Parse a `messages.json` document.
    pub fn parse(language: Language, text: &str) -> Result<Self, LocalizationError> {
        let entries: HashMap<String, CatalogEntry> =
            serde_json::from_str(text).map_err(|e| LocalizationError::InvalidCatalog {
                language: language.code().to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            language,
            messages: entries
                .into_iter()
                .map(|(key, entry)| (key, entry.message))
                .collect(),
        })
    }

    pub fn from_messages<K, V>(language: Language, messages: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            language,
            messages: messages
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Location of the catalogs: `<root>/<locale_dir>/messages.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// A local directory.
    Directory(PathBuf),
    /// A base URL served over HTTP(S).
    Remote(String),
}

impl CatalogSource {
    /// Parse a location: `http(s)://` URLs are remote, anything else a path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            CatalogSource::Remote(location.trim_end_matches('/').to_string())
        } else {
            CatalogSource::Directory(PathBuf::from(location))
        }
    }

    /// Where the catalog of `language` lives.
    pub fn location(&self, language: Language) -> String {
        match self {
            CatalogSource::Directory(root) => catalog_path(root, language).display().to_string(),
            CatalogSource::Remote(base) => format!(
                "{}/{}/{}",
                base.trim_end_matches('/'),
                language.locale_dir(),
                CATALOG_FILE
            ),
        }
    }

    /// Load the catalog of `language`.
    pub async fn load(
        &self,
        client: &reqwest::Client,
        language: Language,
    ) -> Result<Catalog, LocalizationError> {
        let text = match self {
            CatalogSource::Directory(root) => {
                let path = catalog_path(root, language);
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| LocalizationError::CatalogRead {
                        path: path.clone(),
                        message: e.to_string(),
                    })?
            }
            CatalogSource::Remote(_) => {
                let url = self.location(language);
                fetch(client, &url)
                    .await
                    .map_err(|e| LocalizationError::CatalogFetch {
                        url: url.clone(),
                        message: e.to_string(),
                    })?
            }
        };

        let catalog = Catalog::parse(language, &text)?;
        debug!(
            language = %language,
            entries = catalog.len(),
            location = %self.location(language),
            "Loaded catalog"
        );
        Ok(catalog)
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Directory(root) => write!(f, "{}", root.display()),
            CatalogSource::Remote(base) => f.write_str(base),
        }
    }
}

fn catalog_path(root: &Path, language: Language) -> PathBuf {
    root.join(language.locale_dir()).join(CATALOG_FILE)
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    client.get(url).send().await?.error_for_status()?.text().await
}
