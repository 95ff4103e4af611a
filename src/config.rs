//! Runtime configuration.
//!
//! Defaults, overridden by `PAIRSYNC_*` environment variables, overridden
//! in turn by command-line flags.
//!
//! # Example
//!
//! ```ignore
//! use pairsync::config::SyncConfig;
//!
//! let config = SyncConfig::from_env()?
//!     .with_user_id("42")
//!     .with_poll_interval(Duration::from_millis(500));
//! config.validate()?;
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::channel::ChannelClientConfig;
use crate::cli::RunOverrides;
use crate::countdown::DEFAULT_TOTAL_DURATION_SECS;
use crate::error::{SyncError, SyncResult};
use crate::localization::{CatalogSource, Language};
use crate::models::SecretFamily;
use crate::sync::{CountdownPolicy, DEFAULT_POLL_INTERVAL};

pub const ENV_URL: &str = "PAIRSYNC_URL";
pub const ENV_USER_ID: &str = "PAIRSYNC_USER_ID";
pub const ENV_FAMILY: &str = "PAIRSYNC_FAMILY";
pub const ENV_LOCALES: &str = "PAIRSYNC_LOCALES";
pub const ENV_LANG: &str = "PAIRSYNC_LANG";
pub const ENV_COUNTDOWN_POLICY: &str = "PAIRSYNC_COUNTDOWN_POLICY";
pub const ENV_POLL_MS: &str = "PAIRSYNC_POLL_MS";

/// Configuration of one pairsync process.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// WebSocket URL of the rotation server
    pub server_url: String,
    /// User whose secret pairs are displayed (required)
    pub user_id: Option<String>,
    /// Secret families to keep in sync, one controller each
    pub families: Vec<SecretFamily>,
    /// Where the message catalogs are loaded from
    pub locales: CatalogSource,
    /// Preferred language tag; the locale environment when unset
    pub language_preference: Option<String>,
    /// Cadence of pull requests
    pub poll_interval: Duration,
    /// Duration a full countdown circle represents
    pub countdown_total_secs: u32,
    /// Which countdowns an applied payload resets
    pub countdown_policy: CountdownPolicy,
    /// Reconnection attempts before giving up
    pub max_retries: u8,
    /// Upper bound of the reconnection backoff
    pub max_backoff_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let channel = ChannelClientConfig::default();
        Self {
            server_url: channel.url,
            user_id: None,
            families: SecretFamily::ALL.to_vec(),
            locales: CatalogSource::Directory(default_locales_dir()),
            language_preference: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            countdown_total_secs: DEFAULT_TOTAL_DURATION_SECS,
            countdown_policy: CountdownPolicy::default(),
            max_retries: channel.max_retries,
            max_backoff_secs: channel.max_backoff_secs,
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_families(mut self, families: Vec<SecretFamily>) -> Self {
        self.families = families;
        self
    }

    pub fn with_locales(mut self, locales: CatalogSource) -> Self {
        self.locales = locales;
        self
    }

    pub fn with_language_preference(mut self, tag: impl Into<String>) -> Self {
        self.language_preference = Some(tag.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_countdown_total_secs(mut self, secs: u32) -> Self {
        self.countdown_total_secs = secs;
        self
    }

    pub fn with_countdown_policy(mut self, policy: CountdownPolicy) -> Self {
        self.countdown_policy = policy;
        self
    }

    /// Defaults overridden by the `PAIRSYNC_*` environment variables.
    pub fn from_env() -> SyncResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> SyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(ENV_URL) {
            config.server_url = url;
        }
        if let Some(user_id) = get(ENV_USER_ID) {
            config.user_id = Some(user_id);
        }
        if let Some(families) = get(ENV_FAMILY) {
            config.families = parse_families(&families)?;
        }
        if let Some(locales) = get(ENV_LOCALES) {
            config.locales = CatalogSource::parse(&locales);
        }
        if let Some(lang) = get(ENV_LANG) {
            config.language_preference = Some(lang);
        }
        if let Some(policy) = get(ENV_COUNTDOWN_POLICY) {
            config.countdown_policy = policy
                .parse::<CountdownPolicy>()
                .map_err(SyncError::config)?;
        }
        if let Some(poll_ms) = get(ENV_POLL_MS) {
            let millis: u64 = poll_ms.trim().parse().map_err(|_| {
                SyncError::config(format!("{} must be a number of milliseconds", ENV_POLL_MS))
            })?;
            config.poll_interval = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, overrides: &RunOverrides) -> SyncResult<Self> {
        if let Some(ref url) = overrides.url {
            self.server_url = url.clone();
        }
        if let Some(ref user) = overrides.user_id {
            self.user_id = Some(user.clone());
        }
        if let Some(ref families) = overrides.families {
            self.families = parse_families(families)?;
        }
        if let Some(ref locales) = overrides.locales {
            self.locales = CatalogSource::parse(locales);
        }
        if let Some(ref lang) = overrides.language {
            self.language_preference = Some(lang.clone());
        }
        if let Some(ref policy) = overrides.policy {
            self.countdown_policy = policy
                .parse::<CountdownPolicy>()
                .map_err(SyncError::config)?;
        }
        Ok(self)
    }

    /// Check the configuration is complete and consistent.
    pub fn validate(&self) -> SyncResult<()> {
        match self.user_id.as_deref() {
            Some(id) if !id.trim().is_empty() => {}
            _ => {
                return Err(SyncError::config(format!(
                    "a user id is required ({} or --user)",
                    ENV_USER_ID
                )))
            }
        }
        if !(self.server_url.starts_with("ws://") || self.server_url.starts_with("wss://")) {
            return Err(SyncError::config(format!(
                "server url must be ws:// or wss://, got '{}'",
                self.server_url
            )));
        }
        if self.families.is_empty() {
            return Err(SyncError::config("at least one secret family is required"));
        }
        if self.poll_interval.is_zero() {
            return Err(SyncError::config("poll interval must be positive"));
        }
        if self.countdown_total_secs == 0 {
            return Err(SyncError::config("countdown duration must be positive"));
        }
        Ok(())
    }

    /// Language preference, falling back to the locale environment.
    pub fn effective_language_preference(&self) -> Option<String> {
        self.language_preference
            .clone()
            .or_else(Language::detect_preference)
    }

    /// Channel client settings derived from this configuration.
    pub fn channel_config(&self) -> ChannelClientConfig {
        ChannelClientConfig {
            url: self.server_url.clone(),
            max_retries: self.max_retries,
            max_backoff_secs: self.max_backoff_secs,
        }
    }
}

/// Parse `passkeys`, `passwords`, `all`, or a comma-separated list.
pub fn parse_families(value: &str) -> SyncResult<Vec<SecretFamily>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("all") || value.eq_ignore_ascii_case("both") {
        return Ok(SecretFamily::ALL.to_vec());
    }

    let mut families = Vec::new();
    for part in value.split(',').filter(|p| !p.trim().is_empty()) {
        let family = part
            .parse::<SecretFamily>()
            .map_err(SyncError::config)?;
        if !families.contains(&family) {
            families.push(family);
        }
    }
    if families.is_empty() {
        return Err(SyncError::config("no secret family given"));
    }
    Ok(families)
}

/// `./locales` when present, else the per-user data directory.
pub fn default_locales_dir() -> PathBuf {
    let local = Path::new("locales");
    if local.is_dir() {
        return local.to_path_buf();
    }
    dirs::data_dir()
        .map(|dir| dir.join("pairsync").join("locales"))
        .unwrap_or_else(|| local.to_path_buf())
}
