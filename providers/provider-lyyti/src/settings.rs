//! Plugin settings on top of the host option store.

use lyyti_host::{HostResult, OptionStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Cache lifetime used when the setting is empty or not a number.
pub const DEFAULT_CACHE_LIFETIME_SECS: u64 = 600;

/// Participant statuses counted when nothing else is configured.
pub const DEFAULT_STATUS_FILTER: &str = "reactedyes,show";

/// The settings owned by the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setting {
    ApiPublicKey,
    ApiPrivateKey,
    DefaultEventId,
    DefaultStatusFilter,
    CacheLifetimeSeconds,
}

impl Setting {
    pub const ALL: [Setting; 5] = [
        Setting::ApiPublicKey,
        Setting::ApiPrivateKey,
        Setting::DefaultEventId,
        Setting::DefaultStatusFilter,
        Setting::CacheLifetimeSeconds,
    ];

    /// Name of the backing option in the host store.
    pub fn option_name(self) -> &'static str {
        match self {
            Setting::ApiPublicKey => "lyyti_api_public_key",
            Setting::ApiPrivateKey => "lyyti_api_private_key",
            Setting::DefaultEventId => "lyyti_default_eid",
            Setting::DefaultStatusFilter => "lyyti_default_status",
            Setting::CacheLifetimeSeconds => "lyyti_cache_lifetime",
        }
    }

    /// Short name used on the command line and in logs.
    pub fn key(self) -> &'static str {
        match self {
            Setting::ApiPublicKey => "api_public_key",
            Setting::ApiPrivateKey => "api_private_key",
            Setting::DefaultEventId => "default_event_id",
            Setting::DefaultStatusFilter => "default_status_filter",
            Setting::CacheLifetimeSeconds => "cache_lifetime_seconds",
        }
    }

    /// Value written on activation.
    pub fn default_value(self) -> &'static str {
        match self {
            Setting::DefaultStatusFilter => DEFAULT_STATUS_FILTER,
            Setting::CacheLifetimeSeconds => "600",
            _ => "",
        }
    }

    /// Look up a setting by its short name or its option name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|setting| setting.key() == name || setting.option_name() == name)
    }
}

/// Typed access to the plugin settings.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn OptionStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn OptionStore>) -> Self {
        Self { store }
    }

    /// Read a setting, propagating storage errors.
    pub fn try_get(&self, setting: Setting) -> HostResult<Option<String>> {
        self.store.get(setting.option_name())
    }

    /// Read a setting. Missing values and storage failures read as empty.
    pub fn get(&self, setting: Setting) -> String {
        match self.try_get(setting) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!(setting = setting.key(), error = %e, "Failed to read setting");
                String::new()
            }
        }
    }

    pub fn set(&self, setting: Setting, value: &str) -> HostResult<()> {
        self.store.update(setting.option_name(), value)
    }

    pub fn delete(&self, setting: Setting) -> HostResult<bool> {
        self.store.delete(setting.option_name())
    }

    /// Create every setting that does not exist yet with its default value.
    ///
    /// Existing values are never overwritten. Returns how many were created.
    pub fn install_defaults(&self) -> HostResult<usize> {
        let mut created = 0;
        for setting in Setting::ALL {
            if self.store.add(setting.option_name(), setting.default_value())? {
                created += 1;
            }
        }
        info!(created, "Installed default settings");
        Ok(created)
    }

    /// Delete every setting.
    pub fn purge(&self) -> HostResult<()> {
        for setting in Setting::ALL {
            self.delete(setting)?;
        }
        info!("Removed all settings");
        Ok(())
    }

    /// Effective cache lifetime. `None` means entries never expire.
    pub fn cache_lifetime(&self) -> Option<Duration> {
        parse_cache_lifetime(&self.get(Setting::CacheLifetimeSeconds))
    }
}

/// Interpret the stored cache lifetime.
///
/// Empty or non-numeric values fall back to the default; `0` disables expiry.
pub fn parse_cache_lifetime(raw: &str) -> Option<Duration> {
    let seconds = raw
        .trim()
        .parse::<u64>()
        .unwrap_or(DEFAULT_CACHE_LIFETIME_SECS);
    if seconds == 0 {
        None
    } else {
        Some(Duration::from_secs(seconds))
    }
}
