//! # provider-lyyti
//!
//! Lyyti participant count plugin.
//!
//! This plugin renders the number of participants of a Lyyti event in page
//! content through the `[lyyti-participant-count]` shortcode. Counts are
//! fetched from the signed Lyyti v2 API and cached in the host transient
//! cache.
//!
//! ## Features
//!
//! - `eid` and `status` shortcode attributes with configured defaults
//! - HMAC-SHA256 signed API requests
//! - Configurable cache lifetime
//! - Administrative settings page
//! - Defaults installed on activation, settings purged on deactivation

pub mod admin;
pub mod cache;
pub mod client;
pub mod resolver;
pub mod settings;

pub use cache::{cache_key, CountCache};
pub use client::{ApiError, Credentials, LyytiClient, DEFAULT_API_BASE_URL};
pub use resolver::{ParticipantCountShortcode, ResolveError};
pub use settings::{Setting, Settings};

use lyyti_host::{Hooks, HostResult, OptionStore, Plugin, TransientCache};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shortcode tag handled by the plugin.
pub const SHORTCODE_TAG: &str = "lyyti-participant-count";

/// Plugin identifier.
pub const PLUGIN_ID: &str = "lyyti-participant-counts";

// ============================================================================
// Configuration
// ============================================================================

/// Deployment configuration for the plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyytiConfig {
    /// Root of the Lyyti API
    pub api_base_url: String,
}

impl Default for LyytiConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

// ============================================================================
// Plugin
// ============================================================================

/// The Lyyti participant count plugin.
pub struct LyytiPlugin {
    settings: Settings,
    shortcode: Arc<ParticipantCountShortcode>,
}

impl LyytiPlugin {
    /// Create the plugin on top of host storage.
    pub fn new(
        options: Arc<dyn OptionStore>,
        transients: Arc<dyn TransientCache>,
        config: &LyytiConfig,
    ) -> Result<Self, ApiError> {
        let settings = Settings::new(options);
        let client = LyytiClient::new(config.api_base_url.clone())?;
        let shortcode =
            ParticipantCountShortcode::new(settings.clone(), CountCache::new(transients), client);

        Ok(Self {
            settings,
            shortcode: Arc::new(shortcode),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn shortcode(&self) -> &ParticipantCountShortcode {
        &self.shortcode
    }
}

impl Plugin for LyytiPlugin {
    fn id(&self) -> &str {
        PLUGIN_ID
    }

    fn name(&self) -> &str {
        "Lyyti Participant Counts"
    }

    fn register(&self, hooks: &mut Hooks) {
        hooks.add_shortcode(SHORTCODE_TAG, self.shortcode.clone());
        hooks.add_settings_page(admin::settings_page());
    }

    fn activate(&self) -> HostResult<()> {
        self.settings.install_defaults()?;
        Ok(())
    }

    fn deactivate(&self) -> HostResult<()> {
        self.settings.purge()
    }
}
