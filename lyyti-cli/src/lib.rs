//! Lyyti host library
//!
//! This module exports the internal components of the command-line host for
//! testing purposes.

pub mod cli;
pub mod config;
pub mod store;

use anyhow::{Context, Result};
use lyyti_host::PluginHost;
use provider_lyyti::LyytiPlugin;
use std::sync::Arc;

use crate::cli::App;
use crate::config::Config;
use crate::store::SqliteStore;

/// Build a plugin host on `store` and install the Lyyti plugin into it.
pub fn build_app(config: &Config, store: Arc<SqliteStore>) -> Result<App> {
    let mut host = PluginHost::new(store.clone(), store);
    let plugin = Arc::new(
        LyytiPlugin::new(host.options(), host.transients(), &config.lyyti)
            .context("Failed to create Lyyti plugin")?,
    );
    host.install(plugin.clone())?;
    Ok(App::new(host, plugin))
}
