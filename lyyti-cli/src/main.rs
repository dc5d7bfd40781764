//! # lyyti-cli
//!
//! Command-line host for the Lyyti participant count plugin.
//!
//! The host keeps plugin settings and cached counts in a local SQLite store
//! and expands `[lyyti-participant-count]` shortcodes in text.
//!
//! ## Configuration
//!
//! The host reads configuration from `$XDG_CONFIG_HOME/lyyti/config.toml`,
//! or from the file given with `--config-file`.
//!
//! ## Running
//!
//! ```bash
//! lyyti-cli activate
//! lyyti-cli settings set api_public_key=... api_private_key=... default_event_id=123
//! echo 'Attending: [lyyti-participant-count]' | lyyti-cli render
//!
//! # With debug logging
//! RUST_LOG=debug lyyti-cli count --eid 123
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use lyyti_cli::cli::Cli;
use lyyti_cli::config::Config;
use lyyti_cli::store::SqliteStore;

fn init_logging(log_level: &str) -> Result<()> {
    let level: LevelFilter = log_level
        .parse()
        .with_context(|| format!("Invalid log level: {log_level}"))?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!("Failed to install tracing subscriber: {err}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config_file {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    init_logging(&config.host.log_level)?;
    debug!("Starting lyyti-cli v{}", env!("CARGO_PKG_VERSION"));

    let store_path = config.store_path()?;
    let store = Arc::new(SqliteStore::open_at(&store_path)?);
    if let Err(e) = store.purge_expired() {
        warn!("Failed to purge expired cache entries: {}", e);
    }

    let app = lyyti_cli::build_app(&config, store)?;
    let mut stdout = std::io::stdout().lock();
    app.run(cli.command, &mut stdout).await
}
