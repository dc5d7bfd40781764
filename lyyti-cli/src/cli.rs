//! Command-line surface and command dispatch.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lyyti_host::{PluginHost, ShortcodeAttributes, Viewer};
use provider_lyyti::admin::SETTINGS_PAGE_SLUG;
use provider_lyyti::{LyytiPlugin, Setting, PLUGIN_ID, SHORTCODE_TAG};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "lyyti-cli",
    version,
    about = "Render Lyyti participant counts and manage plugin settings",
    long_about = None
)]
pub struct Cli {
    /// Path to the configuration file (defaults to the XDG config directory)
    #[arg(long, global = true, env = "LYYTI_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install default settings without overwriting existing values
    Activate,
    /// Delete all plugin settings
    Deactivate,
    /// Expand shortcodes in a file (or stdin) and print the result
    Render {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,
    },
    /// Resolve a single participant count
    Count {
        /// Event id (defaults to the configured default event)
        #[arg(long)]
        eid: Option<String>,
        /// Comma-separated participant statuses (defaults to the configured filter)
        #[arg(long)]
        status: Option<String>,
    },
    /// Plugin settings
    Settings(SettingsArgs),
}

#[derive(Parser, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub action: SettingsCmd,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCmd {
    /// Print current settings (private key masked)
    Show,
    /// Print the rendered settings page
    Page,
    /// Save settings, e.g. `api_public_key=abc default_event_id=123`
    Set {
        /// NAME=VALUE pairs; NAME is a setting or option name
        #[arg(required = true, value_parser = parse_assignment)]
        values: Vec<(Setting, String)>,
    },
}

fn parse_assignment(raw: &str) -> Result<(Setting, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))?;
    let setting = Setting::from_name(name.trim()).ok_or_else(|| {
        let known: Vec<_> = Setting::ALL.iter().map(|s| s.key()).collect();
        format!("unknown setting `{name}` (known: {})", known.join(", "))
    })?;
    Ok((setting, value.to_string()))
}

fn mask(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        "*".repeat(8)
    }
}

/// A plugin host with the Lyyti plugin installed.
pub struct App {
    host: PluginHost,
    plugin: Arc<LyytiPlugin>,
    viewer: Viewer,
}

impl App {
    pub fn new(host: PluginHost, plugin: Arc<LyytiPlugin>) -> Self {
        Self {
            host,
            plugin,
            viewer: Viewer::administrator("cli"),
        }
    }

    /// Run a command, writing its output to `out`.
    pub async fn run(&self, command: Commands, out: &mut impl Write) -> Result<()> {
        match command {
            Commands::Activate => {
                self.host.activate(PLUGIN_ID)?;
                writeln!(out, "Activated {PLUGIN_ID}")?;
            }
            Commands::Deactivate => {
                self.host.deactivate(PLUGIN_ID)?;
                writeln!(out, "Deactivated {PLUGIN_ID}; settings removed")?;
            }
            Commands::Render { file } => {
                let content = match file {
                    Some(path) => std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                    None => {
                        let mut buf = String::new();
                        std::io::stdin()
                            .read_to_string(&mut buf)
                            .context("Failed to read stdin")?;
                        buf
                    }
                };
                write!(out, "{}", self.host.render_content(&content).await)?;
            }
            Commands::Count { eid, status } => {
                let mut attributes = ShortcodeAttributes::new();
                if let Some(eid) = eid {
                    attributes = attributes.with("eid", eid);
                }
                if let Some(status) = status {
                    attributes = attributes.with("status", status);
                }
                let Some(rendered) = self.host.render_shortcode(SHORTCODE_TAG, &attributes).await
                else {
                    bail!("Shortcode not registered: {SHORTCODE_TAG}");
                };
                writeln!(out, "{rendered}")?;
            }
            Commands::Settings(args) => self.run_settings(args.action, out)?,
        }
        Ok(())
    }

    fn run_settings(&self, action: SettingsCmd, out: &mut impl Write) -> Result<()> {
        match action {
            SettingsCmd::Show => {
                let settings = self.plugin.settings();
                for setting in Setting::ALL {
                    let value = settings.get(setting);
                    let value = match setting {
                        Setting::ApiPrivateKey => mask(&value),
                        _ => value,
                    };
                    writeln!(out, "{} = {:?}", setting.key(), value)?;
                }
            }
            SettingsCmd::Page => {
                let html = self
                    .host
                    .render_settings_page(SETTINGS_PAGE_SLUG, &self.viewer)?
                    .context("Settings page is not available to this user")?;
                write!(out, "{html}")?;
            }
            SettingsCmd::Set { values } => {
                let form: HashMap<String, String> = values
                    .into_iter()
                    .map(|(setting, value)| (setting.option_name().to_string(), value))
                    .collect();
                let written =
                    self.host
                        .submit_settings_page(SETTINGS_PAGE_SLUG, &self.viewer, &form)?;
                writeln!(out, "Saved {written} setting(s)")?;
            }
        }
        Ok(())
    }
}
