//! # lyyti-host
//!
//! Host extension points for content plugins.
//!
//! This crate provides the services a plugin binds to:
//! - [`OptionStore`] - durable key-value settings
//! - [`TransientCache`] - expiring key-value cache
//! - [`ShortcodeRegistry`] - placeholder expansion in content
//! - [`SettingsPage`] - capability-gated settings forms
//! - [`PluginHost`] - the single registration point for plugins
//!
//! In-memory implementations of the storage traits are included; durable
//! backends live in the host binary.

pub mod capability;
pub mod error;
pub mod options;
pub mod plugin;
pub mod settings_page;
pub mod shortcode;
pub mod transient;

pub use capability::{Capability, CapabilitySet, Viewer};
pub use error::{HostError, HostResult};
pub use options::{MemoryOptionStore, OptionStore};
pub use plugin::{Hooks, Plugin, PluginHost};
pub use settings_page::{SettingsField, SettingsPage, SettingsSection};
pub use shortcode::{ShortcodeAttributes, ShortcodeHandler, ShortcodeRegistry};
pub use transient::{MemoryTransientCache, TransientCache};
