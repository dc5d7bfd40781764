//! Capability model used to gate administrative surfaces.
//!
//! Every viewer of a host page carries a set of capabilities. Settings pages
//! declare the capability they require, and the host refuses to render or
//! persist them for viewers that lack it.

use std::collections::HashSet;

/// A capability a viewer may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read published content.
    Read,

    /// Change site-wide options and plugin settings.
    ManageOptions,

    /// Activate and deactivate plugins.
    ActivatePlugins,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::ManageOptions => "manage_options",
            Capability::ActivatePlugins => "activate_plugins",
        }
    }
}

/// A set of capabilities.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    capabilities: HashSet<Capability>,
}

impl CapabilitySet {
    /// Check if the set contains a capability.
    pub fn has(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        Self {
            capabilities: iter.into_iter().collect(),
        }
    }
}

/// The identity a page is rendered for.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub name: String,
    pub capabilities: CapabilitySet,
}

impl Viewer {
    /// An anonymous visitor that may only read content.
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".to_string(),
            capabilities: [Capability::Read].into_iter().collect(),
        }
    }

    /// A site administrator holding every built-in capability.
    pub fn administrator(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: [
                Capability::Read,
                Capability::ManageOptions,
                Capability::ActivatePlugins,
            ]
            .into_iter()
            .collect(),
        }
    }

    /// Check whether this viewer holds `cap`.
    pub fn can(&self, cap: &Capability) -> bool {
        self.capabilities.has(cap)
    }
}
