//! Error types for the plugin host.

use thiserror::Error;

/// Errors raised by host extension points.
#[derive(Error, Debug)]
pub enum HostError {
    /// Plugin not installed in the host.
    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    /// A plugin with the same ID is already installed.
    #[error("Plugin already installed: {0}")]
    AlreadyInstalled(String),

    /// Caller lacks a capability required by the operation.
    #[error("Missing capability: {0}")]
    MissingCapability(String),

    /// Settings page slug is not registered.
    #[error("Settings page not found: {0}")]
    PageNotFound(String),

    /// Backing storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A page template failed to render.
    #[error("Render error: {0}")]
    Render(String),
}

/// Result type for host operations.
pub type HostResult<T> = std::result::Result<T, HostError>;
