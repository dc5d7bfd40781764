//! Durable key-value option storage.
//!
//! Options are plain strings addressed by name. The host owns the storage;
//! plugins only see the [`OptionStore`] trait.

use crate::error::HostResult;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Key-value option storage provided by the host.
pub trait OptionStore: Send + Sync {
    /// Read an option. `None` means the option does not exist.
    fn get(&self, name: &str) -> HostResult<Option<String>>;

    /// Create an option only if it does not exist yet.
    ///
    /// Returns `true` if the option was created.
    fn add(&self, name: &str, value: &str) -> HostResult<bool>;

    /// Create or overwrite an option.
    fn update(&self, name: &str, value: &str) -> HostResult<()>;

    /// Delete an option.
    ///
    /// Returns `true` if the option existed.
    fn delete(&self, name: &str) -> HostResult<bool>;
}

/// In-memory option store, used by tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    options: RwLock<HashMap<String, String>>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored options.
    pub fn len(&self) -> usize {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OptionStore for MemoryOptionStore {
    fn get(&self, name: &str) -> HostResult<Option<String>> {
        let options = self.options.read().unwrap_or_else(PoisonError::into_inner);
        Ok(options.get(name).cloned())
    }

    fn add(&self, name: &str, value: &str) -> HostResult<bool> {
        let mut options = self.options.write().unwrap_or_else(PoisonError::into_inner);
        if options.contains_key(name) {
            return Ok(false);
        }
        options.insert(name.to_string(), value.to_string());
        Ok(true)
    }

    fn update(&self, name: &str, value: &str) -> HostResult<()> {
        let mut options = self.options.write().unwrap_or_else(PoisonError::into_inner);
        options.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, name: &str) -> HostResult<bool> {
        let mut options = self.options.write().unwrap_or_else(PoisonError::into_inner);
        Ok(options.remove(name).is_some())
    }
}
