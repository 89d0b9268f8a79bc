//! In-memory attribute store.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`].  Stands in for the
//! host runtime's restore-state store in the simulation and in tests; a
//! real integration would persist the same namespaced strings.
//!
//! - Config validation: every save runs
//!   [`validate_config`](crate::config::validate_config) first.
//! - Namespace isolation: each subsystem uses its own namespace prefix.

use std::cell::RefCell;
use std::collections::HashMap;

use log::{debug, info};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::{FiltrationConfig, validate_config};

const CONFIG_NAMESPACE: &str = "iopool";
const CONFIG_KEY: &str = "options";

#[derive(Debug, Default)]
pub struct MemoryStore {
    store: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        debug!("MemoryStore: in-memory backend");
        Self::default()
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Every `(namespace::key, value)` pair, sorted.  For diagnostics.
    pub fn dump(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .store
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        entries
    }
}

impl ConfigPort for MemoryStore {
    fn load(&self) -> Result<FiltrationConfig, ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        let raw = self.store.borrow().get(&key).cloned().ok_or(ConfigError::NotFound)?;
        let config: FiltrationConfig =
            serde_json::from_str(&raw).map_err(|_| ConfigError::Corrupted)?;
        Ok(config.normalized())
    }

    fn save(&self, config: &FiltrationConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let raw = serde_json::to_string(config).map_err(|_| ConfigError::IoError)?;
        self.store
            .borrow_mut()
            .insert(Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY), raw);
        info!("MemoryStore: config saved");
        Ok(())
    }
}

impl StoragePort for MemoryStore {
    fn read(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .store
            .borrow()
            .get(&Self::composite_key(namespace, key))
            .cloned())
    }

    fn write(&mut self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        self.store
            .borrow_mut()
            .insert(Self::composite_key(namespace, key), value.to_owned());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store
            .borrow_mut()
            .remove(&Self::composite_key(namespace, key));
        Ok(())
    }
}
