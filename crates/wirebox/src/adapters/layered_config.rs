//! Layered in-memory configuration store.
//!
//! Values live in named layers; later layers take precedence over earlier
//! ones. A key written with `set_final` can never be overridden again — the
//! attempt is the "duplicate non-overrulable override" configuration failure.

use std::collections::{HashMap, HashSet};

use crate::domain::errors::ContainerError;
use crate::ports::configuration::ConfigSource;

struct Layer {
    name: String,
    values: HashMap<(String, String), String>,
}

/// Namespace + key configuration with layer precedence.
pub struct LayeredConfig {
    layers: Vec<Layer>,
    final_keys: HashSet<(String, String)>,
}

impl LayeredConfig {
    /// A store with a single `base` layer.
    pub fn new() -> Self {
        Self {
            layers: vec![Layer {
                name: "base".to_string(),
                values: HashMap::new(),
            }],
            final_keys: HashSet::new(),
        }
    }

    /// Add a layer that overrides everything below it. Subsequent writes
    /// target this layer.
    pub fn push_layer(&mut self, name: &str) {
        self.layers.push(Layer {
            name: name.to_string(),
            values: HashMap::new(),
        });
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    /// Write into the top layer.
    pub fn set(
        &mut self,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ContainerError> {
        let slot = (namespace.to_string(), key.to_string());
        if self.final_keys.contains(&slot) {
            return Err(ContainerError::Configuration(format!(
                "key `{namespace}:{key}` is final and cannot be overridden"
            )));
        }
        self.top().values.insert(slot, value.to_string());
        Ok(())
    }

    /// Write into the top layer and seal the key against later overrides.
    pub fn set_final(
        &mut self,
        namespace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), ContainerError> {
        self.set(namespace, key, value)?;
        self.final_keys
            .insert((namespace.to_string(), key.to_string()));
        Ok(())
    }

    fn top(&mut self) -> &mut Layer {
        self.layers.last_mut().expect("at least the base layer")
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for LayeredConfig {
    fn has_value(&self, namespace: &str, key: &str) -> bool {
        self.get_value(namespace, key).is_some()
    }

    fn get_value(&self, namespace: &str, key: &str) -> Option<String> {
        let slot = (namespace.to_string(), key.to_string());
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.values.get(&slot).cloned())
    }
}
