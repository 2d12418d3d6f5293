use std::{
    any::type_name,
    fmt::Debug,
    sync::{Arc, OnceLock},
};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    config::Arguments,
    errors::{ArgumentError, RequireError},
    types::{Injectable, Instance},
};

/// Everything a builder receives: the module's arguments and its resolved dependencies
#[derive(Debug, Clone)]
pub struct ModuleProps {
    module: String,
    arguments: Arguments,
    dependencies: Dependencies,
}

impl ModuleProps {
    pub(crate) fn new(module: String, arguments: Arguments, dependencies: Dependencies) -> Self {
        Self {
            module,
            arguments,
            dependencies,
        }
    }

    /// Name of the module being built
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Reads a single argument into a typed value
    pub fn argument<T: DeserializeOwned>(&self, key: &str) -> Result<T, ArgumentError> {
        let value = self
            .arguments
            .get(key)
            .ok_or_else(|| ArgumentError::Missing(key.to_string()))?;

        serde_json::from_value(value.clone()).map_err(|e| ArgumentError::Invalid {
            key: key.to_string(),
            source: Arc::new(e),
        })
    }

    /// Reads all arguments into a typed shape
    pub fn arguments_as<T: DeserializeOwned>(&self) -> Result<T, ArgumentError> {
        serde_json::from_value(Value::Object(self.arguments.clone()))
            .map_err(|e| ArgumentError::Malformed(Arc::new(e)))
    }

    pub fn into_parts(self) -> (Arguments, Dependencies) {
        (self.arguments, self.dependencies)
    }
}

/// Write-once cell for a dependency
///
/// Filled immediately if the dependency was already built, otherwise once it is.
/// Clones share the same cell.
#[derive(Clone, Default)]
pub struct DependencySlot(Arc<OnceLock<Instance>>);
impl Debug for DependencySlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.get() {
            Some(instance) => f.debug_tuple("DependencySlot").field(instance).finish(),
            None => f.debug_tuple("DependencySlot").field(&"pending").finish(),
        }
    }
}
impl DependencySlot {
    pub(crate) fn filled(instance: Instance) -> Self {
        Self(Arc::new(OnceLock::from(instance)))
    }

    /// Fills the slot - returns false if it already held an instance
    pub(crate) fn fill(&self, instance: Instance) -> bool {
        self.0.set(instance).is_ok()
    }

    pub fn get(&self) -> Option<&Instance> {
        self.0.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.0.get().is_some()
    }
}

/// The dependency bundle of a module, keyed by the name the module sees them under
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    slots: IndexMap<String, DependencySlot>,
}

impl Dependencies {
    pub(crate) fn insert(&mut self, key: impl Into<String>, slot: DependencySlot) {
        self.slots.insert(key.into(), slot);
    }

    /// Attempts to get the dependency under `key` as `T`
    pub fn get<T: Injectable>(&self, key: &str) -> Result<Arc<T>, RequireError> {
        self.instance(key)?
            .downcast()
            .map_err(|actual_type| RequireError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    /// Attempts to get the erased dependency under `key`
    pub fn instance(&self, key: &str) -> Result<&Instance, RequireError> {
        let slot = self
            .slots
            .get(key)
            .ok_or_else(|| RequireError::Missing(key.to_string()))?;

        slot.get()
            .ok_or_else(|| RequireError::Pending(key.to_string()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// True once every dependency has been built
    pub fn is_resolved(&self) -> bool {
        self.slots.values().all(DependencySlot::is_resolved)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
