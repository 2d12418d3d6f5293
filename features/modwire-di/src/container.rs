use std::{any::type_name, fmt::Debug, sync::Arc};

use indexmap::IndexMap;

use crate::{
    errors::RequireError,
    types::{Injectable, Instance},
};

/// Container holding all built modules, in build order
#[derive(Clone, Default)]
pub struct ModuleContainer {
    instances: IndexMap<String, Instance>,
}
impl Debug for ModuleContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("ModuleContainer");
        for (name, instance) in &self.instances {
            map.field(name, &instance.info.type_name);
        }
        map.finish()
    }
}

impl ModuleContainer {
    pub(crate) fn insert(&mut self, name: String, instance: Instance) {
        self.instances.insert(name, instance);
    }

    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.instances.get(name)
    }

    /// Attempts to get the module `name` as `T`
    pub fn require<T: Injectable>(&self, name: &str) -> Result<Arc<T>, RequireError> {
        let instance = self
            .get(name)
            .ok_or_else(|| RequireError::Missing(name.to_string()))?;

        instance
            .downcast()
            .map_err(|actual_type| RequireError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type,
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    /// Module names in the order they were built
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instances.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.instances
            .iter()
            .map(|(name, instance)| (name.as_str(), instance))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
