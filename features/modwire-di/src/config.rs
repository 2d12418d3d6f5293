use std::{fmt::Debug, future::Future, sync::Arc};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{
    factories::{BoxedFactory, FnFactory, ModuleFactory, SyncFactory},
    props::ModuleProps,
    types::{DynError, Injectable},
};

/// Arguments handed to a module builder, as an ordered JSON object
pub type Arguments = serde_json::Map<String, Value>;

/// The modules a module depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    /// Every dependency is exposed under its own name
    List(Vec<String>),
    /// Exposes the module named by the value under the key
    Renamed(IndexMap<String, String>),
}
impl DependencySpec {
    /// Pairs of (key in the dependency bundle, name of the module)
    pub fn bindings(&self) -> Vec<(&str, &str)> {
        match self {
            Self::List(names) => names.iter().map(|n| (n.as_str(), n.as_str())).collect(),
            Self::Renamed(map) => map.iter().map(|(k, n)| (k.as_str(), n.as_str())).collect(),
        }
    }

    /// Names of all referenced modules
    pub fn names(&self) -> Vec<String> {
        self.bindings()
            .into_iter()
            .map(|(_, name)| name.to_string())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::List(names) => names.is_empty(),
            Self::Renamed(map) => map.is_empty(),
        }
    }
}
impl From<Vec<String>> for DependencySpec {
    fn from(names: Vec<String>) -> Self {
        Self::List(names)
    }
}
impl<const N: usize> From<[&str; N]> for DependencySpec {
    fn from(names: [&str; N]) -> Self {
        Self::List(names.into_iter().map(str::to_string).collect())
    }
}
impl From<IndexMap<String, String>> for DependencySpec {
    fn from(map: IndexMap<String, String>) -> Self {
        Self::Renamed(map)
    }
}
impl<const N: usize> From<[(&str, &str); N]> for DependencySpec {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self::Renamed(
            pairs
                .into_iter()
                .map(|(key, name)| (key.to_string(), name.to_string()))
                .collect(),
        )
    }
}

/// Recipe for constructing a single module
///
/// Every field is optional so partial descriptors can be layered with
/// [`ConfigComposer`](crate::composer::ConfigComposer). A builder must be present once the
/// module is built.
#[derive(Clone, Default)]
pub struct ModuleConfig {
    pub arguments: Option<Arguments>,
    pub dependencies: Option<DependencySpec>,
    pub builder: Option<BoxedFactory>,
}
impl Debug for ModuleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleConfig")
            .field("arguments", &self.arguments)
            .field("dependencies", &self.dependencies)
            .field(
                "builder",
                &self.builder.as_ref().map(|builder| builder.supplies().type_name),
            )
            .finish()
    }
}
// Builders are equal if they are the same shared builder
impl PartialEq for ModuleConfig {
    fn eq(&self, other: &Self) -> bool {
        let same_builder = match (&self.builder, &other.builder) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_builder && self.arguments == other.arguments && self.dependencies == other.dependencies
    }
}

impl ModuleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an async function as builder
    pub fn builder<F, Fut, T, E>(self, builder: F) -> Self
    where
        F: Fn(ModuleProps) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Injectable,
        E: Into<DynError> + Send + 'static,
    {
        self.factory(FnFactory::new(builder))
    }

    /// Use a synchronous function as builder
    pub fn sync_builder<F, T, E>(self, builder: F) -> Self
    where
        F: Fn(ModuleProps) -> Result<T, E> + Send + Sync + 'static,
        T: Injectable,
        E: Into<DynError> + Send + 'static,
    {
        self.factory(SyncFactory::new(builder))
    }

    pub fn factory<Factory: ModuleFactory + 'static>(mut self, factory: Factory) -> Self {
        self.builder = Some(Arc::new(factory));
        self
    }

    /// Reuse an already shared builder
    pub fn shared_builder(mut self, builder: BoxedFactory) -> Self {
        self.builder = Some(builder);
        self
    }

    /// Set the arguments from a JSON object
    ///
    /// Any other JSON value is rejected with a warning and leaves the arguments as they were.
    pub fn arguments(mut self, arguments: Value) -> Self {
        match arguments {
            Value::Object(arguments) => self.arguments = Some(arguments),
            other => warn!("Ignoring module arguments which are not a JSON object: {}", other),
        }
        self
    }

    pub fn argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments
            .get_or_insert_with(Arguments::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn dependencies(mut self, dependencies: impl Into<DependencySpec>) -> Self {
        self.dependencies = Some(dependencies.into());
        self
    }
}

/// All modules to build, keyed by unique module name in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildConfig {
    modules: IndexMap<String, ModuleConfig>,
}
impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module, replacing any module with the same name
    pub fn module(mut self, name: impl Into<String>, module: ModuleConfig) -> Self {
        self.insert(name, module);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, module: ModuleConfig) -> Option<ModuleConfig> {
        self.modules.insert(name.into(), module)
    }

    pub fn get(&self, name: &str) -> Option<&ModuleConfig> {
        self.modules.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut ModuleConfig> {
        self.modules.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn modules(&self) -> impl Iterator<Item = (&String, &ModuleConfig)> {
        self.modules.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
impl<Name: Into<String>> FromIterator<(Name, ModuleConfig)> for BuildConfig {
    fn from_iter<I: IntoIterator<Item = (Name, ModuleConfig)>>(iter: I) -> Self {
        Self {
            modules: iter
                .into_iter()
                .map(|(name, module)| (name.into(), module))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn list_dependencies_bind_under_their_own_name() {
        let spec = DependencySpec::from(["b", "c"]);
        assert_eq!(spec.bindings(), [("b", "b"), ("c", "c")]);
        assert_eq!(spec.names(), ["b", "c"]);
    }

    #[test]
    fn renamed_dependencies_bind_under_the_key() {
        let spec = DependencySpec::from([("foo", "b"), ("bar", "c")]);
        assert_eq!(spec.bindings(), [("foo", "b"), ("bar", "c")]);
        assert_eq!(spec.names(), ["b", "c"]);
    }

    #[test]
    fn dependency_spec_deserializes_from_list_or_map() {
        let list: DependencySpec = serde_json::from_value(json!(["b", "c"])).unwrap();
        assert_eq!(list, DependencySpec::from(["b", "c"]));

        let renamed: DependencySpec = serde_json::from_value(json!({"foo": "b"})).unwrap();
        assert_eq!(renamed, DependencySpec::from([("foo", "b")]));
    }

    #[test]
    fn arguments_accept_objects_only() {
        let module = ModuleConfig::new().arguments(json!({"port": 8080}));
        assert_eq!(module.arguments, json!({"port": 8080}).as_object().cloned());

        let module = ModuleConfig::new().arguments(json!("not an object"));
        assert_eq!(module.arguments, None);

        let module = ModuleConfig::new()
            .argument("port", 8080)
            .arguments(json!([1]));
        assert_eq!(module.arguments, json!({"port": 8080}).as_object().cloned());
    }

    #[test]
    fn single_arguments_accumulate() {
        let module = ModuleConfig::new()
            .argument("host", "localhost")
            .argument("port", 8080);

        assert_eq!(
            module.arguments,
            json!({"host": "localhost", "port": 8080}).as_object().cloned()
        );
    }

    #[test]
    fn modules_keep_insertion_order() {
        let config = BuildConfig::new()
            .module("zeta", ModuleConfig::new())
            .module("alpha", ModuleConfig::new())
            .module("mid", ModuleConfig::new());

        assert_eq!(config.names().collect::<Vec<_>>(), ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn configs_compare_builders_by_identity() {
        let with_builder = ModuleConfig::new().sync_builder(|_| Ok::<_, DynError>(1_u8));
        let same = with_builder.clone();
        let other = ModuleConfig::new().sync_builder(|_| Ok::<_, DynError>(1_u8));

        assert_eq!(with_builder, same);
        assert_ne!(with_builder, other);
        assert_ne!(with_builder, ModuleConfig::new());
    }
}
