use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, error, trace};

use crate::{
    config::{BuildConfig, DependencySpec},
    container::ModuleContainer,
    dependency_graph::DependencyGraph,
    errors::BuildError,
    props::{Dependencies, DependencySlot, ModuleProps},
    types::Instance,
};

/// Builds the modules of one configuration
///
/// Holds the state of a single build, a new initiator is used for every build.
pub(crate) struct ModuleInitiator {
    /// All built modules
    modules: ModuleContainer,
    /// Dependents waiting for a module which has not been built yet
    pending: IndexMap<String, Vec<PendingDependent>>,
}

/// A dependency slot of `consumer`, exposed under `key`, waiting to be filled
struct PendingDependent {
    consumer: String,
    key: String,
    slot: DependencySlot,
}

impl ModuleInitiator {
    pub(crate) fn new() -> ModuleInitiator {
        ModuleInitiator {
            modules: ModuleContainer::default(),
            pending: IndexMap::new(),
        }
    }

    /// Builds every module in dependency order, one after the other
    pub(crate) async fn initiate(mut self, config: &BuildConfig) -> Result<ModuleContainer, BuildError> {
        let graph = DependencyGraph::from_config(config);
        let order = graph.sort()?;

        debug!("Building {} modules in order {:?}", order.len(), order);

        for (index, name) in order.iter().enumerate() {
            let Some(module) = config.get(name) else {
                return Err(BuildError::MissingBuilder(name.clone()));
            };
            let Some(builder) = module.builder.clone() else {
                error!("Module '{}' has no builder", name);
                return Err(BuildError::MissingBuilder(name.clone()));
            };

            let dependencies = self.resolve_dependencies(name, module.dependencies.as_ref());
            let arguments = module.arguments.clone().unwrap_or_default();
            let props = ModuleProps::new(name.clone(), arguments, dependencies.clone());

            trace!("Constructing module '{}' [{} of {}]", name, index + 1, order.len());
            let instance = match builder.construct(props).await {
                Ok(instance) => instance,
                // Everything configured is built before its dependents, so an empty slot
                // means the module it waits for does not exist
                Err(error) if !dependencies.is_resolved() => {
                    let missing = absent_dependencies(&graph, &order);
                    error!(
                        "Builder for module '{}' failed without its dependencies {:?}: {}",
                        name, missing, error
                    );
                    return Err(BuildError::MissingDependency(missing));
                }
                Err(error) => {
                    error!("Builder for module '{}' failed: {}", name, error);
                    return Err(BuildError::BuilderFailed {
                        module: name.clone(),
                        error: Arc::new(error),
                    });
                }
            };

            debug!("Constructed module '{}' as {}", name, instance.info.type_name);
            self.register(name.clone(), instance);
        }

        self.finish()
    }

    /// Collects the dependency bundle for `consumer`
    ///
    /// Built dependencies are bound right away, all others get an empty slot which is
    /// filled once the dependency is registered.
    fn resolve_dependencies(&mut self, consumer: &str, spec: Option<&DependencySpec>) -> Dependencies {
        let mut dependencies = Dependencies::default();

        for (key, name) in spec.map(DependencySpec::bindings).unwrap_or_default() {
            if let Some(instance) = self.modules.get(name) {
                dependencies.insert(key, DependencySlot::filled(instance.clone()));
                continue;
            }

            trace!("Module '{}' waits for '{}' as '{}'", consumer, name, key);
            let slot = DependencySlot::default();
            dependencies.insert(key, slot.clone());
            self.pending
                .entry(name.to_string())
                .or_default()
                .push(PendingDependent {
                    consumer: consumer.to_string(),
                    key: key.to_string(),
                    slot,
                });
        }

        dependencies
    }

    /// Adds a built module and hands it to everything waiting for it
    fn register(&mut self, name: String, instance: Instance) {
        for waiter in self.pending.shift_remove(&name).into_iter().flatten() {
            trace!(
                "Injecting '{}' into '{}' as '{}'",
                name,
                waiter.consumer,
                waiter.key
            );
            let filled = waiter.slot.fill(instance.clone());
            debug_assert!(filled, "dependency slots are only filled once");
        }

        self.modules.insert(name, instance);
    }

    fn finish(self) -> Result<ModuleContainer, BuildError> {
        if !self.pending.is_empty() {
            let missing: Vec<String> = self.pending.into_keys().collect();
            error!("Dependencies could not be found: {:?}", missing);
            return Err(BuildError::MissingDependency(missing));
        }

        debug!("All {} modules built", self.modules.len());
        Ok(self.modules)
    }
}

/// Every dependency which is not configured, in the order the build requests it
fn absent_dependencies(graph: &DependencyGraph, order: &[String]) -> Vec<String> {
    let mut absent = IndexSet::new();
    for name in order {
        for dependency in graph.dependencies_of(name).unwrap_or_default() {
            if graph.dependencies_of(dependency).is_none() {
                absent.insert(dependency.clone());
            }
        }
    }
    absent.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use futures::executor::block_on;

    use super::*;
    use crate::{config::ModuleConfig, errors::RequireError};

    #[test]
    fn late_modules_fill_waiting_slots() {
        let mut initiator = ModuleInitiator::new();

        let spec = DependencySpec::from([("store", "database")]);
        let dependencies = initiator.resolve_dependencies("repository", Some(&spec));
        assert_eq!(
            dependencies.get::<String>("store").unwrap_err(),
            RequireError::Pending("store".to_string())
        );

        initiator.register("database".to_string(), Instance::new("postgres".to_string()));

        assert_eq!(*dependencies.get::<String>("store").unwrap(), "postgres");
        assert!(initiator.pending.is_empty());
        assert!(initiator.finish().is_ok());
    }

    #[test]
    fn unresolved_waiters_are_missing_dependencies() {
        let mut initiator = ModuleInitiator::new();

        let spec = DependencySpec::from(["b", "c", "b"]);
        initiator.resolve_dependencies("a", Some(&spec));
        initiator.resolve_dependencies("d", Some(&DependencySpec::from(["c"])));

        assert_eq!(initiator.pending["c"].len(), 2);
        let Err(BuildError::MissingDependency(missing)) = initiator.finish() else {
            panic!("expected missing dependencies");
        };
        assert_eq!(missing, ["b", "c"]);
    }

    #[test]
    fn absent_dependencies_follow_the_build_order() {
        let graph: DependencyGraph = [
            ("a".to_string(), vec!["c".to_string(), "x".to_string()]),
            ("c".to_string(), vec!["y".to_string(), "x".to_string()]),
        ]
        .into_iter()
        .collect();

        let order = graph.sort().unwrap();
        assert_eq!(order, ["c", "a"]);
        assert_eq!(absent_dependencies(&graph, &order), ["y", "x"]);
    }

    #[test]
    fn modules_without_dependencies_get_an_empty_bundle() {
        let config = BuildConfig::new().module(
            "a",
            ModuleConfig::new().sync_builder(|props: ModuleProps| {
                Ok::<_, Infallible>(props.dependencies().len())
            }),
        );

        let modules = block_on(ModuleInitiator::new().initiate(&config)).unwrap();
        assert_eq!(*modules.require::<usize>("a").unwrap(), 0);
    }
}
