//! Modwire DI builds a set of named modules from a declarative configuration.
//!
//! Every module is described by a [`ModuleConfig`]: its arguments, the modules it depends on
//! and a builder constructing it. The [`ModuleBuilder`] orders the modules so every
//! dependency is built before its dependents, constructs each module exactly once and hands
//! back a [`ModuleContainer`] with all instances.
//!
//! Configurations can be layered: overrides passed to [`ModuleBuilder::build`] are merged
//! into the base configuration by the [`ConfigComposer`] first.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use modwire_di::{BuildConfig, ModuleBuilder, ModuleConfig, ModuleProps};
//! use serde_json::json;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct Repository {
//!     database: Arc<Database>,
//! }
//!
//! let config = BuildConfig::new()
//!     .module(
//!         "repository",
//!         ModuleConfig::new()
//!             .dependencies([("db", "database")])
//!             .builder(|props: ModuleProps| async move {
//!                 let database = props.dependencies().get::<Database>("db")?;
//!                 Ok::<_, modwire_di::RequireError>(Repository { database })
//!             }),
//!     )
//!     .module(
//!         "database",
//!         ModuleConfig::new()
//!             .arguments(json!({"url": "postgres://localhost"}))
//!             .sync_builder(|props: ModuleProps| {
//!                 let url = props.argument::<String>("url")?;
//!                 Ok::<_, modwire_di::ArgumentError>(Database { url })
//!             }),
//!     );
//!
//! let overrides = BuildConfig::new().module(
//!     "database",
//!     ModuleConfig::new().arguments(json!({"url": "postgres://test"})),
//! );
//!
//! let modules =
//!     futures::executor::block_on(ModuleBuilder::new().build(&config, &[overrides])).unwrap();
//!
//! let repository = modules.require::<Repository>("repository").unwrap();
//! assert_eq!(repository.database.url, "postgres://test");
//! ```
//!
//! Modwire DI consists of the following components:
//!
//! 1. Dependency Graph - for ordering modules and detecting cycles
//! 2. Composer - for merging configuration layers
//! 3. Builder and Initiator - for constructing the modules and wiring their dependencies

pub mod builder;
pub mod composer;
pub mod config;
pub mod container;
pub mod dependency_graph;
pub mod errors;
pub mod factories;
pub(crate) mod initiator;
pub mod props;
pub mod types;

pub use builder::ModuleBuilder;
pub use composer::ConfigComposer;
pub use config::{Arguments, BuildConfig, DependencySpec, ModuleConfig};
pub use container::ModuleContainer;
pub use dependency_graph::{topological_sort, DependencyGraph, GraphError};
pub use errors::{ArgumentError, BuildError, ComposeError, RequireError};
pub use factories::{BoxedFactory, DynModuleFactory, ModuleFactory};
pub use props::{Dependencies, DependencySlot, ModuleProps};
pub use types::{DynError, Injectable, Instance, TypeInfo};
