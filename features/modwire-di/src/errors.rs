use std::sync::Arc;

use thiserror::Error;

use crate::{dependency_graph::GraphError, types::DynError};

/// Errors while building the modules of a configuration
#[derive(Error, Debug, Clone)]
pub enum BuildError {
    /// There are issues with the dependency graph
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Merging the override layers failed
    #[error(transparent)]
    Compose(#[from] ComposeError),

    /// A module has no builder to construct it with
    #[error("builder could not found for module: {0}")]
    MissingBuilder(String),

    /// Modules were requested as dependencies but never configured
    #[error("the following dependencies could not be found: {}", .0.join(","))]
    MissingDependency(Vec<String>),

    /// A builder returned an error
    #[error("builder for module '{module}' failed - error: {error}")]
    BuilderFailed {
        module: String,
        error: Arc<DynError>,
    },
}

/// Errors while merging configuration layers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("couldn't find a module with name: {0}")]
    ModuleConfigNotFound(String),
}

/// Errors when trying to require a module instance
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequireError {
    /// Nothing is known under the requested name
    #[error("no module is known as '{0}'")]
    Missing(String),

    /// The dependency is declared, but its module has not been built yet
    #[error("dependency '{0}' has not been built yet")]
    Pending(String),

    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },
}

/// Errors when reading module arguments into typed values
#[derive(Error, Debug, Clone)]
pub enum ArgumentError {
    #[error("argument '{0}' is not configured")]
    Missing(String),

    #[error("argument '{key}' could not be read: {source}")]
    Invalid {
        key: String,
        source: Arc<serde_json::Error>,
    },

    #[error("arguments could not be read: {0}")]
    Malformed(Arc<serde_json::Error>),
}
