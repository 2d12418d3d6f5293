use tracing::debug;

use crate::{
    composer::ConfigComposer, config::BuildConfig, container::ModuleContainer,
    errors::BuildError, initiator::ModuleInitiator,
};

//////////////////////////////////////////////////////////////////////
//
// Building consists of three parts.
// 1. The configuration and its override layers are merged
// 2. A build order is derived from the dependency graph
// 3. Every module is constructed in that order, receiving its dependencies

/// Builds all modules of a configuration
///
/// The builder keeps no state between builds, so one builder can be reused
/// for any number of configurations.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModuleBuilder;

impl ModuleBuilder {
    pub fn new() -> Self {
        ModuleBuilder
    }

    /// Merges `overrides` into `config` and builds every module
    pub async fn build(
        &self,
        config: &BuildConfig,
        overrides: &[BuildConfig],
    ) -> Result<ModuleContainer, BuildError> {
        debug!(
            "Building configuration with {} modules and {} override layers",
            config.len(),
            overrides.len()
        );

        let config = ConfigComposer::compose(config, overrides)?;
        ModuleInitiator::new().initiate(&config).await
    }

    /// Builds every module of `config` as it is
    pub async fn build_config(&self, config: &BuildConfig) -> Result<ModuleContainer, BuildError> {
        self.build(config, &[]).await
    }
}
