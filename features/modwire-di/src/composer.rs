use std::borrow::Cow;

use tracing::trace;

use crate::{
    config::{BuildConfig, ModuleConfig},
    errors::ComposeError,
};

/// Merges layered configurations into the one that gets built
///
/// Layers are applied left to right, so the last layer touching a field wins:
/// - modules unknown so far are taken over as they are
/// - a `builder` replaces the previous one
/// - `arguments` are merged key by key, one level deep
/// - `dependencies` replace the previous ones
pub struct ConfigComposer;

impl ConfigComposer {
    /// Applies every override on top of `base`
    ///
    /// Without overrides `base` itself is returned, no copy is made.
    pub fn compose<'a>(
        base: &'a BuildConfig,
        overrides: &[BuildConfig],
    ) -> Result<Cow<'a, BuildConfig>, ComposeError> {
        if overrides.is_empty() {
            return Ok(Cow::Borrowed(base));
        }

        let mut result = base.clone();
        for (layer, config) in overrides.iter().enumerate() {
            trace!("Applying override layer {} with {} modules", layer, config.len());

            for (name, module) in config.modules() {
                if !result.contains(name) {
                    result.insert(name.clone(), module.clone());
                    continue;
                }

                let existing = result
                    .get_mut(name)
                    .ok_or_else(|| ComposeError::ModuleConfigNotFound(name.clone()))?;
                merge_module(existing, module);
            }
        }

        Ok(Cow::Owned(result))
    }
}

fn merge_module(existing: &mut ModuleConfig, layer: &ModuleConfig) {
    if let Some(builder) = &layer.builder {
        existing.builder = Some(builder.clone());
    }

    if let Some(arguments) = &layer.arguments {
        match &mut existing.arguments {
            Some(current) => {
                for (key, value) in arguments {
                    current.insert(key.clone(), value.clone());
                }
            }
            None => existing.arguments = Some(arguments.clone()),
        }
    }

    if let Some(dependencies) = &layer.dependencies {
        existing.dependencies = Some(dependencies.clone());
    }
}
