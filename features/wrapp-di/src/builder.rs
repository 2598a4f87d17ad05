use std::borrow::Cow;

use crate::{
    component::{ComponentDef, Registration},
    container::DiContainer,
    dependency_graph::{DependencyGraph, DependencyGraphErrors},
    errors::InitError,
    factories::InstanceFactory,
    types::{DeploymentMode, DynError, Injectable},
};

/// Collects all components of a container before it is built
///
/// Building validates the dependency graph and, in [DeploymentMode::Cold], constructs every
/// component right away.
pub struct DiBuilder {
    /// Registered components in registration order
    pub(crate) registered_components: Vec<ComponentDef>,
    pub(crate) mode: DeploymentMode,
}
impl Default for DiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiBuilder {
    pub fn new() -> Self {
        DiBuilder {
            registered_components: Vec::new(),
            mode: DeploymentMode::default(),
        }
    }
}
impl DiBuilder {
    pub fn add_component<T: Injectable>(mut self, registration: Registration<T>) -> Self {
        self.registered_components.push(registration.into_def());
        self
    }

    pub fn add_instance<T: Injectable>(self, instance: T) -> Self {
        self.add_component(Registration::instance(instance))
    }

    pub fn add_named_instance<T: Injectable>(
        self,
        name: impl Into<Cow<'static, str>>,
        instance: T,
    ) -> Self {
        self.add_component(Registration::instance(instance).named(name))
    }

    pub fn add_factory<Factory: InstanceFactory>(self, factory: Factory) -> Self {
        self.add_component(Registration::factory(factory))
    }

    pub fn add_factory_fn<T, F>(self, construct: F) -> Self
    where
        T: Injectable,
        F: FnMut(&DiContainer) -> Result<T, DynError> + Send + Sync + 'static,
    {
        self.add_component(Registration::factory_fn(construct))
    }

    /// Sets when factories are constructed
    pub fn mode(mut self, mode: DeploymentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.registered_components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered_components.is_empty()
    }

    pub fn build(self) -> Result<DiContainer, InitError> {
        // Build and check Graph
        let graph = DependencyGraph::new(&self).map_err(|error| DependencyGraphErrors {
            errors: vec![error],
        })?;
        graph.check()?;

        tracing::debug!(
            "Building container with {} components ({:?} deployment)",
            self.registered_components.len(),
            self.mode
        );

        let container = DiContainer::new(self.mode);
        for component in self.registered_components {
            container.insert_def(component)?;
        }

        if self.mode == DeploymentMode::Cold {
            if let Err(error) = container.instantiate_all() {
                tracing::debug!("Eager construction failed, destroying partial container");
                container.destroy();
                return Err(error.into());
            }
        }

        Ok(container)
    }
}
