use std::sync::Arc;

use thiserror::Error;

use crate::{
    dependency_graph::DependencyGraphErrors,
    types::{ComponentKey, DynError, TypeInfo},
};

/// Errors when trying to require a certain component
#[derive(Error, Debug, Clone)]
pub enum RequireError {
    /// No component is registered under the key
    #[error("The required component {0} is not known.")]
    Missing(ComponentKey),
    /// More than one component exposes the requested type
    #[error("The required type <{requested}> is provided by {count} components.")]
    Ambiguous { requested: TypeInfo, count: usize },
    /// The component exists but can not be viewed as the requested type
    #[error("Component {key} can not be viewed as '{required_type}' (actual: '{actual_type}')")]
    NotAssignable {
        key: ComponentKey,
        required_type: &'static str,
        actual_type: &'static str,
    },
    /// The component is already being constructed further up the resolution chain
    #[error("Circular resolution of {key} through {chain:?}")]
    Circular {
        key: ComponentKey,
        chain: Vec<&'static str>,
    },
    /// The factory of the component failed
    #[error("Factory for '{product}' failed - error: {error}")]
    FactoryFailed {
        product: &'static str,
        error: Arc<DynError>,
    },
    /// The container was destroyed
    #[error("The container has been destroyed.")]
    Destroyed,
}

/// Errors while building a container
#[derive(Error, Debug, Clone)]
pub enum InitError {
    /// There are issues with the dependency graph
    #[error(transparent)]
    DependencyGraphError(#[from] DependencyGraphErrors),

    /// A component failed to build during eager construction
    #[error(transparent)]
    ConstructionFailed(#[from] RequireError),

    /// A component could not be added to the container
    #[error(transparent)]
    Register(#[from] RegisterError),
}

/// Errors when registering into an existing container
#[derive(Error, Debug, Clone)]
pub enum RegisterError {
    #[error("A component named '{0}' is already registered")]
    DuplicateName(String),
    #[error("The container has been destroyed.")]
    Destroyed,
}
