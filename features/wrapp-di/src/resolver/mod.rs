use crate::{container::DiContainer, errors::RequireError, types::DependencyInfo};

pub mod arc;
pub mod lazy;

/// Allows custom behaviour on injection
pub trait Resolver {
    fn resolve(container: &DiContainer) -> Result<Self, RequireError>
    where
        Self: Sized;

    fn dependency_info() -> DependencyInfo;
}
