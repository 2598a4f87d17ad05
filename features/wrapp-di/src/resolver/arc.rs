use std::sync::Arc;

use crate::{
    container::DiContainer,
    errors::RequireError,
    resolver::Resolver,
    types::{DependencyInfo, Injectable},
};

impl<T: ?Sized + Injectable> Resolver for Arc<T> {
    fn resolve(container: &DiContainer) -> Result<Self, RequireError> {
        container.require::<T>()
    }

    fn dependency_info() -> DependencyInfo {
        DependencyInfo::required::<T>()
    }
}

impl<Resolvable: Resolver> Resolver for Option<Resolvable> {
    fn resolve(container: &DiContainer) -> Result<Self, RequireError>
    where
        Self: Sized,
    {
        match Resolvable::resolve(container) {
            Ok(resolved) => Ok(Some(resolved)),
            // If the required component is not registered Option does not fail
            Err(RequireError::Missing(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn dependency_info() -> DependencyInfo {
        Resolvable::dependency_info().optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DiBuilder;

    #[derive(Debug)]
    struct Present;
    struct Absent;

    #[test]
    fn option_resolves_missing_components_to_none() {
        let container = DiBuilder::new().add_instance(Present).build().unwrap();

        let present = container.resolve::<Option<Arc<Present>>>().unwrap();
        let absent = container.resolve::<Option<Arc<Absent>>>().unwrap();
        assert!(present.is_some());
        assert!(absent.is_none());
        assert!(<Option<Arc<Absent>>>::dependency_info().optional);
    }
}
