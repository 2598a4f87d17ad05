use std::{
    fmt::Debug,
    sync::{Arc, OnceLock, Weak},
};

use crate::{
    container::{DiContainer, DiContainerInner},
    errors::RequireError,
    resolver::Resolver,
    types::{DependencyInfo, Injectable},
};

/// Lazily resolved dependency
///
/// Resolution happens on first access, which allows two components to depend on each other
/// as long as one side is lazy. The lazy does not keep the container alive.
pub struct Lazy<T: ?Sized + Injectable> {
    container: Weak<DiContainerInner>,
    once: OnceLock<Arc<T>>,
}
impl<T: ?Sized + Injectable + Debug> Debug for Lazy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.once.get() {
            Some(resolved) => f.debug_tuple("Lazy").field(resolved).finish(),
            None => f.debug_tuple("Lazy").field(&"unresolved").finish(),
        }
    }
}
impl<T: ?Sized + Injectable> Resolver for Lazy<T> {
    fn resolve(container: &DiContainer) -> Result<Self, RequireError>
    where
        Self: Sized,
    {
        Ok(Lazy {
            container: container.downgrade(),
            once: OnceLock::new(),
        })
    }

    fn dependency_info() -> DependencyInfo {
        DependencyInfo::required::<T>().lazy()
    }
}
impl<T: ?Sized + Injectable> Lazy<T> {
    /// Accesses the lazy dependency, resolving it on first use
    ///
    /// Failed resolutions are not cached, a later call tries again.
    pub fn get(&self) -> Result<&Arc<T>, RequireError> {
        if let Some(resolved) = self.once.get() {
            return Ok(resolved);
        }

        let container = DiContainer::upgrade(&self.container).ok_or(RequireError::Destroyed)?;
        let resolved = container.require::<T>()?;
        Ok(self.once.get_or_init(|| resolved))
    }

    /// True once the dependency was resolved
    pub fn is_resolved(&self) -> bool {
        self.once.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builder::DiBuilder, component::Registration, types::DynError};

    struct Parent {
        child: Lazy<Child>,
    }
    struct Child {
        parent: Arc<Parent>,
    }

    #[test]
    fn lazy_dependencies_break_cycles() {
        let container = DiBuilder::new()
            .add_component(
                Registration::factory_fn(|di: &DiContainer| {
                    Ok::<_, DynError>(Parent {
                        child: di.resolve()?,
                    })
                })
                .depends_on(<Lazy<Child>>::dependency_info()),
            )
            .add_component(
                Registration::factory_fn(|di: &DiContainer| {
                    Ok::<_, DynError>(Child {
                        parent: di.resolve()?,
                    })
                })
                .depends_on(<Arc<Parent>>::dependency_info()),
            )
            .build()
            .unwrap();

        let parent = container.require::<Parent>().unwrap();
        assert!(!parent.child.is_resolved());
        let child = parent.child.get().unwrap();
        assert!(Arc::ptr_eq(&child.parent, &parent));
    }

    #[test]
    fn lazy_fails_after_container_is_gone() {
        let lazy = {
            let container = DiBuilder::new().add_instance(1_u32).build().unwrap();
            container.resolve::<Lazy<u32>>().unwrap()
        };
        assert!(matches!(lazy.get(), Err(RequireError::Destroyed)));
    }
}
