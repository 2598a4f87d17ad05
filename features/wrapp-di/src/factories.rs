use std::marker::PhantomData;

use crate::{
    container::DiContainer,
    types::{DependencyInfo, DynError, Injectable, Instance, TypeInfo},
};

/// A Factory providing instances of a given type
pub trait InstanceFactory: Send + Sync + 'static {
    type Provides: Injectable;

    /// Returns the typeinfo about the factory's provided type
    fn supplies() -> TypeInfo {
        TypeInfo::of::<Self::Provides>()
    }

    /// Returns a list of dependencies the factory requires to supply it's type
    fn get_dependencies() -> Vec<DependencyInfo>;

    /// Constructs a new instance of the factory's provided type
    ///
    /// Dependencies are looked up through `di`. Returns an error if either dependencies are
    /// not satisfied or the instantiation failed.
    fn construct(
        &mut self,
        di: &DiContainer,
    ) -> Result<Self::Provides, impl Into<DynError>>;
}

/// Wrapper Trait for factories, providing instances of Any
pub trait DynFactory: Send + Sync {
    fn supplies(&self) -> TypeInfo;

    /// Returns a list of dependencies for the factory
    fn dependencies(&self) -> Vec<DependencyInfo>;

    /// Constructs a new instance of the factory's provided type, fulfilling all its dependencies
    fn construct(&mut self, di: &DiContainer) -> Result<Instance, DynError>;
}
// Impl DynFactory for any InstanceFactory
impl<T: Injectable, SpecificFactory: InstanceFactory<Provides = T>> DynFactory for SpecificFactory {
    fn supplies(&self) -> TypeInfo {
        <SpecificFactory as InstanceFactory>::supplies()
    }

    fn dependencies(&self) -> Vec<DependencyInfo> {
        <SpecificFactory as InstanceFactory>::get_dependencies()
    }

    fn construct(&mut self, di: &DiContainer) -> Result<Instance, DynError> {
        // Forward the call to the specific implementation
        <SpecificFactory as InstanceFactory>::construct(self, di)
            .map(Instance::new)
            .map_err(|e| e.into())
    }
}

/// Factory backed by a closure
///
/// Closures can not describe their dependencies, declare them on the
/// [Registration](crate::component::Registration) instead.
pub struct FnFactory<F, T> {
    construct: F,
    _provides: PhantomData<fn() -> T>,
}
impl<F, T> FnFactory<F, T>
where
    T: Injectable,
    F: FnMut(&DiContainer) -> Result<T, DynError> + Send + Sync + 'static,
{
    pub fn new(construct: F) -> Self {
        FnFactory {
            construct,
            _provides: PhantomData,
        }
    }
}
impl<F, T> InstanceFactory for FnFactory<F, T>
where
    T: Injectable,
    F: FnMut(&DiContainer) -> Result<T, DynError> + Send + Sync + 'static,
{
    type Provides = T;

    fn get_dependencies() -> Vec<DependencyInfo> {
        vec![]
    }

    #[allow(refining_impl_trait)]
    fn construct(&mut self, di: &DiContainer) -> Result<T, DynError> {
        (self.construct)(di)
    }
}
