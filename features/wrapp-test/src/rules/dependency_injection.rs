use std::{
    borrow::Cow,
    sync::{Arc, PoisonError},
};

use wrapp_di::DynError;

use crate::{
    binder::FieldBinder,
    class::{ClassDescriptor, TestClass},
    context::TestContext,
    errors::LifecycleError,
    rules::TestRule,
};

/// Binds components into every new test instance
///
/// Registered as the first listener of a class unless the class disables it.
pub struct DependencyInjectionRule<C> {
    descriptor: Arc<ClassDescriptor<C>>,
    binder: FieldBinder<C>,
}

impl<C: TestClass> DependencyInjectionRule<C> {
    pub fn new(descriptor: Arc<ClassDescriptor<C>>) -> Self {
        DependencyInjectionRule {
            descriptor,
            binder: FieldBinder::new(),
        }
    }
}

impl<C: TestClass> TestRule<C> for DependencyInjectionRule<C> {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("DependencyInjectionRule")
    }

    fn prepare_instance(&self, context: &TestContext<C>) -> Result<(), DynError> {
        tracing::debug!(
            "Performing dependency injection for {}",
            context.test_class_name()
        );
        let Some(instance) = context.test_instance() else {
            return Ok(());
        };

        // Classes without bindable fields never load a container
        if self.binder.discover_fields(&self.descriptor).is_empty() {
            return Ok(());
        }

        let container = context.container().map_err(LifecycleError::from)?;
        let mut instance = instance.lock().unwrap_or_else(PoisonError::into_inner);
        let bound = self
            .binder
            .inject(&container, &self.descriptor, &mut instance)?;
        tracing::debug!("Bound {} fields of {}", bound, context.test_class_name());
        Ok(())
    }
}
