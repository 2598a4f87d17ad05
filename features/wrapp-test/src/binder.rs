//! Binding of components into the fields of test instances.

use std::sync::{Arc, OnceLock};

use wrapp_di::{ComponentKey, DiContainer, RequireError};

use crate::{
    class::{ClassDescriptor, InjectableField, TestClass},
    errors::LifecycleError,
    naming::NamingConvention,
};

/// Fills the declared fields of test instances from a container
///
/// The bindable fields of a class are discovered once and reused for every instance.
pub struct FieldBinder<C> {
    fields: OnceLock<Arc<[InjectableField<C>]>>,
}
impl<C> Default for FieldBinder<C> {
    fn default() -> Self {
        FieldBinder {
            fields: OnceLock::new(),
        }
    }
}

impl<C: TestClass> FieldBinder<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// All fields of the class and its parents which may be bound, in discovery order
    pub fn discover_fields(&self, descriptor: &ClassDescriptor<C>) -> Arc<[InjectableField<C>]> {
        self.fields
            .get_or_init(|| {
                let fields: Vec<InjectableField<C>> = descriptor
                    .fields()
                    .iter()
                    .filter(|field| field.is_auto_bindable())
                    .cloned()
                    .collect();
                tracing::debug!(
                    "Discovered {} bindable fields of {}",
                    fields.len(),
                    descriptor.name()
                );
                fields.into()
            })
            .clone()
    }

    /// Binds every discovered field of `instance`
    ///
    /// Returns the number of fields written. The first failing lookup aborts the pass.
    pub fn inject(
        &self,
        container: &DiContainer,
        descriptor: &ClassDescriptor<C>,
        instance: &mut C,
    ) -> Result<usize, LifecycleError> {
        let mut bound = 0;
        for field in self.discover_fields(descriptor).iter() {
            if bind_field(container, instance, field)? {
                bound += 1;
            }
        }
        Ok(bound)
    }
}

/// Binds a single field
///
/// Fields which already hold a value are left alone. Otherwise the component named by the
/// container's [NamingConvention] (or by the field's normalized name if it has none) is used if
/// it can be assigned to the field, falling back to the component registered for the field's
/// type. Returns whether the field was written.
pub fn bind_field<C: 'static>(
    container: &DiContainer,
    instance: &mut C,
    field: &InjectableField<C>,
) -> Result<bool, LifecycleError> {
    if !field.is_auto_bindable() || field.is_set(instance) {
        return Ok(false);
    }

    let declared_type = field.declared_type();
    let injection_failed = |error: RequireError| LifecycleError::Injection {
        field: field.name().to_string(),
        error,
    };

    let convention = ComponentKey::of::<dyn NamingConvention>();
    let name = if container.has_component(&convention) {
        container
            .require::<dyn NamingConvention>()
            .map_err(injection_failed)?
            .component_name(field.name())
    } else {
        field.normalized_name()
    };
    let mut component = None;
    if container.has_component(&ComponentKey::name(name.clone())) {
        if container.is_assignable(&name, declared_type) {
            component = Some(
                container
                    .get_component(&ComponentKey::name(name), declared_type)
                    .map_err(injection_failed)?,
            );
        } else {
            tracing::debug!(
                "Component '{}' can not be assigned to field '{}' <{}>",
                name,
                field.name(),
                declared_type
            );
        }
    }

    if component.is_none() {
        let key = ComponentKey::Type(declared_type);
        if container.has_component(&key) {
            component = Some(
                container
                    .get_component(&key, declared_type)
                    .map_err(injection_failed)?,
            );
        }
    }

    let Some(component) = component else {
        tracing::debug!("Nothing to bind to field '{}'", field.name());
        return Ok(false);
    };

    if !field.assign(instance, component) {
        return Err(injection_failed(RequireError::NotAssignable {
            key: ComponentKey::Type(declared_type),
            required_type: declared_type.type_name,
            actual_type: "unknown",
        }));
    }
    tracing::debug!("Bound field '{}' <{}>", field.name(), declared_type);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use wrapp_di::{DiBuilder, DynError, Registration};

    use super::*;
    use crate::class::ClassBuilder;

    trait Dummy: Send + Sync {
        fn id(&self) -> u32;
    }
    struct DummyImpl(u32);
    impl Dummy for DummyImpl {
        fn id(&self) -> u32 {
            self.0
        }
    }

    #[derive(Default)]
    struct Holder {
        dummy_service: Option<Arc<dyn Dummy>>,
    }
    impl TestClass for Holder {
        fn describe(class: &mut ClassBuilder<Self>) {
            class.field("dummy_service", |h| &mut h.dummy_service);
        }
    }

    fn bind(container: &DiContainer, instance: &mut Holder) -> Result<usize, LifecycleError> {
        let descriptor = ClassDescriptor::<Holder>::of();
        FieldBinder::new().inject(container, &descriptor, instance)
    }

    #[test]
    fn name_lookup_wins_over_type_lookup() {
        let container = DiBuilder::new()
            .add_component(
                Registration::instance(DummyImpl(1))
                    .named("dummyservice")
                    .expose::<dyn Dummy>(|d| d),
            )
            .add_component(
                Registration::instance(DummyImpl(2))
                    .named("other")
                    .expose::<dyn Dummy>(|d| d),
            )
            .build()
            .unwrap();

        let mut instance = Holder::default();
        assert_eq!(bind(&container, &mut instance).unwrap(), 1);
        assert_eq!(instance.dummy_service.unwrap().id(), 1);
    }

    #[test]
    fn the_containers_naming_convention_names_components() {
        struct Prefixed;
        impl NamingConvention for Prefixed {
            fn component_name(&self, field_name: &str) -> String {
                format!("test_{field_name}")
            }
        }

        let container = DiBuilder::new()
            .add_component(Registration::instance(Prefixed).expose::<dyn NamingConvention>(|c| c))
            .add_component(
                Registration::instance(DummyImpl(1))
                    .named("dummyservice")
                    .expose::<dyn Dummy>(|d| d),
            )
            .add_component(
                Registration::instance(DummyImpl(2))
                    .named("test_dummy_service")
                    .expose::<dyn Dummy>(|d| d),
            )
            .build()
            .unwrap();

        let mut instance = Holder::default();
        bind(&container, &mut instance).unwrap();
        assert_eq!(instance.dummy_service.unwrap().id(), 2);
    }

    #[test]
    fn incompatible_named_component_falls_back_to_type() {
        let container = DiBuilder::new()
            .add_named_instance("dummyservice", "not a dummy".to_string())
            .add_component(Registration::instance(DummyImpl(7)).expose::<dyn Dummy>(|d| d))
            .build()
            .unwrap();

        let mut instance = Holder::default();
        bind(&container, &mut instance).unwrap();
        assert_eq!(instance.dummy_service.unwrap().id(), 7);
    }

    #[test]
    fn unresolvable_fields_stay_empty() {
        let container = DiBuilder::new().build().unwrap();
        let mut instance = Holder::default();

        assert_eq!(bind(&container, &mut instance).unwrap(), 0);
        assert!(instance.dummy_service.is_none());
    }

    #[test]
    fn lookup_failures_abort_binding() {
        let container = DiBuilder::new()
            .add_component(
                Registration::factory_fn(|_| Err::<DummyImpl, DynError>("broken".into()))
                    .named("dummyservice")
                    .expose::<dyn Dummy>(|d| d),
            )
            .build()
            .unwrap();

        let mut instance = Holder::default();
        match bind(&container, &mut instance) {
            Err(LifecycleError::Injection { field, error }) => {
                assert_eq!(field, "dummy_service");
                assert!(matches!(error, RequireError::FactoryFailed { .. }));
            }
            other => panic!("expected an injection error, got {other:?}"),
        }
    }

    #[test]
    fn discovered_fields_are_cached() {
        let descriptor = ClassDescriptor::<Holder>::of();
        let binder = FieldBinder::new();

        let first = binder.discover_fields(&descriptor);
        let second = binder.discover_fields(&descriptor);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
