//! Mapping of field names to component names.

use wrapp_di::{ComponentKey, DiContainer, Registration, RegisterError};

/// Names the component a field is bound to by name
///
/// The binder uses the convention registered in the container, or [DefaultNamingConvention]
/// if there is none.
pub trait NamingConvention: Send + Sync {
    fn component_name(&self, field_name: &str) -> String;
}

/// Drops underscores: `dummy_service` is bound to `dummyservice`
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultNamingConvention;

impl NamingConvention for DefaultNamingConvention {
    fn component_name(&self, field_name: &str) -> String {
        field_name.replace('_', "")
    }
}

/// Registers [DefaultNamingConvention] unless the container already has a convention
///
/// Returns whether a convention was added.
pub fn register_default_convention(container: &DiContainer) -> Result<bool, RegisterError> {
    if container.has_component(&ComponentKey::of::<dyn NamingConvention>()) {
        return Ok(false);
    }

    container.register(
        Registration::instance(DefaultNamingConvention)
            .expose::<dyn NamingConvention>(|convention| convention),
    )?;
    tracing::debug!("Registered default naming convention in container #{}", container.serial());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wrapp_di::DiBuilder;

    use super::*;

    struct Prefixed;
    impl NamingConvention for Prefixed {
        fn component_name(&self, field_name: &str) -> String {
            format!("test.{field_name}")
        }
    }

    #[test]
    fn default_convention_drops_underscores() {
        assert_eq!(DefaultNamingConvention.component_name("dummy_service"), "dummyservice");
        assert_eq!(DefaultNamingConvention.component_name("plain"), "plain");
    }

    #[test]
    fn the_default_is_only_registered_once() {
        let container = DiBuilder::new().build().unwrap();

        assert!(register_default_convention(&container).unwrap());
        assert!(!register_default_convention(&container).unwrap());
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn a_configured_convention_is_kept() {
        let container = DiBuilder::new()
            .add_component(
                Registration::instance(Prefixed)
                    .expose::<dyn NamingConvention>(|convention| convention),
            )
            .build()
            .unwrap();

        assert!(!register_default_convention(&container).unwrap());
        let convention: Arc<dyn NamingConvention> = container.require().unwrap();
        assert_eq!(convention.component_name("service"), "test.service");
    }
}
