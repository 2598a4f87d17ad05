use std::{borrow::Cow, fmt::Debug, sync::Arc};

use wrapp_di::{DiBuilder, DynError};

type ApplyFn = dyn Fn(DiBuilder) -> Result<DiBuilder, DynError> + Send + Sync;

/// A named blueprint describing the components of a container
///
/// Applying the source registers its components on a [DiBuilder].
///
/// # Example
/// ```rust
/// use wrapp_config::ConfigurationSource;
/// use wrapp_di::DiBuilder;
///
/// struct Repository;
///
/// let source = ConfigurationSource::new("Repositories", |builder| {
///     Ok(builder.add_named_instance("repository", Repository))
/// });
///
/// let builder = source.apply(DiBuilder::new()).unwrap();
/// assert_eq!(builder.len(), 1);
/// ```
#[derive(Clone)]
pub struct ConfigurationSource {
    name: Cow<'static, str>,
    apply: Arc<ApplyFn>,
}
impl Debug for ConfigurationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ConfigurationSource").field(&self.name).finish()
    }
}
impl ConfigurationSource {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, apply: F) -> Self
    where
        F: Fn(DiBuilder) -> Result<DiBuilder, DynError> + Send + Sync + 'static,
    {
        ConfigurationSource {
            name: name.into(),
            apply: Arc::new(apply),
        }
    }

    /// A source which only marks its name as present
    pub fn marker(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, Ok)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers the source's components on `builder`
    pub fn apply(&self, builder: DiBuilder) -> Result<DiBuilder, DynError> {
        (self.apply)(builder)
    }
}
