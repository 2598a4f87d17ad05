use std::{
    borrow::Cow,
    collections::HashMap,
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use wrapp_config::SourceCatalog;
use wrapp_di::{current, DiBuilder, DiContainer};

use crate::{errors::RegistryError, naming, settings::RegistrySettings};

/// Names the configuration source a container is built from
///
/// An empty identifier stands for an empty container without any components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigurationId(Cow<'static, str>);
impl ConfigurationId {
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        ConfigurationId(id.into())
    }

    /// The identifier of an empty container
    pub fn empty() -> Self {
        ConfigurationId(Cow::Borrowed(""))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl std::fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            f.write_str("<empty>")
        } else {
            f.write_str(&self.0)
        }
    }
}
impl From<&'static str> for ConfigurationId {
    fn from(value: &'static str) -> Self {
        ConfigurationId::new(value)
    }
}
impl From<String> for ConfigurationId {
    fn from(value: String) -> Self {
        ConfigurationId::new(value)
    }
}

/// Owns every container created for tests
///
/// Containers are created on first access and cached per [ConfigurationId] until they are
/// [reset](ContainerRegistry::reset). Share one registry (behind an `Arc`) between all test
/// classes of a process.
///
/// # Example
/// ```rust
/// use wrapp_config::{ConfigurationSource, SourceCatalog};
/// use wrapp_test::{ConfigurationId, ContainerRegistry};
///
/// let mut catalog = SourceCatalog::new();
/// catalog
///     .add_source(ConfigurationSource::new("OrderTest", |builder| {
///         Ok(builder.add_named_instance("orders", Vec::<u32>::new()))
///     }))
///     .unwrap();
///
/// let registry = ContainerRegistry::with_catalog(catalog);
/// let id = ConfigurationId::new("OrderTest");
///
/// let first = registry.get(&id).unwrap();
/// assert!(first.ptr_eq(&registry.get(&id).unwrap()));
///
/// registry.reset(&id);
/// assert!(!first.ptr_eq(&registry.get(&id).unwrap()));
/// ```
pub struct ContainerRegistry {
    catalog: SourceCatalog,
    settings: RegistrySettings,
    containers: Mutex<HashMap<ConfigurationId, DiContainer>>,
}

impl Debug for ContainerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let containers = self.lock();
        let mut ids: Vec<String> = containers.keys().map(ToString::to_string).collect();
        ids.sort();
        f.debug_struct("ContainerRegistry")
            .field("settings", &self.settings)
            .field("sources", &self.catalog.len())
            .field("containers", &ids)
            .finish()
    }
}

impl ContainerRegistry {
    pub fn new(catalog: SourceCatalog, settings: RegistrySettings) -> Self {
        ContainerRegistry {
            catalog,
            settings,
            containers: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_catalog(catalog: SourceCatalog) -> Self {
        Self::new(catalog, RegistrySettings::default())
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> RegistrySettings {
        self.settings
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConfigurationId, DiContainer>> {
        self.containers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the container for `id`, creating it on first access
    ///
    /// A newly created container is also published as the
    /// [current](wrapp_di::current::current) container.
    pub fn get(&self, id: &ConfigurationId) -> Result<DiContainer, RegistryError> {
        // Creation happens under the lock, concurrent first access must not build twice
        let mut containers = self.lock();
        if let Some(container) = containers.get(id) {
            return Ok(container.clone());
        }

        let container = self.create(id)?;
        current::set_current(&container);
        containers.insert(id.clone(), container.clone());
        Ok(container)
    }

    /// Destroys and forgets the container for `id`
    ///
    /// Returns false if no container existed. The next [get](ContainerRegistry::get) builds a
    /// new container.
    pub fn reset(&self, id: &ConfigurationId) -> bool {
        let mut containers = self.lock();
        let Some(container) = containers.remove(id) else {
            return false;
        };

        tracing::debug!("Destroying container #{} of '{}'", container.serial(), id);
        container.destroy();
        current::clear_current_if(&container);
        true
    }

    /// True if a live container exists for `id`
    pub fn contains(&self, id: &ConfigurationId) -> bool {
        self.lock().contains_key(id)
    }

    /// Number of live containers
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn create(&self, id: &ConfigurationId) -> Result<DiContainer, RegistryError> {
        let mode = self.catalog.deployment_mode(self.settings.warm_deploy);
        tracing::debug!("Loading container '{}' ({:?} deployment)", id, mode);

        let builder = DiBuilder::new().mode(mode);
        if id.is_empty() {
            return builder.build().map_err(|error| RegistryError::Build {
                id: id.to_string(),
                error,
            });
        }

        let source = self.catalog.get_source(id.as_str())?;
        let builder = source
            .apply(builder)
            .map_err(|error| RegistryError::SourceFailed {
                id: id.to_string(),
                error: Arc::new(error),
            })?;
        let container = builder.build().map_err(|error| RegistryError::Build {
            id: id.to_string(),
            error,
        })?;

        if self.settings.register_naming_convention {
            if let Err(error) = naming::register_default_convention(&container) {
                container.destroy();
                return Err(RegistryError::Build {
                    id: id.to_string(),
                    error: error.into(),
                });
            }
        }
        Ok(container)
    }
}
