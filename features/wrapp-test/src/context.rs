use std::{
    borrow::Cow,
    fmt::Debug,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use wrapp_di::DiContainer;

use crate::{
    class::{ClassDescriptor, ContainerInclude, TestClass, TestInstance, TestMethod},
    errors::{LifecycleError, RegistryError},
    registry::{ConfigurationId, ContainerRegistry},
};

/// State of the test currently executing
struct ExecutionState<C> {
    instance: Option<TestInstance<C>>,
    method: Option<TestMethod>,
    failure: Option<LifecycleError>,
}

/// Everything rules may know about the running test class
///
/// One context lives as long as its test class runs. The configuration it uses is resolved
/// once on construction; the current instance, method and failure change as tests execute.
pub struct TestContext<C> {
    class_name: Cow<'static, str>,
    configuration_id: ConfigurationId,
    includes: Vec<ContainerInclude>,
    registry: Arc<ContainerRegistry>,
    state: Mutex<ExecutionState<C>>,
    /// Serial of the container the includes were last applied to, and how that went
    included: Mutex<Option<(u64, Result<(), RegistryError>)>>,
}

impl<C> Debug for TestContext<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("TestContext")
            .field("class", &self.class_name)
            .field("configuration_id", &self.configuration_id)
            .field("has_instance", &state.instance.is_some())
            .field("method", &state.method)
            .field("failure", &state.failure)
            .finish()
    }
}

impl<C> TestContext<C> {
    fn state(&self) -> MutexGuard<'_, ExecutionState<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: TestClass> TestContext<C> {
    pub fn new(descriptor: &ClassDescriptor<C>, registry: Arc<ContainerRegistry>) -> Self {
        let (configuration_id, includes) = match descriptor.configuration() {
            Some(configuration) => {
                tracing::debug!(
                    "{} declares configuration '{}'",
                    descriptor.name(),
                    configuration.path()
                );
                (
                    ConfigurationId::new(configuration.path().to_string()),
                    configuration.includes().to_vec(),
                )
            }
            None => (ConfigurationId::new(descriptor.name().to_string()), Vec::new()),
        };

        TestContext {
            class_name: Cow::Owned(descriptor.name().to_string()),
            configuration_id,
            includes,
            registry,
            state: Mutex::new(ExecutionState {
                instance: None,
                method: None,
                failure: None,
            }),
            included: Mutex::new(None),
        }
    }

    pub fn test_class_name(&self) -> &str {
        &self.class_name
    }

    pub fn configuration_id(&self) -> &ConfigurationId {
        &self.configuration_id
    }

    pub fn registry(&self) -> &Arc<ContainerRegistry> {
        &self.registry
    }

    /// The container of this class, created on first access
    ///
    /// Includes run once against every container created for this context, before it is
    /// returned. If one fails, that failure is returned for the container until it is reset.
    pub fn container(&self) -> Result<DiContainer, RegistryError> {
        tracing::debug!("Container '{}' requested", self.configuration_id);
        let container = self.registry.get(&self.configuration_id)?;
        if self.includes.is_empty() {
            return Ok(container);
        }

        let mut included = self.included.lock().unwrap_or_else(PoisonError::into_inner);
        match &*included {
            Some((serial, outcome)) if *serial == container.serial() => {
                outcome.clone().map(|()| container)
            }
            _ => {
                let outcome = self.apply_includes(&container);
                *included = Some((container.serial(), outcome.clone()));
                outcome.map(|()| container)
            }
        }
    }

    fn apply_includes(&self, container: &DiContainer) -> Result<(), RegistryError> {
        for (index, include) in self.includes.iter().enumerate() {
            include(container).map_err(|error| {
                tracing::warn!(
                    "Include #{} of '{}' failed: {}",
                    index,
                    self.configuration_id,
                    error
                );
                RegistryError::IncludeFailed {
                    id: self.configuration_id.to_string(),
                    index,
                    error: Arc::new(error),
                }
            })?;
        }
        tracing::debug!(
            "Applied {} includes to container #{}",
            self.includes.len(),
            container.serial()
        );
        Ok(())
    }

    /// Destroys the container, the next [TestContext::container] call builds a new one
    pub fn reset_container(&self) -> bool {
        self.registry.reset(&self.configuration_id)
    }

    pub fn set_test_instance(&self, instance: TestInstance<C>) {
        self.state().instance = Some(instance);
    }

    pub fn test_instance(&self) -> Option<TestInstance<C>> {
        self.state().instance.clone()
    }

    pub fn test_method(&self) -> Option<TestMethod> {
        self.state().method.clone()
    }

    /// Failure of the current test, visible to after-hooks
    pub fn test_failure(&self) -> Option<LifecycleError> {
        self.state().failure.clone()
    }

    pub(crate) fn update_state(
        &self,
        instance: Option<TestInstance<C>>,
        method: Option<TestMethod>,
        failure: Option<LifecycleError>,
    ) {
        let mut state = self.state();
        state.instance = instance;
        state.method = method;
        state.failure = failure;
    }
}
