use std::sync::Arc;

use crate::{
    class::{ClassDescriptor, RuleRef, TestClass, TestInstance, TestMethod},
    context::TestContext,
    errors::{LifecycleError, Phase},
    registry::ContainerRegistry,
    rules::{dependency_injection::DependencyInjectionRule, TestRule},
    statements::CleanupStack,
};

/// Drives the lifecycle of one test class
///
/// Owns the class' [TestContext] and the listeners taking part in every phase. The
/// [DependencyInjectionRule] is the first listener unless the class disables it.
///
/// Hooks of a phase form a stack of the class' rules for that scope followed by the listeners.
/// Before-hooks run in that order and stop at the first failure, after-hooks run in reverse
/// and are all attempted.
pub struct TestContextManager<C> {
    descriptor: Arc<ClassDescriptor<C>>,
    context: Arc<TestContext<C>>,
    listeners: Vec<RuleRef<C>>,
}

impl<C: TestClass> TestContextManager<C> {
    pub fn new(registry: Arc<ContainerRegistry>) -> Self {
        Self::with_descriptor(Arc::new(ClassDescriptor::of()), registry)
    }

    pub fn with_descriptor(
        descriptor: Arc<ClassDescriptor<C>>,
        registry: Arc<ContainerRegistry>,
    ) -> Self {
        let context = Arc::new(TestContext::new(&descriptor, registry));
        let mut manager = TestContextManager {
            descriptor,
            context,
            listeners: Vec::new(),
        };

        if manager.descriptor.uses_dependency_injection() {
            let rule = DependencyInjectionRule::new(manager.descriptor.clone());
            manager.register_listener(Arc::new(rule));
        }
        manager
    }

    pub fn test_context(&self) -> &Arc<TestContext<C>> {
        &self.context
    }

    pub fn descriptor(&self) -> &Arc<ClassDescriptor<C>> {
        &self.descriptor
    }

    /// Registered listeners in registration order
    pub fn listeners(&self) -> &[RuleRef<C>] {
        &self.listeners
    }

    pub fn register_listener<R: TestRule<C> + 'static>(&mut self, listener: Arc<R>) -> &mut Self {
        self.register_listeners([listener as RuleRef<C>])
    }

    /// Appends listeners, which take part in all phases
    pub fn register_listeners(
        &mut self,
        listeners: impl IntoIterator<Item = RuleRef<C>>,
    ) -> &mut Self {
        for listener in listeners {
            tracing::debug!("Registering listener {}", listener.name());
            listener.set_test_context(self.context.clone());
            self.listeners.push(listener);
        }
        self
    }

    /// Class rules followed by listeners
    pub fn class_hooks(&self) -> Vec<RuleRef<C>> {
        self.descriptor
            .class_rules()
            .iter()
            .chain(&self.listeners)
            .cloned()
            .collect()
    }

    /// Method rules followed by listeners
    pub fn method_hooks(&self) -> Vec<RuleRef<C>> {
        self.descriptor
            .method_rules()
            .iter()
            .chain(&self.listeners)
            .cloned()
            .collect()
    }

    /// Hands every class rule the test context
    pub fn prepare_class(&self) {
        tracing::debug!("prepare_class(): {}", self.context.test_class_name());
        for rule in self.descriptor.class_rules() {
            rule.set_test_context(self.context.clone());
        }
    }

    /// Prepares a new test instance
    ///
    /// Listeners run first, then the class' instance rules. The first failure stops the pass.
    pub fn prepare_instance(&self, instance: TestInstance<C>) -> Result<(), LifecycleError> {
        tracing::debug!("prepare_instance(): {}", self.context.test_class_name());
        self.context.update_state(Some(instance), None, None);

        for rule in self.descriptor.instance_rules() {
            rule.set_test_context(self.context.clone());
        }
        for rule in self.listeners.iter().chain(self.descriptor.instance_rules()) {
            self.run_hook(rule, Phase::PrepareInstance)?;
        }
        Ok(())
    }

    /// Hands every method rule the test context
    pub fn prepare_method_rules(&self) {
        for rule in self.descriptor.method_rules() {
            rule.set_test_context(self.context.clone());
        }
    }

    pub fn before_test_class(&self) -> Result<(), LifecycleError> {
        tracing::debug!("before_test_class(): {}", self.context.test_class_name());
        self.context.update_state(None, None, None);
        for hook in self.class_hooks() {
            self.run_hook(&hook, Phase::BeforeClass)?;
        }
        Ok(())
    }

    pub fn before_test_method(
        &self,
        instance: &TestInstance<C>,
        method: &TestMethod,
    ) -> Result<(), LifecycleError> {
        tracing::debug!("before_test_method(): {}", method.name());
        self.context
            .update_state(Some(instance.clone()), Some(method.clone()), None);
        for hook in self.method_hooks() {
            self.run_hook(&hook, Phase::BeforeMethod)?;
        }
        Ok(())
    }

    /// Runs every after-method hook in reverse order
    ///
    /// `failure` is the failure of the test so far, published through the test context. Only
    /// failures of the hooks themselves are returned.
    pub fn after_test_method(
        &self,
        instance: &TestInstance<C>,
        method: &TestMethod,
        failure: Option<LifecycleError>,
    ) -> Result<(), LifecycleError> {
        tracing::debug!(
            "after_test_method(): {}, failure: {:?}",
            method.name(),
            failure.as_ref().map(ToString::to_string)
        );
        self.context
            .update_state(Some(instance.clone()), Some(method.clone()), failure);

        let mut cleanups = CleanupStack::new();
        for hook in self.method_hooks() {
            cleanups.push(move || self.run_hook(&hook, Phase::AfterMethod));
        }
        LifecycleError::aggregate(cleanups.unwind())
    }

    /// Runs every after-class hook in reverse order
    pub fn after_test_class(&self, failure: Option<LifecycleError>) -> Result<(), LifecycleError> {
        tracing::debug!("after_test_class(): {}", self.context.test_class_name());
        self.context.update_state(None, None, failure);

        let mut cleanups = CleanupStack::new();
        for hook in self.class_hooks() {
            cleanups.push(move || self.run_hook(&hook, Phase::AfterClass));
        }
        LifecycleError::aggregate(cleanups.unwind())
    }

    fn run_hook(&self, rule: &RuleRef<C>, phase: Phase) -> Result<(), LifecycleError> {
        let context = &*self.context;
        let result = match phase {
            Phase::BeforeClass => rule.before_class(context),
            Phase::PrepareInstance => rule.prepare_instance(context),
            Phase::BeforeMethod => rule.before_method(context),
            Phase::AfterMethod => rule.after_method(context),
            Phase::AfterClass => rule.after_class(context),
        };

        result.map_err(|error| {
            let error = LifecycleError::hook(rule.name(), phase, error);
            tracing::warn!("Rule '{}' failed during {}: {}", rule.name(), phase, error);
            error
        })
    }
}
