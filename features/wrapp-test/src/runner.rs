//! A minimal runner driving test classes through their lifecycle.

use std::{
    borrow::Cow,
    sync::{Arc, Mutex},
};

use wrapp_di::DynError;

use crate::{
    class::{RuleRef, TestClass, TestMethod},
    errors::LifecycleError,
    manager::TestContextManager,
    registry::ContainerRegistry,
    rules::TestRule,
    statements,
};

type TestBody<C> = Box<dyn Fn(&mut C) -> Result<(), DynError> + Send + Sync>;
type CreateFn<C> = Box<dyn Fn() -> C + Send + Sync>;

/// The tests of one class
///
/// Every method runs on a fresh instance, which is prepared (and thus injected) before the
/// method's hooks run.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use wrapp_config::{ConfigurationSource, SourceCatalog};
/// use wrapp_test::{ClassBuilder, ContainerRegistry, TestClass, TestSuite};
///
/// struct Counter(u32);
///
/// #[derive(Default)]
/// struct CounterTest {
///     counter: Option<Arc<Counter>>,
/// }
/// impl TestClass for CounterTest {
///     fn describe(class: &mut ClassBuilder<Self>) {
///         class.field("counter", |test| &mut test.counter);
///     }
/// }
///
/// let mut catalog = SourceCatalog::new();
/// catalog
///     .add_source(ConfigurationSource::new("CounterTest", |builder| {
///         Ok(builder.add_named_instance("counter", Counter(3)))
///     }))
///     .unwrap();
///
/// let report = TestSuite::<CounterTest>::new(Arc::new(ContainerRegistry::with_catalog(catalog)))
///     .test("counter_is_injected", |test| {
///         let counter = test.counter.as_ref().ok_or("counter missing")?;
///         assert_eq!(counter.0, 3);
///         Ok(())
///     })
///     .run();
///
/// assert!(report.is_success());
/// ```
pub struct TestSuite<C> {
    registry: Arc<ContainerRegistry>,
    create: CreateFn<C>,
    tests: Vec<(TestMethod, TestBody<C>)>,
    listeners: Vec<RuleRef<C>>,
}

impl<C: TestClass + Default> TestSuite<C> {
    pub fn new(registry: Arc<ContainerRegistry>) -> Self {
        Self::with_factory(registry, C::default)
    }
}

impl<C: TestClass> TestSuite<C> {
    /// A suite creating its instances through `create`
    pub fn with_factory(
        registry: Arc<ContainerRegistry>,
        create: impl Fn() -> C + Send + Sync + 'static,
    ) -> Self {
        TestSuite {
            registry,
            create: Box::new(create),
            tests: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn test<F>(self, name: impl Into<Cow<'static, str>>, body: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), DynError> + Send + Sync + 'static,
    {
        self.method(TestMethod::new(name), body)
    }

    pub fn method<F>(mut self, method: TestMethod, body: F) -> Self
    where
        F: Fn(&mut C) -> Result<(), DynError> + Send + Sync + 'static,
    {
        self.tests.push((method, Box::new(body)));
        self
    }

    /// A listener registered on every run, after the default ones
    pub fn listener<R: TestRule<C> + 'static>(mut self, listener: Arc<R>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Runs all tests with a new [TestContextManager]
    pub fn run(&self) -> RunReport {
        let mut manager = TestContextManager::new(self.registry.clone());
        manager.register_listeners(self.listeners.iter().cloned());
        self.run_with(&manager)
    }

    /// Runs all tests with an existing manager
    pub fn run_with(&self, manager: &TestContextManager<C>) -> RunReport {
        let class_name = manager.test_context().test_class_name().to_string();
        let mut outcomes = Vec::with_capacity(self.tests.len());

        let class_result = statements::run_test_class(manager, || {
            for (method, body) in &self.tests {
                let result = self.run_method(manager, method, body);
                match &result {
                    Ok(()) => tracing::debug!("{}::{} passed", class_name, method.name()),
                    Err(error) => {
                        tracing::error!("{}::{} failed: {}", class_name, method.name(), error)
                    }
                }
                outcomes.push(TestOutcome {
                    method: method.clone(),
                    result,
                });
            }
            Ok(())
        });

        if let Err(error) = &class_result {
            tracing::error!("{} failed: {}", class_name, error);
        }
        RunReport {
            class_name,
            outcomes,
            class_failure: class_result.err(),
        }
    }

    fn run_method(
        &self,
        manager: &TestContextManager<C>,
        method: &TestMethod,
        body: &TestBody<C>,
    ) -> Result<(), LifecycleError> {
        let instance = Arc::new(Mutex::new((self.create)()));
        manager.prepare_instance(instance.clone())?;
        manager.prepare_method_rules();
        statements::run_test_method(manager, &instance, method, |test| body(test))
    }
}

/// Result of one test method
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub method: TestMethod,
    pub result: Result<(), LifecycleError>,
}

/// Results of running a [TestSuite]
#[derive(Debug, Clone)]
pub struct RunReport {
    pub class_name: String,
    /// Outcomes in execution order, empty if the class failed before running any method
    pub outcomes: Vec<TestOutcome>,
    /// Failure of the class-level hooks
    pub class_failure: Option<LifecycleError>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.class_failure.is_none() && self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &TestOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn outcome(&self, method: &str) -> Option<&TestOutcome> {
        self.outcomes.iter().find(|o| o.method.name() == method)
    }
}
