//! Wrapp Test binds dependency injection containers to the lifecycle of tests.
//!
//! A [ContainerRegistry] creates containers from a
//! [SourceCatalog](wrapp_config::SourceCatalog) and caches them per [ConfigurationId]. Each
//! test class gets a [TestContextManager], which owns the class' [TestContext] and drives its
//! rules and listeners through the lifecycle:
//!
//! 1. `prepare_class` hands class rules the context
//! 2. `before_test_class` runs class hooks in registration order
//! 3. for every test: `prepare_instance` injects the new instance's fields, then the method
//!    hooks run before the body and in reverse after it
//! 4. `after_test_class` runs class hooks in reverse
//!
//! The [statements] module wraps these steps so that every after-hook runs and all failures
//! are reported together. [TestSuite] is a small runner on top of it.
//!
//! ```rust
//! use std::sync::Arc;
//! use wrapp_config::{ConfigurationSource, SourceCatalog};
//! use wrapp_test::{ClassBuilder, ContainerRegistry, TestClass, TestContextManager};
//!
//! struct Repository;
//!
//! #[derive(Default)]
//! struct RepositoryTest {
//!     repository: Option<Arc<Repository>>,
//! }
//! impl TestClass for RepositoryTest {
//!     fn describe(class: &mut ClassBuilder<Self>) {
//!         class.field("repository", |test| &mut test.repository);
//!     }
//! }
//!
//! let mut catalog = SourceCatalog::new();
//! catalog
//!     .add_source(ConfigurationSource::new("RepositoryTest", |builder| {
//!         Ok(builder.add_named_instance("repository", Repository))
//!     }))
//!     .unwrap();
//!
//! let registry = Arc::new(ContainerRegistry::with_catalog(catalog));
//! let manager = TestContextManager::<RepositoryTest>::new(registry);
//!
//! let instance = Arc::new(std::sync::Mutex::new(RepositoryTest::default()));
//! manager.prepare_instance(instance.clone()).unwrap();
//! assert!(instance.lock().unwrap().repository.is_some());
//! ```

pub mod binder;
pub mod class;
pub mod context;
pub mod errors;
pub mod logging;
pub mod manager;
pub mod naming;
pub mod registry;
pub mod rules;
pub mod runner;
pub mod settings;
pub mod statements;

pub use class::{
    ClassBuilder, ClassDescriptor, ContainerInclude, ContextConfiguration, InjectableField,
    Modifiers, RuleRef, TestClass, TestInstance, TestMethod,
};
pub use context::TestContext;
pub use errors::{LifecycleError, MultipleFailures, Phase, RegistryError};
pub use manager::TestContextManager;
pub use naming::{DefaultNamingConvention, NamingConvention};
pub use registry::{ConfigurationId, ContainerRegistry};
pub use rules::{
    dependency_injection::DependencyInjectionRule,
    dirty::{DirtyContainerRule, Mode},
    TestRule,
};
pub use runner::{RunReport, TestOutcome, TestSuite};
pub use settings::RegistrySettings;
