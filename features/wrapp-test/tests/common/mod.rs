#![allow(dead_code)]

use std::{
    borrow::Cow,
    sync::{Arc, Mutex},
};

use wrapp_config::{
    provider::{CONVENTION_MARKER, CREATOR_MARKER, CUSTOMIZER_MARKER},
    ConfigurationSource, SourceCatalog,
};
use wrapp_di::DynError;
use wrapp_test::{
    rules::ContextHolder, ContainerRegistry, Phase, TestClass, TestContext, TestRule,
};

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A registry deploying warm, so failing factories only fail on lookup
pub fn registry(sources: impl IntoIterator<Item = ConfigurationSource>) -> Arc<ContainerRegistry> {
    wrapp_test::logging::init_test_logging();
    let mut catalog = SourceCatalog::new();
    let markers = [CONVENTION_MARKER, CREATOR_MARKER, CUSTOMIZER_MARKER]
        .into_iter()
        .map(|marker| ConfigurationSource::marker(marker));
    for source in markers.chain(sources) {
        catalog.add_source(source).unwrap();
    }
    Arc::new(ContainerRegistry::with_catalog(catalog))
}

/// Records every hook as `<label> <phase>` and fails the configured phases
pub struct Recorder<C> {
    label: &'static str,
    log: Log,
    failing: Vec<Phase>,
    context: ContextHolder<C>,
}

impl<C> Recorder<C> {
    pub fn new(label: &'static str, log: &Log) -> Arc<Self> {
        Self::failing(label, log, &[])
    }

    pub fn failing(label: &'static str, log: &Log, phases: &[Phase]) -> Arc<Self> {
        Arc::new(Recorder {
            label,
            log: log.clone(),
            failing: phases.to_vec(),
            context: ContextHolder::default(),
        })
    }

    fn record(&self, phase: Phase) -> Result<(), DynError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{} {}", self.label, phase));
        if self.failing.contains(&phase) {
            return Err(format!("{} failed during {}", self.label, phase).into());
        }
        Ok(())
    }
}

impl<C: TestClass> TestRule<C> for Recorder<C> {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.label)
    }

    fn set_test_context(&self, context: Arc<TestContext<C>>) {
        self.context.set(context);
    }

    fn test_context(&self) -> Option<Arc<TestContext<C>>> {
        self.context.get()
    }

    fn before_class(&self, _context: &TestContext<C>) -> Result<(), DynError> {
        self.record(Phase::BeforeClass)
    }

    fn prepare_instance(&self, _context: &TestContext<C>) -> Result<(), DynError> {
        self.record(Phase::PrepareInstance)
    }

    fn before_method(&self, _context: &TestContext<C>) -> Result<(), DynError> {
        self.record(Phase::BeforeMethod)
    }

    fn after_method(&self, _context: &TestContext<C>) -> Result<(), DynError> {
        self.record(Phase::AfterMethod)
    }

    fn after_class(&self, _context: &TestContext<C>) -> Result<(), DynError> {
        self.record(Phase::AfterClass)
    }
}
