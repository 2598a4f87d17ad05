use std::borrow::Cow;

use wrapp_di::DynError;

use crate::{class::TestClass, context::TestContext, rules::TestRule};

/// Which methods reset the container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// After every method
    #[default]
    All,
    /// Only after methods marked [dirty](crate::class::TestMethod::dirty)
    Dirty,
}

/// Resets the class' container after test methods
///
/// The next access builds a fresh container from the same configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirtyContainerRule {
    mode: Mode,
}

impl DirtyContainerRule {
    pub fn new(mode: Mode) -> Self {
        DirtyContainerRule { mode }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl<C: TestClass> TestRule<C> for DirtyContainerRule {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("DirtyContainerRule")
    }

    fn after_method(&self, context: &TestContext<C>) -> Result<(), DynError> {
        let method = context.test_method();
        if self.mode == Mode::Dirty && !method.as_ref().is_some_and(|m| m.is_dirty()) {
            tracing::debug!(
                "{} is not dirty, keeping container",
                method.as_ref().map_or("<none>", |m| m.name())
            );
            return Ok(());
        }

        tracing::debug!("Resetting container '{}'", context.configuration_id());
        context.reset_container();
        Ok(())
    }
}
