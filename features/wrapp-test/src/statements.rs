//! Before/after sequencing around test classes and methods.
//!
//! Before-hooks run in registration order and stop at the first failure. After-hooks are
//! pushed onto a [CleanupStack] and unwound last-in first-out; every one of them runs, and
//! all failures are collected together with the failure of the wrapped body.

use wrapp_di::DynError;

use crate::{
    class::{TestClass, TestInstance, TestMethod},
    errors::LifecycleError,
    manager::TestContextManager,
};

type CleanupAction<'a> = Box<dyn FnOnce() -> Result<(), LifecycleError> + 'a>;

/// Cleanup actions, run in reverse order of registration
pub struct CleanupStack<'a> {
    actions: Vec<CleanupAction<'a>>,
}
impl Default for CleanupStack<'_> {
    fn default() -> Self {
        CleanupStack {
            actions: Vec::new(),
        }
    }
}
impl<'a> CleanupStack<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: impl FnOnce() -> Result<(), LifecycleError> + 'a) {
        self.actions.push(Box::new(action));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Runs every action, last pushed first, returning all failures in the order they occurred
    pub fn unwind(mut self) -> Vec<LifecycleError> {
        let mut errors = Vec::new();
        while let Some(action) = self.actions.pop() {
            if let Err(error) = action() {
                errors.push(error);
            }
        }
        errors
    }
}

/// Runs a whole test class
///
/// `children` runs the methods of the class; it is skipped if a before-class hook fails.
pub fn run_test_class<C, F>(
    manager: &TestContextManager<C>,
    children: F,
) -> Result<(), LifecycleError>
where
    C: TestClass,
    F: FnOnce() -> Result<(), LifecycleError>,
{
    manager.prepare_class();

    let mut errors = Vec::new();
    match manager.before_test_class() {
        Ok(()) => {
            if let Err(error) = children() {
                errors.push(error);
            }
        }
        Err(error) => errors.push(error),
    }

    if let Err(error) = manager.after_test_class(errors.first().cloned()) {
        errors.push(error);
    }
    LifecycleError::aggregate(errors)
}

/// Runs one test method on a prepared instance
///
/// The body is skipped if a before-method hook fails; the after-method hooks always run and
/// see the failure of the body (or of the before-hook) through the test context.
pub fn run_test_method<C, F>(
    manager: &TestContextManager<C>,
    instance: &TestInstance<C>,
    method: &TestMethod,
    body: F,
) -> Result<(), LifecycleError>
where
    C: TestClass,
    F: FnOnce(&mut C) -> Result<(), DynError>,
{
    let mut errors = Vec::new();
    match manager.before_test_method(instance, method) {
        Ok(()) => {
            let result = {
                let mut instance = instance
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                body(&mut *instance)
            };
            if let Err(error) = result {
                errors.push(LifecycleError::test_failed(error));
            }
        }
        Err(error) => errors.push(error),
    }

    if let Err(error) = manager.after_test_method(instance, method, errors.first().cloned()) {
        errors.push(error);
    }
    LifecycleError::aggregate(errors)
}
