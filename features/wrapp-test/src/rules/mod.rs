//! Extension points of the test lifecycle.
//!
//! Every rule implements the hooks it needs, all others default to doing nothing.

use std::{
    borrow::Cow,
    sync::{Arc, PoisonError, RwLock},
};

use wrapp_di::DynError;

use crate::context::TestContext;

pub mod dependency_injection;
pub mod dirty;

/// A hook into the lifecycle of a test class
///
/// Errors may be any error; returning a boxed
/// [LifecycleError](crate::errors::LifecycleError) passes it through unchanged.
pub trait TestRule<C>: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    /// Hands the rule the context of the class it belongs to, before its first hook runs
    fn set_test_context(&self, _context: Arc<TestContext<C>>) {}

    /// The context last handed to the rule, if it keeps one
    fn test_context(&self) -> Option<Arc<TestContext<C>>> {
        None
    }

    fn before_class(&self, _context: &TestContext<C>) -> Result<(), DynError> {
        Ok(())
    }

    fn prepare_instance(&self, _context: &TestContext<C>) -> Result<(), DynError> {
        Ok(())
    }

    fn before_method(&self, _context: &TestContext<C>) -> Result<(), DynError> {
        Ok(())
    }

    fn after_method(&self, _context: &TestContext<C>) -> Result<(), DynError> {
        Ok(())
    }

    fn after_class(&self, _context: &TestContext<C>) -> Result<(), DynError> {
        Ok(())
    }
}

/// Keeps the context handed to a rule
///
/// ```rust
/// use std::sync::Arc;
/// use wrapp_test::{rules::ContextHolder, TestClass, TestContext, TestRule};
///
/// struct Remembering<C> {
///     context: ContextHolder<C>,
/// }
///
/// impl<C: TestClass> TestRule<C> for Remembering<C> {
///     fn set_test_context(&self, context: Arc<TestContext<C>>) {
///         self.context.set(context);
///     }
///
///     fn test_context(&self) -> Option<Arc<TestContext<C>>> {
///         self.context.get()
///     }
/// }
/// ```
pub struct ContextHolder<C> {
    context: RwLock<Option<Arc<TestContext<C>>>>,
}
impl<C> Default for ContextHolder<C> {
    fn default() -> Self {
        ContextHolder {
            context: RwLock::new(None),
        }
    }
}
impl<C> ContextHolder<C> {
    pub fn set(&self, context: Arc<TestContext<C>>) {
        *self.context.write().unwrap_or_else(PoisonError::into_inner) = Some(context);
    }

    pub fn get(&self) -> Option<Arc<TestContext<C>>> {
        self.context
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
