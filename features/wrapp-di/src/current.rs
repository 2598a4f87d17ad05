//! Ambient access to the most recently created container.
//!
//! Code which can not receive a [DiContainer] explicitly may look it up here. Only the
//! component creating containers for a process should call [set_current]; everything else
//! should take the container as an argument.

use std::sync::{PoisonError, RwLock};

use crate::container::DiContainer;

static CURRENT: RwLock<Option<DiContainer>> = RwLock::new(None);

/// Publishes `container` as the current container
pub fn set_current(container: &DiContainer) {
    tracing::debug!("Current container is now #{}", container.serial());
    *CURRENT.write().unwrap_or_else(PoisonError::into_inner) = Some(container.clone());
}

/// The current container, if any was published
pub fn current() -> Option<DiContainer> {
    CURRENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Clears the current container if it is `container`
///
/// Returns true if it was cleared.
pub fn clear_current_if(container: &DiContainer) -> bool {
    let mut current = CURRENT.write().unwrap_or_else(PoisonError::into_inner);
    match current.as_ref() {
        Some(existing) if existing.ptr_eq(container) => {
            *current = None;
            true
        }
        _ => false,
    }
}
