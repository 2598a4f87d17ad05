//! Detection of re-entrant resolution.
//!
//! Factories resolve their own dependencies while being constructed. A component which is
//! required again while its factory is still running would otherwise wait on its own lock.
//! Every construction pushes a frame onto a thread-local resolution stack for the duration
//! of the call, the RAII [ResolutionGuard] pops it again.

use std::cell::RefCell;

use crate::{errors::RequireError, types::ComponentKey};

/// Resolution depth at which construction is aborted
const MAX_RESOLUTION_DEPTH: usize = 128;

struct Frame {
    container: u64,
    component: usize,
    label: &'static str,
}

thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

pub(crate) struct ResolutionGuard {
    container: u64,
    component: usize,
}

impl ResolutionGuard {
    /// Marks `component` of `container` as under construction on this thread
    pub fn enter(
        container: u64,
        component: usize,
        label: &'static str,
        key: &ComponentKey,
    ) -> Result<Self, RequireError> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();

            let already_resolving = stack
                .iter()
                .any(|frame| frame.container == container && frame.component == component);
            if already_resolving || stack.len() >= MAX_RESOLUTION_DEPTH {
                let mut chain: Vec<&'static str> = stack
                    .iter()
                    .filter(|frame| frame.container == container)
                    .map(|frame| frame.label)
                    .collect();
                chain.push(label);
                return Err(RequireError::Circular {
                    key: key.clone(),
                    chain,
                });
            }

            stack.push(Frame {
                container,
                component,
                label,
            });
            Ok(ResolutionGuard {
                container,
                component,
            })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(position) = stack.iter().rposition(|frame| {
                frame.container == self.container && frame.component == self.component
            }) {
                stack.remove(position);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reentering_the_same_component_is_circular() {
        let key = ComponentKey::name("a");
        let _outer = ResolutionGuard::enter(1, 7, "A", &key).unwrap();
        let _inner = ResolutionGuard::enter(1, 8, "B", &key).unwrap();

        match ResolutionGuard::enter(1, 7, "A", &key) {
            Err(RequireError::Circular { chain, .. }) => assert_eq!(chain, vec!["A", "B", "A"]),
            other => panic!("expected circular error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn guards_release_their_frame() {
        let key = ComponentKey::name("a");
        {
            let _guard = ResolutionGuard::enter(2, 1, "A", &key).unwrap();
        }
        assert!(ResolutionGuard::enter(2, 1, "A", &key).is_ok());
    }

    #[test]
    fn different_containers_do_not_interfere() {
        let key = ComponentKey::name("a");
        let _first = ResolutionGuard::enter(3, 1, "A", &key).unwrap();
        assert!(ResolutionGuard::enter(4, 1, "A", &key).is_ok());
    }
}
