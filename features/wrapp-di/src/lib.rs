//! Wrapp DI is a small dependency injection container.
//!
//! Components are registered on a [DiBuilder], either as ready instances or as factories.
//! A built [DiContainer] hands components out by name or by type, constructing factories on
//! first use ([DeploymentMode::Warm]) or while building ([DeploymentMode::Cold]).
//!
//! A component may be exposed as additional types, usually trait objects. A lookup for such a
//! type, or a named lookup requesting it, hands out the component through that view:
//!
//! ```rust
//! use std::sync::Arc;
//! use wrapp_di::{ComponentKey, DiBuilder, Registration};
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//! struct FixedClock(u64);
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 {
//!         self.0
//!     }
//! }
//!
//! let container = DiBuilder::new()
//!     .add_component(Registration::instance(FixedClock(42)).expose::<dyn Clock>(|c| c))
//!     .build()
//!     .unwrap();
//!
//! assert!(container.has_component(&ComponentKey::of::<dyn Clock>()));
//! let clock: Arc<dyn Clock> = container.require().unwrap();
//! assert_eq!(clock.now(), 42);
//! ```

pub mod builder;
pub mod component;
pub mod container;
pub mod current;
mod cycle;
pub mod dependency_graph;
pub mod errors;
pub mod factories;
pub mod resolver;
pub mod types;

pub use builder::DiBuilder;
pub use component::{ErasedComponent, Registration};
pub use container::DiContainer;
pub use errors::{InitError, RegisterError, RequireError};
pub use factories::{FnFactory, InstanceFactory};
pub use resolver::{lazy::Lazy, Resolver};
pub use types::{ComponentKey, DependencyInfo, DeploymentMode, DynError, Injectable, TypeInfo};
