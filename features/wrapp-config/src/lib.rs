//! Wrapp Config provides the catalog of container configurations.
//!
//! A configuration is identified by a name and describes which components a container
//! consists of. Wrapp Config is split into two parts:
//! 1. ConfigurationSource: a named blueprint registering components on a `DiBuilder`
//! 2. SourceCatalog: the registry of all sources, looked up by name
//!
//! # Examples
//!
//! ```rust
//! use wrapp_config::{ConfigurationSource, SourceCatalog};
//! use wrapp_di::DiBuilder;
//!
//! struct Mailer;
//!
//! let mut catalog = SourceCatalog::new();
//! catalog
//!     .add_source(ConfigurationSource::new("MailerTest", |builder| {
//!         Ok(builder.add_named_instance("mailer", Mailer))
//!     }))
//!     .unwrap();
//!
//! let source = catalog.get_source("MailerTest").unwrap();
//! let container = source.apply(DiBuilder::new()).unwrap().build().unwrap();
//! assert!(container.require_named::<Mailer>("mailer").is_ok());
//! ```
//!
//! The catalog also decides whether containers are deployed warm or cold, based on the
//! presence of marker sources (see [provider::CONVENTION_MARKER] and friends).

pub mod config;
pub mod errors;
pub mod provider;

pub use config::ConfigurationSource;
pub use errors::{GetConfigError, RegisterConfigError};
pub use provider::SourceCatalog;
