use std::collections::HashMap;

use wrapp_di::DeploymentMode;

use crate::{
    config::ConfigurationSource,
    errors::{GetConfigError, RegisterConfigError},
};

/// Source whose presence marks the convention settings as available
pub const CONVENTION_MARKER: &str = "convention";
/// Source whose presence marks the component creators as available
pub const CREATOR_MARKER: &str = "creator";
/// Source whose presence marks the component customizers as available
pub const CUSTOMIZER_MARKER: &str = "customizer";
/// Source whose presence means the container is configured explicitly, disabling warm deployment
pub const CONTAINER_MARKER: &str = "container";

/// A catalog of all configuration sources.
///
/// Sources are registered and retrieved by their identifier.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: HashMap<String, ConfigurationSource>,
}

impl SourceCatalog {
    /// Initializes an empty catalog
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Retrieve the source registered under `name`.
    ///
    /// If no such source exists, it will return a [`GetConfigError`]
    pub fn get_source(&self, name: &str) -> Result<ConfigurationSource, GetConfigError> {
        self.sources
            .get(name)
            .cloned()
            .ok_or_else(|| GetConfigError::Missing(name.to_string()))
    }

    /// True if a source is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Add a source to the catalog.
    ///
    /// If a source with the same name is already registered, it will return a
    /// [`RegisterConfigError`]
    pub fn add_source(
        &mut self,
        source: ConfigurationSource,
    ) -> Result<&mut Self, RegisterConfigError> {
        if self.sources.contains_key(source.name()) {
            return Err(RegisterConfigError::AlreadyRegistered(
                source.name().to_string(),
            ));
        }

        tracing::debug!("Registered configuration source '{}'", source.name());
        self.sources.insert(source.name().to_string(), source);
        Ok(self)
    }

    /// Can optionally add a source to the catalog.
    ///
    /// If the source provided is `Some(source)`, it will be the same as calling
    /// [`SourceCatalog::add_source`].
    /// If the source provided is `None`, then the function just returns `Ok(self)` for chaining
    pub fn maybe_add_source(
        &mut self,
        source: Option<ConfigurationSource>,
    ) -> Result<&mut Self, RegisterConfigError> {
        match source {
            Some(s) => self.add_source(s),
            None => Ok(self),
        }
    }

    /// Decides how containers built from this catalog are deployed
    ///
    /// Warm deployment requires it to be requested, all convention markers to be present and
    /// no explicit container configuration.
    pub fn deployment_mode(&self, warm_requested: bool) -> DeploymentMode {
        let warm = warm_requested
            && !self.contains(CONTAINER_MARKER)
            && [CONVENTION_MARKER, CREATOR_MARKER, CUSTOMIZER_MARKER]
                .iter()
                .all(|marker| self.contains(marker));

        if warm {
            DeploymentMode::Warm
        } else {
            DeploymentMode::Cold
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn catalog_with(markers: &[&'static str]) -> SourceCatalog {
        let mut catalog = SourceCatalog::new();
        for marker in markers {
            catalog.add_source(ConfigurationSource::marker(*marker)).unwrap();
        }
        catalog
    }

    #[rstest]
    #[case(&[CONVENTION_MARKER, CREATOR_MARKER, CUSTOMIZER_MARKER], true, DeploymentMode::Warm)]
    #[case(&[CONVENTION_MARKER, CREATOR_MARKER, CUSTOMIZER_MARKER], false, DeploymentMode::Cold)]
    #[case(&[CONVENTION_MARKER, CREATOR_MARKER], true, DeploymentMode::Cold)]
    #[case(
        &[CONVENTION_MARKER, CREATOR_MARKER, CUSTOMIZER_MARKER, CONTAINER_MARKER],
        true,
        DeploymentMode::Cold
    )]
    #[case(&[], true, DeploymentMode::Cold)]
    fn deployment_mode_follows_markers(
        #[case] markers: &[&'static str],
        #[case] warm_requested: bool,
        #[case] expected: DeploymentMode,
    ) {
        assert_eq!(catalog_with(markers).deployment_mode(warm_requested), expected);
    }

    #[test]
    fn duplicate_sources_are_rejected() {
        let mut catalog = catalog_with(&["FooTest"]);
        assert!(matches!(
            catalog.add_source(ConfigurationSource::marker("FooTest")),
            Err(RegisterConfigError::AlreadyRegistered(name)) if name == "FooTest"
        ));
    }

    #[test]
    fn missing_sources_are_reported() {
        let mut catalog = SourceCatalog::new();
        assert!(matches!(
            catalog.get_source("Missing"),
            Err(GetConfigError::Missing(name)) if name == "Missing"
        ));
        catalog.maybe_add_source(None).unwrap();
        assert!(catalog.is_empty());
    }
}
