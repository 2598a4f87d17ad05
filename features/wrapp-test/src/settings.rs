use crate::errors::RegistryError;

/// Environment variable overriding [RegistrySettings::warm_deploy]
pub const WARM_DEPLOY_ENV: &str = "WRAPP_TEST_WARM_DEPLOY";
/// Environment variable overriding [RegistrySettings::register_naming_convention]
pub const NAMING_CONVENTION_ENV: &str = "WRAPP_TEST_REGISTER_NAMING_CONVENTION";

/// Settings of a [ContainerRegistry](crate::registry::ContainerRegistry)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Request warm deployment, containers are still deployed cold unless the source catalog
    /// carries all convention markers
    pub warm_deploy: bool,
    /// Register a [DefaultNamingConvention](crate::naming::DefaultNamingConvention) in
    /// configured containers which have no naming convention
    pub register_naming_convention: bool,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            warm_deploy: true,
            register_naming_convention: true,
        }
    }
}

impl RegistrySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warm_deploy(mut self, warm_deploy: bool) -> Self {
        self.warm_deploy = warm_deploy;
        self
    }

    pub fn register_naming_convention(mut self, register: bool) -> Self {
        self.register_naming_convention = register;
        self
    }

    /// Defaults, overridden by the process environment
    pub fn from_env() -> Result<Self, RegistryError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults, overridden by whatever `lookup` returns for a setting's key
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RegistryError> {
        let mut settings = Self::default();
        if let Some(value) = lookup(WARM_DEPLOY_ENV) {
            settings.warm_deploy = parse_flag(WARM_DEPLOY_ENV, &value)?;
        }
        if let Some(value) = lookup(NAMING_CONVENTION_ENV) {
            settings.register_naming_convention = parse_flag(NAMING_CONVENTION_ENV, &value)?;
        }

        tracing::debug!("Registry settings: {:?}", settings);
        Ok(settings)
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, RegistryError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(RegistryError::InvalidSetting {
            key,
            value: value.to_string(),
        }),
    }
}
