/// Errors when trying to acquire a configuration source
#[derive(thiserror::Error, Debug, Clone)]
pub enum GetConfigError {
    /// No source is registered under the identifier
    #[error("No configuration source named '{0}' is registered")]
    Missing(String),
}

/// Errors when trying to register a configuration source
#[derive(thiserror::Error, Debug, Clone)]
pub enum RegisterConfigError {
    /// A source with the same identifier is already registered
    #[error("A configuration source named '{0}' is already registered")]
    AlreadyRegistered(String),
}
