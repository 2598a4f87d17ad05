use std::sync::Arc;

use thiserror::Error;
use wrapp_config::GetConfigError;
use wrapp_di::{DynError, InitError, RequireError};

/// Errors while creating a container for a configuration
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    /// No configuration source is registered for the identifier
    #[error(transparent)]
    MissingSource(#[from] GetConfigError),
    /// The configuration source failed to describe its components
    #[error("Configuration source '{id}' failed - error: {error}")]
    SourceFailed { id: String, error: Arc<DynError> },
    /// The container could not be built
    #[error("Container for '{id}' could not be built - {error}")]
    Build { id: String, error: InitError },
    /// An include failed while being applied to a fresh container
    #[error("Include #{index} of '{id}' failed - error: {error}")]
    IncludeFailed {
        id: String,
        index: usize,
        error: Arc<DynError>,
    },
    #[error("Invalid value '{value}' for {key}")]
    InvalidSetting { key: &'static str, value: String },
}

/// The lifecycle step a hook was invoked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    BeforeClass,
    PrepareInstance,
    BeforeMethod,
    AfterMethod,
    AfterClass,
}
impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::BeforeClass => "before class",
            Phase::PrepareInstance => "prepare instance",
            Phase::BeforeMethod => "before method",
            Phase::AfterMethod => "after method",
            Phase::AfterClass => "after class",
        })
    }
}

/// Everything that can make a test class or method fail
#[derive(Error, Debug, Clone)]
pub enum LifecycleError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A component could not be looked up or constructed while binding a field
    #[error("Injection into field '{field}' failed - {error}")]
    Injection { field: String, error: RequireError },
    /// A rule or listener failed
    #[error("Rule '{rule}' failed during {phase} - error: {error}")]
    Hook {
        rule: String,
        phase: Phase,
        error: Arc<DynError>,
    },
    /// The test body itself failed
    #[error("Test failed - error: {0}")]
    TestFailed(Arc<DynError>),
    #[error(transparent)]
    Multiple(#[from] MultipleFailures),
}

/// Several failures of one test, in the order they occurred
#[derive(Error, Debug, Clone)]
pub struct MultipleFailures {
    pub failures: Vec<LifecycleError>,
}
impl std::fmt::Display for MultipleFailures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push(format!("There were {} failures:", self.failures.len()));
        for failure in &self.failures {
            display.push(format!("- {}", failure));
        }
        f.write_str(&display.join("\n"))
    }
}

impl LifecycleError {
    /// Folds collected errors into one result
    ///
    /// No errors is a success, a single error is returned as-is and several errors are wrapped
    /// into [LifecycleError::Multiple]. Nested aggregates are flattened.
    pub fn aggregate(errors: Vec<LifecycleError>) -> Result<(), LifecycleError> {
        let mut failures = Vec::with_capacity(errors.len());
        for error in errors {
            match error {
                LifecycleError::Multiple(nested) => failures.extend(nested.failures),
                error => failures.push(error),
            }
        }

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(LifecycleError::Multiple(MultipleFailures { failures })),
        }
    }

    /// Wraps the error of a hook
    ///
    /// Hooks returning a boxed [LifecycleError] keep it, anything else becomes
    /// [LifecycleError::Hook].
    pub fn hook(rule: impl Into<String>, phase: Phase, error: DynError) -> Self {
        match error.downcast::<LifecycleError>() {
            Ok(lifecycle) => *lifecycle,
            Err(error) => LifecycleError::Hook {
                rule: rule.into(),
                phase,
                error: Arc::new(error),
            },
        }
    }

    /// Wraps the error of a test body
    pub fn test_failed(error: DynError) -> Self {
        match error.downcast::<LifecycleError>() {
            Ok(lifecycle) => *lifecycle,
            Err(error) => LifecycleError::TestFailed(Arc::new(error)),
        }
    }

    /// All individual failures, flattening [LifecycleError::Multiple]
    pub fn failures(&self) -> Vec<&LifecycleError> {
        match self {
            LifecycleError::Multiple(multiple) => multiple
                .failures
                .iter()
                .flat_map(LifecycleError::failures)
                .collect(),
            error => vec![error],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(message: &str) -> LifecycleError {
        LifecycleError::test_failed(message.into())
    }

    #[test]
    fn aggregate_keeps_single_errors() {
        assert!(LifecycleError::aggregate(vec![]).is_ok());

        let single = LifecycleError::aggregate(vec![failed("E1")]).unwrap_err();
        assert!(matches!(single, LifecycleError::TestFailed(_)));
    }

    #[test]
    fn aggregate_flattens_nested_failures() {
        let nested = LifecycleError::aggregate(vec![failed("E1"), failed("E2")]).unwrap_err();
        let all = LifecycleError::aggregate(vec![nested, failed("E3")]).unwrap_err();

        let messages: Vec<String> = all.failures().iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "Test failed - error: E1",
                "Test failed - error: E2",
                "Test failed - error: E3"
            ]
        );
    }

    #[test]
    fn hooks_returning_lifecycle_errors_are_not_wrapped_twice() {
        let inner = LifecycleError::Injection {
            field: "dummy_service".to_string(),
            error: RequireError::Destroyed,
        };
        let error = LifecycleError::hook(
            "DependencyInjectionRule",
            Phase::PrepareInstance,
            Box::new(inner),
        );
        assert!(matches!(error, LifecycleError::Injection { .. }));

        let error = LifecycleError::hook("Custom", Phase::AfterMethod, "broken".into());
        assert!(matches!(
            error,
            LifecycleError::Hook { phase: Phase::AfterMethod, .. }
        ));
    }
}
