use thiserror::Error;

use crate::config::Feature;

/// Failures of the optional external intelligence service. Never surfaced to
/// callers; the service layer swaps in a fallback result instead.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DependencyError {
    #[error("external service timed out after {0}ms")]
    Timeout(u64),
    #[error("external service returned status {0}")]
    Status(u16),
    #[error("external service transport error: {0}")]
    Transport(String),
    #[error("external service response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("feature disabled: {0}")]
    FeatureDisabled(Feature),
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    #[error("computation failed: {0}")]
    Computation(String),
}

impl EngineError {
    /// Errors the service layer absorbs with a fallback result.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::Dependency(_) | EngineError::Computation(_))
    }
}

/// Guard used by the engines before publishing a number.
pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<f64, EngineError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::Computation(format!("{name} is not finite: {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_dependency_and_computation_errors_are_recoverable() {
        assert!(EngineError::from(DependencyError::Timeout(200)).is_recoverable());
        assert!(EngineError::Computation("nan".into()).is_recoverable());
        assert!(!EngineError::Validation("bad".into()).is_recoverable());
        assert!(!EngineError::FeatureDisabled(Feature::Pricing).is_recoverable());
    }

    #[test]
    fn ensure_finite_rejects_nan() {
        assert!(ensure_finite("price", f64::NAN).is_err());
        assert_eq!(ensure_finite("price", 1.5).unwrap(), 1.5);
    }
}
