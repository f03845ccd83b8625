//! Error types for the fusion compass

use crate::types::SensorKind;

/// Result type for compass operations
pub type Result<T> = core::result::Result<T, CompassError>;

/// Errors surfaced by the compass control surface
///
/// Fusion failures are not errors: a degenerate gravity/magnetic pair simply
/// produces no heading for that sample.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompassError {
    /// Settings rejected at construction
    #[error("invalid settings: {0}")]
    InvalidSettings(&'static str),

    /// The provider has no sensor of the requested kind
    #[error("{0} sensor unavailable")]
    SensorUnavailable(SensorKind),

    /// The provider failed to register a listener for a stream
    #[error("failed to register {kind} sensor: {reason}")]
    RegistrationFailed { kind: SensorKind, reason: String },

    /// Operation not valid in the current tracking state
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CompassError::SensorUnavailable(SensorKind::Magnetic).to_string(),
            "magnetic sensor unavailable"
        );
        assert_eq!(
            CompassError::RegistrationFailed {
                kind: SensorKind::Gravity,
                reason: "busy".into(),
            }
            .to_string(),
            "failed to register gravity sensor: busy"
        );
        assert_eq!(
            CompassError::InvalidState("already tracking").to_string(),
            "invalid state: already tracking"
        );
    }
}
