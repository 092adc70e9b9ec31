//! Error types for rigid-body simulation.

use thiserror::Error;

/// Errors that can occur while assembling or stepping a rigid-body system.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A body id that does not belong to the system.
    #[error("invalid body ID: {0}")]
    InvalidBodyId(u64),

    /// A constraint id that does not belong to the system.
    #[error("invalid constraint ID: {0}")]
    InvalidConstraintId(u64),

    /// A precomputation handle that does not belong to the system.
    #[error("invalid precomputation handle: {0}")]
    InvalidPrecomputation(u64),

    /// Invalid timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// Invalid mass properties.
    #[error("invalid mass properties: {reason}")]
    InvalidMassProperties {
        /// Description of what's wrong.
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// A constraint that cannot be built from the given parameters.
    #[error("invalid constraint: {reason}")]
    InvalidConstraint {
        /// Description of the problem.
        reason: String,
    },

    /// The effective-mass matrix of a constraint could not be inverted.
    #[error("singular effective mass in constraint '{label}'")]
    SingularConstraint {
        /// Label of the offending constraint.
        label: String,
    },

    /// Precomputed geometry was read in a step other than the one it was computed for.
    #[error("stale precomputation: computed at step {computed_at:?}, requested at step {requested_at}")]
    StalePrecomputation {
        /// Step the data was last computed for, if ever.
        computed_at: Option<u64>,
        /// Step that asked for the data.
        requested_at: u64,
    },

    /// A `NaN` or infinite value where a finite one was required.
    #[error("non-finite value in {what}")]
    NonFinite {
        /// What was being computed.
        what: String,
    },
}

impl SimError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an invalid mass properties error.
    #[must_use]
    pub fn invalid_mass(reason: impl Into<String>) -> Self {
        Self::InvalidMassProperties {
            reason: reason.into(),
        }
    }

    /// Create an invalid constraint error.
    #[must_use]
    pub fn invalid_constraint(reason: impl Into<String>) -> Self {
        Self::InvalidConstraint {
            reason: reason.into(),
        }
    }

    /// Create a singular constraint error.
    #[must_use]
    pub fn singular(label: impl Into<String>) -> Self {
        Self::SingularConstraint {
            label: label.into(),
        }
    }

    /// Create a non-finite value error.
    #[must_use]
    pub fn non_finite(what: impl Into<String>) -> Self {
        Self::NonFinite { what: what.into() }
    }

    /// Check if this is an assembly-time configuration error.
    ///
    /// Configuration errors are raised before the first step and are never
    /// produced by the step loop itself.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidBodyId(_)
                | Self::InvalidConstraintId(_)
                | Self::InvalidPrecomputation(_)
                | Self::InvalidTimestep(_)
                | Self::InvalidMassProperties { .. }
                | Self::InvalidConfig { .. }
                | Self::InvalidConstraint { .. }
        )
    }

    /// Check if this is a numerical problem contained within one step.
    #[must_use]
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            Self::SingularConstraint { .. } | Self::NonFinite { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::InvalidBodyId(42);
        assert_eq!(err.to_string(), "invalid body ID: 42");

        let err = SimError::singular("aileron hinge");
        assert!(err.to_string().contains("aileron hinge"));

        let err = SimError::StalePrecomputation {
            computed_at: Some(3),
            requested_at: 4,
        };
        assert!(err.to_string().contains("requested at step 4"));
    }

    #[test]
    fn test_error_classification() {
        assert!(SimError::invalid_config("x").is_config_error());
        assert!(SimError::invalid_mass("x").is_config_error());
        assert!(SimError::InvalidTimestep(-1.0).is_config_error());
        assert!(!SimError::singular("x").is_config_error());
        assert!(SimError::singular("x").is_numerical());
        assert!(SimError::non_finite("x").is_numerical());
    }
}
