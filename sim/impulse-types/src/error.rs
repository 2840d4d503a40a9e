//! Error types for the physics core.
//!
//! The simulation loop itself never fails: numerical edge cases are recovered
//! locally. Errors are reserved for caller mistakes that silently clamping
//! would hide.

use thiserror::Error;

use crate::BodyHandle;

/// Errors surfaced by the physics core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    /// A handle that does not (or no longer) refer to a live body.
    #[error("invalid body reference: {handle}")]
    InvalidBody {
        /// The offending handle.
        handle: BodyHandle,
    },

    /// A body was described with physically impossible parameters.
    #[error("invalid body configuration: {reason}")]
    InvalidBodyConfig {
        /// Description of what's wrong.
        reason: String,
    },

    /// A world or solver configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl PhysicsError {
    /// Create an invalid body reference error.
    #[must_use]
    pub fn invalid_body(handle: BodyHandle) -> Self {
        Self::InvalidBody { handle }
    }

    /// Create an invalid body configuration error.
    #[must_use]
    pub fn invalid_body_config(reason: impl Into<String>) -> Self {
        Self::InvalidBodyConfig {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Check if this error came from a stale or unknown handle.
    #[must_use]
    pub fn is_invalid_body(&self) -> bool {
        matches!(self, Self::InvalidBody { .. })
    }

    /// Check if this error came from body construction.
    #[must_use]
    pub fn is_body_config_error(&self) -> bool {
        matches!(self, Self::InvalidBodyConfig { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PhysicsError::invalid_body(BodyHandle::new(3, 7));
        let text = err.to_string();
        assert!(text.contains("invalid body reference"));
        assert!(text.contains('3'));

        let err = PhysicsError::invalid_body_config("mass cannot be negative");
        assert!(err.to_string().contains("mass cannot be negative"));
    }

    #[test]
    fn test_error_predicates() {
        let err = PhysicsError::invalid_body(BodyHandle::new(0, 0));
        assert!(err.is_invalid_body());
        assert!(!err.is_body_config_error());

        let err = PhysicsError::invalid_body_config("negative radius");
        assert!(err.is_body_config_error());
        assert!(!err.is_invalid_body());
    }
}
