//! Error types for dispatch domain validation.

use thiserror::Error;

/// Errors raised while validating dispatch domain values.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Coordinates outside the valid latitude/longitude ranges
    #[error("Invalid coordinates: lat {lat}, lon {lon}")]
    InvalidCoordinates {
        /// Rejected latitude
        lat: f64,
        /// Rejected longitude
        lon: f64,
    },

    /// Priority outside the 1-5 range
    #[error("Invalid priority {priority}: must be between 1 (highest) and 5 (lowest)")]
    InvalidPriority {
        /// Rejected priority value
        priority: u8,
    },

    /// Malformed requirement constraint
    #[error("Invalid requirements: {reason}")]
    InvalidRequirements {
        /// Why the constraint set was rejected
        reason: String,
    },
}

/// Result type for domain validation.
pub type DomainResult<T> = Result<T, DomainError>;
