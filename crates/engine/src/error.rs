//! Error types for the dispatch engine

use rallypoint_domain::{DomainError, ResourceStatus, ResourceType};
use thiserror::Error;

/// Errors that can occur in dispatch operations
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request identifier is not known to the service
    #[error("Request {request_id} not found")]
    RequestNotFound {
        /// The unknown request identifier
        request_id: String,
    },

    /// Resource identifier is not known to the registry
    #[error("Resource {resource_id} not found")]
    ResourceNotFound {
        /// The unknown resource identifier
        resource_id: String,
    },

    /// Resource exists but cannot be claimed right now
    #[error("Resource {resource_id} is not available (status: {status})")]
    ResourceUnavailable {
        /// The contested resource identifier
        resource_id: String,
        /// Status the resource was in at claim time
        status: ResourceStatus,
    },

    /// Discovery produced no claimable candidates
    #[error("No resources of type {resource_type} found within {radius_km} km")]
    NoResourcesFound {
        /// Requested resource type
        resource_type: ResourceType,
        /// Search radius that was exhausted
        radius_km: f64,
    },

    /// Assignment identifier is not known to the service
    #[error("Assignment {assignment_id} not found")]
    AssignmentNotFound {
        /// The unknown assignment identifier
        assignment_id: String,
    },

    /// Input failed domain validation
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),

    /// A shared lock was poisoned by a panicking thread
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;
