//! RallyPoint Domain
//!
//! Core domain model for emergency resource dispatch.
//!
//! This crate provides:
//! - Geodesic positioning and great-circle distance (`Location`)
//! - Response resources with capabilities, capacity, and status (`Resource`)
//! - Dispatch requests with validated requirement constraints
//! - Assignment lifecycle with guarded state transitions
//! - Straight-line route synthesis for arrival tracking

#![warn(missing_docs)]

pub mod assignment;
pub mod error;
pub mod geo;
pub mod request;
pub mod resource;
pub mod route;

// Re-export key types for convenience
pub use assignment::{DispatchAssignment, DispatchStatus, ProgressEvent, ProgressEventKind};
pub use error::{DomainError, DomainResult};
pub use geo::{haversine_m, Location, EARTH_RADIUS_M};
pub use request::{DispatchRequest, RequestDraft, Requirements, DEFAULT_PRIORITY};
pub use resource::{Resource, ResourceStatus, ResourceType};
pub use route::{plan_route, position_along};
