//! RallyPoint Engine
//!
//! Emergency dispatch coordination over the RallyPoint domain model.
//!
//! This crate provides:
//! - A thread-safe resource registry with atomic claiming
//! - Distance-ranked resource discovery with requirement filtering
//! - Request fulfillment (assignment, routing, arrival estimation)
//! - Pull-model assignment tracking with on-scene service dwell
//! - Scenario presets, demo fleet seeding, and an operational dashboard

#![warn(missing_docs)]

pub mod discovery;
pub mod error;
pub mod fulfillment;
pub mod logging;
pub mod registry;
pub mod scenario;
pub mod seed;
pub mod stats;
pub mod tracker;

// Re-export key types for convenience
pub use discovery::{discover, discover_ranked, DiscoveredResource};
pub use error::{DispatchError, DispatchResult};
pub use fulfillment::{
    AssignmentDetail, FulfillmentRecord, FulfillmentService, ResourceDetail,
    DEFAULT_DISCOVERY_RADIUS_KM,
};
pub use registry::ResourceRegistry;
pub use scenario::{simulate_emergency, simulate_emergency_at, EmergencyScenario, ScenarioDispatch};
pub use seed::{seed_fleet, FleetPlan};
pub use stats::{DispatchDashboard, ResourceTypeStats};
pub use tracker::{TrackingInfo, SERVICE_DWELL_SECS, TRACK_RECENT_EVENTS};
