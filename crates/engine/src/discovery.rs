//! Resource discovery
//!
//! Finds the resources able to serve a request: matching type, currently
//! available, within the search radius, and satisfying the request's
//! requirement constraints. Candidates come back ranked nearest first.

use rallypoint_domain::{DispatchRequest, Resource, ResourceStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DispatchResult;
use crate::registry::ResourceRegistry;

/// A discovery candidate with its distance from the request location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredResource {
    /// The matching resource
    pub resource: Resource,

    /// Great-circle distance from the request location in meters
    pub distance_m: f64,
}

impl DiscoveredResource {
    /// Distance from the request location in kilometers
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    /// Estimated travel time in seconds at the resource type's speed
    pub fn estimated_travel_secs(&self) -> f64 {
        self.distance_m / self.resource.resource_type.speed_mps()
    }

    /// Estimated travel time in minutes
    pub fn eta_minutes(&self) -> f64 {
        self.estimated_travel_secs() / 60.0
    }
}

/// Find resources able to serve `request`, ranked nearest first
///
/// Ties on distance break on resource id so the ranking is stable
/// across runs.
pub fn discover_ranked(
    registry: &ResourceRegistry,
    request: &DispatchRequest,
    max_distance_km: f64,
) -> DispatchResult<Vec<DiscoveredResource>> {
    let max_distance_m = max_distance_km * 1000.0;
    let candidates = registry.list(Some(&request.resource_type), Some(ResourceStatus::Available))?;

    let mut matched: Vec<DiscoveredResource> = candidates
        .into_iter()
        .filter(|r| request.requirements.satisfied_by(r))
        .map(|r| {
            let distance_m = request.location.distance_m(&r.location);
            DiscoveredResource {
                resource: r,
                distance_m,
            }
        })
        .filter(|d| d.distance_m <= max_distance_m)
        .collect();

    matched.sort_by(|a, b| {
        a.distance_m
            .total_cmp(&b.distance_m)
            .then_with(|| a.resource.id.cmp(&b.resource.id))
    });

    debug!(
        request_id = %request.id,
        resource_type = %request.resource_type,
        radius_km = max_distance_km,
        candidates = matched.len(),
        "Discovery complete"
    );
    Ok(matched)
}

/// Find resources able to serve `request`, without distance annotations
pub fn discover(
    registry: &ResourceRegistry,
    request: &DispatchRequest,
    max_distance_km: f64,
) -> DispatchResult<Vec<Resource>> {
    Ok(discover_ranked(registry, request, max_distance_km)?
        .into_iter()
        .map(|d| d.resource)
        .collect())
}
