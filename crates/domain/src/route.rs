//! Route synthesis and interpolation
//!
//! Builds straight-line travel routes between a resource and a request
//! location, and maps travel progress back onto a route point.

use crate::geo::Location;

/// Target spacing between consecutive waypoints in meters
pub const WAYPOINT_SPACING_M: f64 = 5000.0;

/// Plan a straight-line route from `start` to `end`
///
/// The route always contains at least three points (start, one interior
/// point, end); longer legs get one interior waypoint roughly every
/// [`WAYPOINT_SPACING_M`] meters. Both endpoints are the exact resource
/// and request locations, addresses included, not interpolations.
pub fn plan_route(start: &Location, end: &Location) -> Vec<Location> {
    let distance_m = start.distance_m(end);
    let segments = ((distance_m / WAYPOINT_SPACING_M).round() as usize).max(2);

    let mut route = Vec::with_capacity(segments + 1);
    route.push(start.clone());
    for i in 1..segments {
        route.push(start.lerp(end, i as f64 / segments as f64));
    }
    route.push(end.clone());
    route
}

/// Route point corresponding to a travel progress fraction
///
/// Progress is clamped to [0, 1] and mapped to an index by flooring, so
/// a resource sits at a waypoint until it has fully passed it. Returns
/// `None` for an empty route.
pub fn position_along(route: &[Location], progress: f64) -> Option<&Location> {
    if route.is_empty() {
        return None;
    }
    let last = route.len() - 1;
    let index = (progress.clamp(0.0, 1.0) * last as f64) as usize;
    route.get(index.min(last))
}
