//! Geodesic positioning primitives
//!
//! Provides the `Location` value type and the great-circle distance math
//! used by discovery, arrival prediction, and route synthesis.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geographic position with an optional free-text address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees
    pub lat: f64,

    /// Longitude in decimal degrees
    pub lon: f64,

    /// Free-text address or place name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    /// Create a location, validating coordinate ranges
    pub fn new(lat: f64, lon: f64) -> DomainResult<Self> {
        let location = Self {
            lat,
            lon,
            address: None,
        };
        location.validate()?;
        Ok(location)
    }

    /// Attach a free-text address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Check coordinate ranges: lat in [-90, 90], lon in [-180, 180]
    pub fn validate(&self) -> DomainResult<()> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lon) {
            return Err(DomainError::InvalidCoordinates {
                lat: self.lat,
                lon: self.lon,
            });
        }
        Ok(())
    }

    /// Great-circle distance to another location, in meters
    pub fn distance_m(&self, other: &Location) -> f64 {
        haversine_m(self.lat, self.lon, other.lat, other.lon)
    }

    /// Point a fraction of the way along the straight line to `other`
    ///
    /// Linear interpolation in coordinate space. Good enough for the short
    /// synthetic routes this engine produces; not a geodesic.
    pub fn lerp(&self, other: &Location, fraction: f64) -> Location {
        Location {
            lat: self.lat + (other.lat - self.lat) * fraction,
            lon: self.lon + (other.lon - self.lon) * fraction,
            address: None,
        }
    }
}

/// Haversine great-circle distance between two coordinate pairs, in meters
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}
