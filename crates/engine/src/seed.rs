//! Demo fleet seeding
//!
//! Populates a registry with a plausible mixed response fleet scattered
//! over a bounding box. Drives demos, scenario simulations, and tests;
//! pass a seeded RNG for a reproducible fleet.

use rand::Rng;
use rallypoint_domain::{Location, Resource, ResourceStatus, ResourceType};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::DispatchResult;
use crate::registry::ResourceRegistry;

/// Fleet composition and placement bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetPlan {
    /// Number of survey drones
    pub drones: usize,

    /// Number of autonomous ground vehicles
    pub vehicles: usize,

    /// Number of emergency response teams
    pub teams: usize,

    /// Southern edge of the placement box
    pub min_lat: f64,

    /// Northern edge of the placement box
    pub max_lat: f64,

    /// Western edge of the placement box
    pub min_lon: f64,

    /// Eastern edge of the placement box
    pub max_lon: f64,
}

impl Default for FleetPlan {
    // Metropolitan Sao Paulo
    fn default() -> Self {
        Self {
            drones: 5,
            vehicles: 3,
            teams: 4,
            min_lat: -23.7,
            max_lat: -23.4,
            min_lon: -46.8,
            max_lon: -46.4,
        }
    }
}

/// Seed a registry with the fleet described by `plan`
///
/// Placement and equipment vary with the RNG; identifiers and the duty
/// rotation do not, so every fifth unit overall is always down for
/// maintenance. Returns the registered ids in registration order.
pub fn seed_fleet<R: Rng + ?Sized>(
    registry: &ResourceRegistry,
    plan: &FleetPlan,
    rng: &mut R,
) -> DispatchResult<Vec<String>> {
    let mut ids = Vec::with_capacity(plan.drones + plan.vehicles + plan.teams);
    let mut unit = 0usize;

    for n in 1..=plan.drones {
        unit += 1;
        let mut drone = Resource::new(
            format!("DRONE_{n:03}"),
            ResourceType::Drone,
            format!("Drone {n}"),
            random_location(plan, rng)?,
        )
        .with_capability("aerial_survey")
        .with_capacity("payload_kg", rng.gen_range(2..=5))
        .with_operator("aero-ops")
        .with_contact("radio", format!("channel-{n}"))
        .with_metadata("battery_pct", json!(rng.gen_range(60..=100)))
        .with_status(duty_status(unit));
        if rng.gen_bool(0.7) {
            drone = drone.with_capability("thermal_imaging");
        }
        if rng.gen_bool(0.4) {
            drone = drone.with_capability("delivery");
        }
        ids.push(drone.id.clone());
        registry.register(drone)?;
    }

    for n in 1..=plan.vehicles {
        unit += 1;
        let mut vehicle = Resource::new(
            format!("AV_{n:03}"),
            ResourceType::AutonomousVehicle,
            format!("Autonomous Vehicle {n}"),
            random_location(plan, rng)?,
        )
        .with_capability("transport")
        .with_capacity("passengers", rng.gen_range(2..=6))
        .with_capacity("cargo_kg", rng.gen_range(200..=500))
        .with_operator("metro-fleet")
        .with_contact("dispatch", "metro-fleet-ops")
        .with_metadata("fuel_pct", json!(rng.gen_range(40..=100)))
        .with_status(duty_status(unit));
        if rng.gen_bool(0.5) {
            vehicle = vehicle.with_capability("evacuation");
        }
        ids.push(vehicle.id.clone());
        registry.register(vehicle)?;
    }

    for n in 1..=plan.teams {
        unit += 1;
        let mut team = Resource::new(
            format!("TEAM_{n:03}"),
            ResourceType::EmergencyTeam,
            format!("Response Team {n}"),
            random_location(plan, rng)?,
        )
        .with_capability("search_rescue")
        .with_capacity("personnel", rng.gen_range(4..=8))
        .with_operator("city-rescue")
        .with_contact("phone", format!("+55-11-5550-{n:04}"))
        .with_status(duty_status(unit));
        for specialty in ["medical", "fire_suppression", "water_rescue"] {
            if rng.gen_bool(0.5) {
                team = team.with_capability(specialty);
            }
        }
        ids.push(team.id.clone());
        registry.register(team)?;
    }

    info!(
        drones = plan.drones,
        vehicles = plan.vehicles,
        teams = plan.teams,
        "Fleet seeded"
    );
    Ok(ids)
}

fn random_location<R: Rng + ?Sized>(plan: &FleetPlan, rng: &mut R) -> DispatchResult<Location> {
    let lat = rng.gen_range(plan.min_lat..=plan.max_lat);
    let lon = rng.gen_range(plan.min_lon..=plan.max_lon);
    Ok(Location::new(lat, lon)?)
}

// Every fifth unit overall is held out for scheduled maintenance
fn duty_status(unit: usize) -> ResourceStatus {
    if unit % 5 == 0 {
        ResourceStatus::Maintenance
    } else {
        ResourceStatus::Available
    }
}
