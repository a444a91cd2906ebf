//! Emergency scenario presets
//!
//! Multi-resource dispatch templates for common incident categories.
//! Each scenario names the resource types it wants on scene and the
//! requirements each type must satisfy, and a simulation run files one
//! top-priority request per type with automatic resource selection.

use std::fmt;

use chrono::{DateTime, Utc};
use rallypoint_domain::{
    DispatchAssignment, DispatchRequest, Location, RequestDraft, Requirements, ResourceType,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DispatchError, DispatchResult};
use crate::fulfillment::FulfillmentService;

/// Incident categories with preset resource templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyScenario {
    /// Structural or wildland fire
    Fire,
    /// Flooding with possible water rescues
    Flood,
    /// Earthquake with collapsed structures
    Earthquake,
    /// Unclassified incident
    General,
}

impl EmergencyScenario {
    /// Canonical string form of this scenario
    pub fn as_str(&self) -> &'static str {
        match self {
            EmergencyScenario::Fire => "fire",
            EmergencyScenario::Flood => "flood",
            EmergencyScenario::Earthquake => "earthquake",
            EmergencyScenario::General => "general",
        }
    }

    /// Short incident description used on generated requests
    pub fn description(&self) -> &'static str {
        match self {
            EmergencyScenario::Fire => "Wildfire response",
            EmergencyScenario::Flood => "Flood response",
            EmergencyScenario::Earthquake => "Earthquake response",
            EmergencyScenario::General => "General emergency response",
        }
    }

    /// Resource types this scenario wants on scene, in dispatch order
    pub fn resource_types(&self) -> Vec<ResourceType> {
        match self {
            EmergencyScenario::Fire => {
                vec![ResourceType::Drone, ResourceType::EmergencyTeam]
            }
            EmergencyScenario::Flood => {
                vec![ResourceType::AutonomousVehicle, ResourceType::EmergencyTeam]
            }
            EmergencyScenario::Earthquake => {
                vec![ResourceType::EmergencyTeam, ResourceType::MedicalUnit]
            }
            EmergencyScenario::General => {
                vec![ResourceType::Drone, ResourceType::EmergencyTeam]
            }
        }
    }

    /// Requirements a resource of `resource_type` must satisfy here
    pub fn requirements_for(&self, resource_type: &ResourceType) -> Requirements {
        match (self, resource_type) {
            (EmergencyScenario::Fire, ResourceType::Drone) => {
                Requirements::none().with_capabilities(["thermal_imaging", "aerial_survey"])
            }
            (EmergencyScenario::Fire, ResourceType::EmergencyTeam) => {
                Requirements::none().with_capabilities(["fire_suppression", "search_rescue"])
            }
            (EmergencyScenario::Flood, ResourceType::AutonomousVehicle) => {
                Requirements::none().with_capabilities(["evacuation", "transport"])
            }
            (EmergencyScenario::Flood, ResourceType::EmergencyTeam) => {
                Requirements::none().with_capabilities(["water_rescue", "search_rescue"])
            }
            (EmergencyScenario::Earthquake, ResourceType::EmergencyTeam) => Requirements::none()
                .with_capabilities(["search_rescue"])
                .with_min_capacity("personnel", 4),
            _ => Requirements::none(),
        }
    }
}

impl fmt::Display for EmergencyScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scenario request with its assignment outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDispatch {
    /// The generated top-priority request
    pub request: DispatchRequest,

    /// The assignment, or `None` when no resource could be found
    pub assignment: Option<DispatchAssignment>,
}

/// Run a scenario at `location`, filing one request per resource type
///
/// Each request is created at priority 1 and auto-assigned. A resource
/// type with no claimable candidate leaves its request open rather than
/// failing the whole scenario.
pub fn simulate_emergency_at(
    service: &FulfillmentService,
    location: &Location,
    scenario: EmergencyScenario,
    now: DateTime<Utc>,
) -> DispatchResult<Vec<ScenarioDispatch>> {
    let mut dispatches = Vec::new();
    for resource_type in scenario.resource_types() {
        let draft = RequestDraft::new("simulation", location.clone(), resource_type.clone())
            .with_priority(1)
            .with_requirements(scenario.requirements_for(&resource_type))
            .with_description(format!("{} - {}", scenario.description(), resource_type));
        let request = service.create_request_at(draft, now)?;

        let assignment = match service.assign_at(&request.id, None, now) {
            Ok(assignment) => Some(assignment),
            Err(DispatchError::NoResourcesFound { .. })
            | Err(DispatchError::ResourceUnavailable { .. }) => {
                warn!(
                    request_id = %request.id,
                    resource_type = %request.resource_type,
                    "No claimable resource for scenario request"
                );
                None
            }
            Err(e) => return Err(e),
        };
        dispatches.push(ScenarioDispatch {
            request,
            assignment,
        });
    }

    info!(
        scenario = %scenario,
        requested = dispatches.len(),
        assigned = dispatches.iter().filter(|d| d.assignment.is_some()).count(),
        "Scenario simulated"
    );
    Ok(dispatches)
}

/// Run a scenario at `location`, stamped with the current time
pub fn simulate_emergency(
    service: &FulfillmentService,
    location: &Location,
    scenario: EmergencyScenario,
) -> DispatchResult<Vec<ScenarioDispatch>> {
    simulate_emergency_at(service, location, scenario, Utc::now())
}
