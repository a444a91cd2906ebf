//! Response resource domain models
//!
//! Models the mobile response units the dispatch engine works with:
//! drones, vehicles, field teams, and any operator-defined unit type.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::geo::Location;

/// Cruise speed assumed for unit types without a dedicated entry, in m/s
pub const DEFAULT_SPEED_MPS: f64 = 10.0;

/// Kind of response unit
///
/// The named variants carry dedicated cruise speeds for arrival estimates;
/// anything else round-trips through `Custom` and moves at the default speed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceType {
    /// Aerial survey and delivery drone
    Drone,
    /// Self-driving ground vehicle
    AutonomousVehicle,
    /// Human field response team
    EmergencyTeam,
    /// Supply delivery unit
    SupplyDelivery,
    /// Mobile medical unit
    MedicalUnit,
    /// Operator-defined unit type
    Custom(String),
}

impl ResourceType {
    /// Canonical string form of this type
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::Drone => "drone",
            ResourceType::AutonomousVehicle => "autonomous_vehicle",
            ResourceType::EmergencyTeam => "emergency_team",
            ResourceType::SupplyDelivery => "supply_delivery",
            ResourceType::MedicalUnit => "medical_unit",
            ResourceType::Custom(name) => name,
        }
    }

    /// Cruise speed used for arrival estimates, in meters per second
    pub fn speed_mps(&self) -> f64 {
        match self {
            ResourceType::Drone => 15.0,
            ResourceType::AutonomousVehicle => 13.9,
            ResourceType::EmergencyTeam => 11.1,
            ResourceType::SupplyDelivery => 8.3,
            ResourceType::MedicalUnit => 16.7,
            ResourceType::Custom(_) => DEFAULT_SPEED_MPS,
        }
    }
}

impl From<String> for ResourceType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "drone" => ResourceType::Drone,
            "autonomous_vehicle" => ResourceType::AutonomousVehicle,
            "emergency_team" => ResourceType::EmergencyTeam,
            "supply_delivery" => ResourceType::SupplyDelivery,
            "medical_unit" => ResourceType::MedicalUnit,
            _ => ResourceType::Custom(value),
        }
    }
}

impl From<ResourceType> for String {
    fn from(value: ResourceType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ResourceType::from(s.to_string()))
    }
}

/// Operational status of a response unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// Ready to be claimed for dispatch
    Available,
    /// Claimed by an assignment, not yet moving
    Dispatched,
    /// Moving toward a request location
    EnRoute,
    /// On scene at a request location
    Arrived,
    /// Finished the most recent assignment
    Completed,
    /// Out of service after a fault (administrative)
    Failed,
    /// Parked for maintenance (administrative)
    Maintenance,
}

impl ResourceStatus {
    /// Canonical string form of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceStatus::Available => "available",
            ResourceStatus::Dispatched => "dispatched",
            ResourceStatus::EnRoute => "en_route",
            ResourceStatus::Arrived => "arrived",
            ResourceStatus::Completed => "completed",
            ResourceStatus::Failed => "failed",
            ResourceStatus::Maintenance => "maintenance",
        }
    }

    /// Whether a unit in this status is out on a dispatch
    pub fn is_deployed(&self) -> bool {
        matches!(self, ResourceStatus::Dispatched | ResourceStatus::EnRoute)
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dispatchable response unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource identifier
    pub id: String,

    /// Kind of unit
    pub resource_type: ResourceType,

    /// Human-readable name
    pub name: String,

    /// Current position
    pub location: Location,

    /// What the unit can do (e.g. "thermal_imaging", "search_rescue")
    pub capabilities: BTreeSet<String>,

    /// Named capacity figures (e.g. "personnel" -> 6, "cargo_kg" -> 250)
    pub capacity: BTreeMap<String, i64>,

    /// Operational status
    pub status: ResourceStatus,

    /// Operating organization (optional)
    pub operator: Option<String>,

    /// Contact channels (e.g. "radio" -> "channel-4")
    pub contact: BTreeMap<String, String>,

    /// Additional metadata
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Resource {
    /// Create an available resource with empty capability and capacity sets
    pub fn new(
        id: impl Into<String>,
        resource_type: ResourceType,
        name: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            id: id.into(),
            resource_type,
            name: name.into(),
            location,
            capabilities: BTreeSet::new(),
            capacity: BTreeMap::new(),
            status: ResourceStatus::Available,
            operator: None,
            contact: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Add a capability
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    /// Set a capacity figure
    pub fn with_capacity(mut self, kind: impl Into<String>, amount: i64) -> Self {
        self.capacity.insert(kind.into(), amount);
        self
    }

    /// Set the operating organization
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Add a contact channel
    pub fn with_contact(mut self, channel: impl Into<String>, value: impl Into<String>) -> Self {
        self.contact.insert(channel.into(), value.into());
        self
    }

    /// Set the operational status
    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Whether this unit can currently be claimed for dispatch
    pub fn is_available(&self) -> bool {
        self.status == ResourceStatus::Available
    }
}
