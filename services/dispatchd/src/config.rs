//! Configuration management for dispatchd.

use rallypoint_engine::{EmergencyScenario, FleetPlan};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub node_id: String,
    pub log_json: bool,
    pub fleet: FleetConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    pub drones: usize,
    pub vehicles: usize,
    pub teams: usize,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub scenario: EmergencyScenario,
    pub incident_lat: f64,
    pub incident_lon: f64,
    pub poll_interval_ms: u64,
    pub time_scale: f64,
}

impl FleetConfig {
    pub fn plan(&self) -> FleetPlan {
        FleetPlan {
            drones: self.drones,
            vehicles: self.vehicles,
            teams: self.teams,
            min_lat: self.min_lat,
            max_lat: self.max_lat,
            min_lon: self.min_lon,
            max_lon: self.max_lon,
        }
    }
}

impl DaemonConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(raw)?;
        // The poll loop divides simulated time by these; zero stalls it forever
        anyhow::ensure!(
            config.simulation.time_scale > 0.0,
            "simulation.time_scale must be positive, got {}",
            config.simulation.time_scale
        );
        anyhow::ensure!(
            config.simulation.poll_interval_ms > 0,
            "simulation.poll_interval_ms must be positive"
        );
        Ok(config)
    }

    pub fn default_config() -> Self {
        let plan = FleetPlan::default();
        Self {
            node_id: "dispatch-001".to_string(),
            log_json: false,
            fleet: FleetConfig {
                drones: plan.drones,
                vehicles: plan.vehicles,
                teams: plan.teams,
                min_lat: plan.min_lat,
                max_lat: plan.max_lat,
                min_lon: plan.min_lon,
                max_lon: plan.max_lon,
                seed: Some(42),
            },
            simulation: SimulationConfig {
                scenario: EmergencyScenario::Fire,
                incident_lat: -23.5613,
                incident_lon: -46.6565,
                poll_interval_ms: 500,
                time_scale: 60.0,
            },
        }
    }
}
