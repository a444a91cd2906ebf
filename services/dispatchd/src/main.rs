mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rallypoint_domain::Location;
use rallypoint_engine::{
    logging, seed_fleet, simulate_emergency_at, FulfillmentService, ResourceRegistry,
};
use serde::Serialize;
use tracing::warn;

use config::DaemonConfig;

const DISPATCH_PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct DaemonVersionHandshake {
    version: &'static str,
    protocol_version: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--version-json") {
        let handshake = DaemonVersionHandshake {
            version: env!("CARGO_PKG_VERSION"),
            protocol_version: DISPATCH_PROTOCOL_VERSION,
        };
        println!("{}", serde_json::to_string(&handshake)?);
        return Ok(());
    }

    let config = match parse_config_path(&args)? {
        Some(path) => DaemonConfig::from_file(path)?,
        None => DaemonConfig::default_config(),
    };

    if config.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    eprintln!(
        "[dispatchd] started node_id={} scenario={} fleet={}d/{}v/{}t time_scale={}",
        config.node_id,
        config.simulation.scenario,
        config.fleet.drones,
        config.fleet.vehicles,
        config.fleet.teams,
        config.simulation.time_scale
    );

    run_simulation(&config)
}

fn run_simulation(config: &DaemonConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = Arc::new(ResourceRegistry::new());
    let service = FulfillmentService::new(Arc::clone(&registry));

    let mut rng = match config.fleet.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    seed_fleet(&registry, &config.fleet.plan(), &mut rng)?;

    let incident = Location::new(
        config.simulation.incident_lat,
        config.simulation.incident_lon,
    )?;

    let mut sim_now = Utc::now();
    let dispatches =
        simulate_emergency_at(&service, &incident, config.simulation.scenario, sim_now)?;
    let open = dispatches.iter().filter(|d| d.assignment.is_none()).count();
    if open > 0 {
        warn!(open, "Scenario requests left without a resource");
    }

    // Simulated time runs time_scale times faster than the poll clock
    loop {
        thread::sleep(StdDuration::from_millis(config.simulation.poll_interval_ms));
        sim_now = sim_now
            + Duration::milliseconds(
                (config.simulation.poll_interval_ms as f64 * config.simulation.time_scale) as i64,
            );

        let assignments = service.list_assignments_at(None, usize::MAX, sim_now)?;
        if assignments.iter().all(|a| !a.is_active()) {
            break;
        }
    }

    let dashboard = service.dashboard_at(sim_now)?;
    println!("{}", serde_json::to_string_pretty(&dashboard)?);
    Ok(())
}

fn parse_config_path(args: &[String]) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    let mut args_iter = args.iter();
    while let Some(arg) = args_iter.next() {
        if arg == "--config" {
            if let Some(path) = args_iter.next() {
                return Ok(Some(PathBuf::from(path)));
            }
            return Err("--config was provided without a path".into());
        }
    }

    Ok(None)
}
