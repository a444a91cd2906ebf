//! Operational statistics
//!
//! Point-in-time dashboard over the registry and the assignment table,
//! suitable for serializing straight onto a status endpoint or console.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rallypoint_domain::{DispatchAssignment, ResourceStatus};
use serde::{Deserialize, Serialize};

use crate::error::DispatchResult;
use crate::fulfillment::FulfillmentService;

/// Number of assignments included in the dashboard's recent list
pub const RECENT_ASSIGNMENTS: usize = 10;

/// Resource counts for one resource type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceTypeStats {
    /// All registered units of this type
    pub total: usize,

    /// Units ready to be claimed
    pub available: usize,

    /// Units out serving an assignment
    pub deployed: usize,

    /// Units held out for maintenance
    pub maintenance: usize,
}

/// Point-in-time operational dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchDashboard {
    /// When the dashboard was generated
    pub generated_at: DateTime<Utc>,

    /// All registered resources
    pub total_resources: usize,

    /// Resource counts keyed by resource type
    pub resources_by_type: BTreeMap<String, ResourceTypeStats>,

    /// Assignment counts keyed by lifecycle state
    pub assignments_by_status: BTreeMap<String, usize>,

    /// Assignments not yet in a terminal state
    pub active_assignments: usize,

    /// Most recently created assignments, newest first
    pub recent_assignments: Vec<DispatchAssignment>,
}

impl FulfillmentService {
    /// Build a dashboard with every assignment advanced to `now`
    pub fn dashboard_at(&self, now: DateTime<Utc>) -> DispatchResult<DispatchDashboard> {
        let resources = self.registry().list(None, None)?;
        let assignments = self.list_assignments_at(None, usize::MAX, now)?;

        let mut resources_by_type: BTreeMap<String, ResourceTypeStats> = BTreeMap::new();
        for resource in &resources {
            let stats = resources_by_type
                .entry(resource.resource_type.to_string())
                .or_default();
            stats.total += 1;
            match resource.status {
                ResourceStatus::Available => stats.available += 1,
                ResourceStatus::Maintenance => stats.maintenance += 1,
                status if status.is_deployed() => stats.deployed += 1,
                // Arrived, Completed, and Failed only count toward the total
                _ => {}
            }
        }

        let mut assignments_by_status: BTreeMap<String, usize> = BTreeMap::new();
        for assignment in &assignments {
            *assignments_by_status
                .entry(assignment.status.to_string())
                .or_insert(0) += 1;
        }

        let active_assignments = assignments.iter().filter(|a| a.is_active()).count();
        let recent_assignments = assignments
            .into_iter()
            .take(RECENT_ASSIGNMENTS)
            .collect();

        Ok(DispatchDashboard {
            generated_at: now,
            total_resources: resources.len(),
            resources_by_type,
            assignments_by_status,
            active_assignments,
            recent_assignments,
        })
    }

    /// Build a dashboard advanced to the current time
    pub fn dashboard(&self) -> DispatchResult<DispatchDashboard> {
        self.dashboard_at(Utc::now())
    }
}
