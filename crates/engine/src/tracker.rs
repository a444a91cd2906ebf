//! Assignment tracking
//!
//! Pull-model progression: nothing moves on its own, each poll advances
//! an assignment by at most one lifecycle step before reporting it.
//! Travel progress is derived from the predicted arrival window, and
//! arrivals must dwell on scene before the work can complete.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rallypoint_domain::{
    position_along, DispatchAssignment, DispatchStatus, Location, ProgressEvent,
    ProgressEventKind, ResourceStatus, ResourceType,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{DispatchError, DispatchResult};
use crate::fulfillment::{FulfillmentRecord, FulfillmentService};

/// On-scene service time required before completion, in seconds
///
/// An arrival only completes once strictly more than this much time has
/// passed since the resource reached the request location.
pub const SERVICE_DWELL_SECS: i64 = 300;

/// Number of trailing progress events included in a tracking view
pub const TRACK_RECENT_EVENTS: usize = 5;

/// Live tracking view of one assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingInfo {
    /// Assignment being tracked
    pub assignment_id: String,

    /// Lifecycle state after advancing to the polling time
    pub status: DispatchStatus,

    /// Serving resource identifier
    pub resource_id: String,

    /// Serving resource display name
    pub resource_name: String,

    /// Serving resource type
    pub resource_type: ResourceType,

    /// Travel progress percentage; 100 once on scene
    pub progress_pct: u8,

    /// Last known position along the route
    pub current_location: Option<Location>,

    /// Request location the route ends at
    pub destination: Option<Location>,

    /// Predicted arrival time
    pub estimated_arrival: Option<DateTime<Utc>>,

    /// Observed arrival time
    pub actual_arrival: Option<DateTime<Utc>>,

    /// Most recent progress events, oldest first
    pub recent_events: Vec<ProgressEvent>,

    /// Contact channels for the serving resource
    pub contact: BTreeMap<String, String>,
}

impl FulfillmentService {
    /// Advance an assignment by at most one lifecycle step at `now`
    ///
    /// `Assigned` starts travel. `Dispatched` either updates the en-route
    /// position or, once the predicted window has elapsed, records the
    /// arrival. `InProgress` completes after the service dwell. Terminal
    /// assignments are returned unchanged.
    pub fn advance_at(
        &self,
        assignment_id: &str,
        now: DateTime<Utc>,
    ) -> DispatchResult<DispatchAssignment> {
        let handle = self.handle(assignment_id)?;
        let mut assignment = handle
            .lock()
            .map_err(|e| DispatchError::LockPoisoned(e.to_string()))?;

        match assignment.status {
            DispatchStatus::Assigned => {
                assignment.transition(DispatchStatus::Dispatched, now);
                self.registry()
                    .set_status(&assignment.resource_id, ResourceStatus::EnRoute, None)?;
                assignment.log_event(ProgressEvent::new(
                    now,
                    ProgressEventKind::Dispatched,
                    "Dispatched, heading to request location",
                ));
                info!(
                    assignment_id = %assignment.id,
                    resource_id = %assignment.resource_id,
                    "Assignment dispatched"
                );
            }
            DispatchStatus::Dispatched => {
                let progress = assignment.progress_fraction(now);
                if progress >= 1.0 {
                    assignment.transition(DispatchStatus::InProgress, now);
                    let destination = assignment.route.last().cloned();
                    assignment.current_location = destination.clone();
                    self.registry().set_status(
                        &assignment.resource_id,
                        ResourceStatus::Arrived,
                        destination,
                    )?;
                    assignment.log_event(
                        ProgressEvent::new(
                            now,
                            ProgressEventKind::Arrived,
                            "Arrived at request location",
                        )
                        .with_progress(100),
                    );
                    info!(
                        assignment_id = %assignment.id,
                        resource_id = %assignment.resource_id,
                        "Resource arrived on scene"
                    );
                } else {
                    let pct = (progress * 100.0) as u8;
                    assignment.current_location =
                        position_along(&assignment.route, progress).cloned();
                    assignment.log_event(
                        ProgressEvent::new(
                            now,
                            ProgressEventKind::EnRoute,
                            format!("En route: {pct}% complete"),
                        )
                        .with_progress(pct),
                    );
                }
            }
            DispatchStatus::InProgress => {
                let arrived_at = match assignment.actual_arrival {
                    Some(arrived_at) => arrived_at,
                    None => assignment.assigned_at,
                };
                if (now - arrived_at).num_milliseconds() > SERVICE_DWELL_SECS * 1000 {
                    assignment.transition(DispatchStatus::Completed, now);
                    self.registry().set_status(
                        &assignment.resource_id,
                        ResourceStatus::Completed,
                        None,
                    )?;
                    self.registry().release(&assignment.resource_id)?;
                    assignment.log_event(ProgressEvent::new(
                        now,
                        ProgressEventKind::Completed,
                        "Service completed, resource released",
                    ));
                    let record = FulfillmentRecord {
                        assignment: assignment.clone(),
                        resource: self.registry().get(&assignment.resource_id)?,
                        request: self.request(&assignment.request_id)?,
                        completed_at: now,
                    };
                    self.push_history(record)?;
                    info!(
                        assignment_id = %assignment.id,
                        resource_id = %assignment.resource_id,
                        "Assignment completed"
                    );
                }
            }
            // Terminal states hold
            DispatchStatus::Completed | DispatchStatus::Cancelled | DispatchStatus::Failed => {}
        }

        Ok(assignment.clone())
    }

    /// Advance an assignment using the current time
    pub fn advance(&self, assignment_id: &str) -> DispatchResult<DispatchAssignment> {
        self.advance_at(assignment_id, Utc::now())
    }

    /// Cancel a live assignment at `now` and release its resource
    ///
    /// Returns `Ok(true)` when the assignment was cancelled and
    /// `Ok(false)` when it had already reached a terminal state.
    pub fn cancel_at(&self, assignment_id: &str, now: DateTime<Utc>) -> DispatchResult<bool> {
        let handle = self.handle(assignment_id)?;
        let mut assignment = handle
            .lock()
            .map_err(|e| DispatchError::LockPoisoned(e.to_string()))?;

        if assignment.status.is_terminal() {
            return Ok(false);
        }

        assignment.transition(DispatchStatus::Cancelled, now);
        self.registry().release(&assignment.resource_id)?;
        info!(
            assignment_id = %assignment.id,
            resource_id = %assignment.resource_id,
            "Assignment cancelled"
        );
        Ok(true)
    }

    /// Cancel a live assignment using the current time
    pub fn cancel(&self, assignment_id: &str) -> DispatchResult<bool> {
        self.cancel_at(assignment_id, Utc::now())
    }

    /// Advance an assignment to `now` and build its tracking view
    pub fn track_at(&self, assignment_id: &str, now: DateTime<Utc>) -> DispatchResult<TrackingInfo> {
        let assignment = self.advance_at(assignment_id, now)?;
        let resource = self.registry().get(&assignment.resource_id)?;

        let progress_pct = match assignment.status {
            DispatchStatus::InProgress | DispatchStatus::Completed => 100,
            _ => (assignment.progress_fraction(now) * 100.0).min(100.0) as u8,
        };

        let skip = assignment
            .progress_log
            .len()
            .saturating_sub(TRACK_RECENT_EVENTS);
        Ok(TrackingInfo {
            assignment_id: assignment.id.clone(),
            status: assignment.status,
            resource_id: resource.id.clone(),
            resource_name: resource.name.clone(),
            resource_type: resource.resource_type.clone(),
            progress_pct,
            current_location: assignment.current_location.clone(),
            destination: assignment.route.last().cloned(),
            estimated_arrival: assignment.estimated_arrival,
            actual_arrival: assignment.actual_arrival,
            recent_events: assignment.progress_log[skip..].to_vec(),
            contact: resource.contact,
        })
    }

    /// Advance an assignment to the current time and build its tracking view
    pub fn track(&self, assignment_id: &str) -> DispatchResult<TrackingInfo> {
        self.track_at(assignment_id, Utc::now())
    }
}
