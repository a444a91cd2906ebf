//! Assignment lifecycle management
//!
//! Tracks the binding of one resource to one request through the
//! dispatch lifecycle, with guarded state transitions and a
//! deduplicated progress log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo::Location;

/// Assignment lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// Resource bound to a request, movement not yet started
    Assigned,
    /// Resource en route to the request location
    Dispatched,
    /// Resource on scene, service underway
    InProgress,
    /// Service finished, resource released
    Completed,
    /// Assignment cancelled before completion
    Cancelled,
    /// Assignment failed (administrative; never set by the tracker)
    Failed,
}

impl DispatchStatus {
    /// Check if the state is terminal (completed, cancelled, or failed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DispatchStatus::Completed | DispatchStatus::Cancelled | DispatchStatus::Failed
        )
    }

    /// Check if a transition to the new state is valid
    pub fn can_transition_to(&self, new_status: DispatchStatus) -> bool {
        match (self, new_status) {
            // From Assigned
            (DispatchStatus::Assigned, DispatchStatus::Dispatched) => true,
            (DispatchStatus::Assigned, DispatchStatus::Cancelled) => true,
            (DispatchStatus::Assigned, DispatchStatus::Failed) => true,
            // From Dispatched
            (DispatchStatus::Dispatched, DispatchStatus::InProgress) => true,
            (DispatchStatus::Dispatched, DispatchStatus::Cancelled) => true,
            (DispatchStatus::Dispatched, DispatchStatus::Failed) => true,
            // From InProgress
            (DispatchStatus::InProgress, DispatchStatus::Completed) => true,
            (DispatchStatus::InProgress, DispatchStatus::Cancelled) => true,
            (DispatchStatus::InProgress, DispatchStatus::Failed) => true,
            // Terminal states cannot transition; no backward movement
            _ => false,
        }
    }

    /// Canonical string form of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Assigned => "assigned",
            DispatchStatus::Dispatched => "dispatched",
            DispatchStatus::InProgress => "in_progress",
            DispatchStatus::Completed => "completed",
            DispatchStatus::Cancelled => "cancelled",
            DispatchStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of progress log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventKind {
    /// Resource started moving
    Dispatched,
    /// Position update while traveling
    EnRoute,
    /// Resource reached the request location
    Arrived,
    /// Service finished
    Completed,
}

/// One entry in an assignment's progress log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// When the event was observed
    pub timestamp: DateTime<Utc>,

    /// What happened
    pub kind: ProgressEventKind,

    /// Human-readable summary
    pub message: String,

    /// Travel progress percentage, when applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_pct: Option<u8>,
}

impl ProgressEvent {
    /// Create a progress event
    pub fn new(
        timestamp: DateTime<Utc>,
        kind: ProgressEventKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            kind,
            message: message.into(),
            progress_pct: None,
        }
    }

    /// Attach a travel progress percentage
    pub fn with_progress(mut self, pct: u8) -> Self {
        self.progress_pct = Some(pct);
        self
    }
}

/// Binding of one resource to one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchAssignment {
    /// Unique assignment identifier
    pub id: String,

    /// Request being served
    pub request_id: String,

    /// Resource serving the request
    pub resource_id: String,

    /// Current lifecycle state
    pub status: DispatchStatus,

    /// When the resource was bound
    pub assigned_at: DateTime<Utc>,

    /// Predicted arrival time
    pub estimated_arrival: Option<DateTime<Utc>>,

    /// Observed arrival time
    pub actual_arrival: Option<DateTime<Utc>>,

    /// When the service finished
    pub completion_time: Option<DateTime<Utc>>,

    /// Planned travel route; starts at the resource position at assignment
    /// time and ends at the request location
    pub route: Vec<Location>,

    /// Last known position along the route
    pub current_location: Option<Location>,

    /// Progress log, oldest first
    pub progress_log: Vec<ProgressEvent>,
}

impl DispatchAssignment {
    /// Create a new assignment in the `Assigned` state
    pub fn new(
        id: impl Into<String>,
        request_id: impl Into<String>,
        resource_id: impl Into<String>,
        assigned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            request_id: request_id.into(),
            resource_id: resource_id.into(),
            status: DispatchStatus::Assigned,
            assigned_at,
            estimated_arrival: None,
            actual_arrival: None,
            completion_time: None,
            route: Vec::new(),
            current_location: None,
            progress_log: Vec::new(),
        }
    }

    /// Move to a new status, stamping arrival and completion times
    ///
    /// Returns `false` and leaves the assignment untouched when the
    /// transition is not in the legal edge set.
    pub fn transition(&mut self, new_status: DispatchStatus, timestamp: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(new_status) {
            return false;
        }

        self.status = new_status;
        match new_status {
            DispatchStatus::InProgress => self.actual_arrival = Some(timestamp),
            DispatchStatus::Completed => self.completion_time = Some(timestamp),
            _ => {}
        }
        true
    }

    /// Append a progress event unless it duplicates the previous entry
    ///
    /// Two consecutive entries with the same kind and percentage are
    /// considered redundant polls of an unchanged state.
    pub fn log_event(&mut self, event: ProgressEvent) {
        if let Some(last) = self.progress_log.last() {
            if last.kind == event.kind && last.progress_pct == event.progress_pct {
                return;
            }
        }
        self.progress_log.push(event);
    }

    /// Fraction of the predicted travel window elapsed at `now`, in [0, 1]
    ///
    /// A missing or non-positive window counts as already arrived.
    pub fn progress_fraction(&self, now: DateTime<Utc>) -> f64 {
        let eta = match self.estimated_arrival {
            Some(eta) => eta,
            None => return 1.0,
        };
        let total_ms = (eta - self.assigned_at).num_milliseconds();
        if total_ms <= 0 {
            return 1.0;
        }
        let elapsed_ms = (now - self.assigned_at).num_milliseconds();
        (elapsed_ms as f64 / total_ms as f64).clamp(0.0, 1.0)
    }

    /// Final route point, the request location
    pub fn destination(&self) -> Option<&Location> {
        self.route.last()
    }

    /// Whether the assignment is still live
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}
