//! Request fulfillment
//!
//! Owns the request ledger, the assignment table, and the archive of
//! completed work. Assignment claims a resource atomically, plans the
//! travel route, and estimates arrival from the resource type's speed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use rallypoint_domain::{
    plan_route, DispatchAssignment, DispatchRequest, DispatchStatus, RequestDraft, Resource,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::discovery;
use crate::error::{DispatchError, DispatchResult};
use crate::registry::ResourceRegistry;

/// Default discovery radius for automatic resource selection, in kilometers
pub const DEFAULT_DISCOVERY_RADIUS_KM: f64 = 50.0;

/// Shared mutable handle to one assignment
pub(crate) type AssignmentHandle = Arc<Mutex<DispatchAssignment>>;

/// Completed assignment archived together with its context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentRecord {
    /// The assignment as it looked at completion
    pub assignment: DispatchAssignment,

    /// The resource after release back to the pool
    pub resource: Resource,

    /// The request that was served
    pub request: DispatchRequest,

    /// When the service finished
    pub completed_at: DateTime<Utc>,
}

/// Assignment joined with its resource and request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentDetail {
    /// The assignment snapshot
    pub assignment: DispatchAssignment,

    /// Current state of the serving resource
    pub resource: Resource,

    /// The request being served
    pub request: DispatchRequest,
}

/// Resource joined with its active assignment, if it has one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDetail {
    /// Current state of the resource
    pub resource: Resource,

    /// The non-terminal assignment this resource is serving
    pub active_assignment: Option<DispatchAssignment>,
}

/// Coordinates requests, assignments, and the resource registry
#[derive(Debug)]
pub struct FulfillmentService {
    registry: Arc<ResourceRegistry>,
    requests: RwLock<HashMap<String, DispatchRequest>>,
    assignments: RwLock<HashMap<String, AssignmentHandle>>,
    history: RwLock<Vec<FulfillmentRecord>>,
}

impl FulfillmentService {
    /// Create a service over an existing registry
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self {
            registry,
            requests: RwLock::new(HashMap::new()),
            assignments: RwLock::new(HashMap::new()),
            history: RwLock::new(Vec::new()),
        }
    }

    /// The registry this service dispatches from
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Validate a draft and record it as a dispatch request
    pub fn create_request_at(
        &self,
        draft: RequestDraft,
        now: DateTime<Utc>,
    ) -> DispatchResult<DispatchRequest> {
        let request = draft.into_request(short_id("req"), now)?;
        let mut requests = self.requests_write()?;
        info!(
            request_id = %request.id,
            resource_type = %request.resource_type,
            priority = request.priority,
            "Request created"
        );
        requests.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    /// Validate a draft and record it, stamped with the current time
    pub fn create_request(&self, draft: RequestDraft) -> DispatchResult<DispatchRequest> {
        self.create_request_at(draft, Utc::now())
    }

    /// Fetch a recorded request by id
    pub fn request(&self, request_id: &str) -> DispatchResult<DispatchRequest> {
        let requests = self.requests_read()?;
        requests
            .get(request_id)
            .cloned()
            .ok_or_else(|| DispatchError::RequestNotFound {
                request_id: request_id.to_string(),
            })
    }

    /// Bind a resource to a request
    ///
    /// With an explicit `resource_id` the named resource is claimed
    /// directly. Without one, discovery runs at
    /// [`DEFAULT_DISCOVERY_RADIUS_KM`] and candidates are claimed
    /// nearest first; a candidate taken by a concurrent dispatcher is
    /// skipped, not an error.
    pub fn assign_at(
        &self,
        request_id: &str,
        resource_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> DispatchResult<DispatchAssignment> {
        let request = self.request(request_id)?;

        let resource = match resource_id {
            Some(id) => self.registry.claim(id)?,
            None => {
                let candidates =
                    discovery::discover_ranked(&self.registry, &request, DEFAULT_DISCOVERY_RADIUS_KM)?;
                let mut claimed = None;
                for candidate in &candidates {
                    match self.registry.claim(&candidate.resource.id) {
                        Ok(resource) => {
                            claimed = Some(resource);
                            break;
                        }
                        // Lost the race for this one, try the next
                        Err(DispatchError::ResourceUnavailable { .. })
                        | Err(DispatchError::ResourceNotFound { .. }) => continue,
                        Err(e) => return Err(e),
                    }
                }
                claimed.ok_or_else(|| DispatchError::NoResourcesFound {
                    resource_type: request.resource_type.clone(),
                    radius_km: DEFAULT_DISCOVERY_RADIUS_KM,
                })?
            }
        };

        let distance_m = resource.location.distance_m(&request.location);
        let travel_secs = distance_m / resource.resource_type.speed_mps();

        let mut assignment =
            DispatchAssignment::new(short_id("assign"), &request.id, &resource.id, now);
        assignment.estimated_arrival =
            Some(now + Duration::milliseconds((travel_secs * 1000.0).round() as i64));
        assignment.route = plan_route(&resource.location, &request.location);
        assignment.current_location = Some(resource.location.clone());

        info!(
            assignment_id = %assignment.id,
            request_id = %request.id,
            resource_id = %resource.id,
            distance_m = distance_m.round(),
            travel_secs = travel_secs.round(),
            "Resource assigned"
        );

        let mut assignments = self.assignments_write()?;
        assignments.insert(
            assignment.id.clone(),
            Arc::new(Mutex::new(assignment.clone())),
        );
        Ok(assignment)
    }

    /// Bind a resource to a request, stamped with the current time
    pub fn assign(
        &self,
        request_id: &str,
        resource_id: Option<&str>,
    ) -> DispatchResult<DispatchAssignment> {
        self.assign_at(request_id, resource_id, Utc::now())
    }

    /// Snapshot an assignment without advancing it
    pub fn get(&self, assignment_id: &str) -> DispatchResult<DispatchAssignment> {
        let handle = self.handle(assignment_id)?;
        let assignment = handle
            .lock()
            .map_err(|e| DispatchError::LockPoisoned(e.to_string()))?;
        Ok(assignment.clone())
    }

    /// Snapshot an assignment joined with its resource and request
    pub fn status(&self, assignment_id: &str) -> DispatchResult<AssignmentDetail> {
        let assignment = self.get(assignment_id)?;
        let resource = self.registry.get(&assignment.resource_id)?;
        let request = self.request(&assignment.request_id)?;
        Ok(AssignmentDetail {
            assignment,
            resource,
            request,
        })
    }

    /// List assignments, newest first, advancing each to `now` beforehand
    ///
    /// Assignments removed by a concurrent caller between the snapshot
    /// and the advance are skipped.
    pub fn list_assignments_at(
        &self,
        status_filter: Option<DispatchStatus>,
        limit: usize,
        now: DateTime<Utc>,
    ) -> DispatchResult<Vec<DispatchAssignment>> {
        let ids: Vec<String> = {
            let assignments = self.assignments_read()?;
            assignments.keys().cloned().collect()
        };

        let mut listed = Vec::with_capacity(ids.len());
        for id in ids {
            match self.advance_at(&id, now) {
                Ok(assignment) => listed.push(assignment),
                Err(DispatchError::AssignmentNotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        if let Some(status) = status_filter {
            listed.retain(|a| a.status == status);
        }
        listed.sort_by(|a, b| b.assigned_at.cmp(&a.assigned_at).then_with(|| a.id.cmp(&b.id)));
        listed.truncate(limit);
        Ok(listed)
    }

    /// List assignments, newest first, advanced to the current time
    pub fn list_assignments(
        &self,
        status_filter: Option<DispatchStatus>,
        limit: usize,
    ) -> DispatchResult<Vec<DispatchAssignment>> {
        self.list_assignments_at(status_filter, limit, Utc::now())
    }

    /// Snapshot a resource joined with its active assignment, if any
    pub fn resource_detail(&self, resource_id: &str) -> DispatchResult<ResourceDetail> {
        let resource = self.registry.get(resource_id)?;

        let assignments = self.assignments_read()?;
        let mut active_assignment = None;
        for handle in assignments.values() {
            let assignment = handle
                .lock()
                .map_err(|e| DispatchError::LockPoisoned(e.to_string()))?;
            if assignment.resource_id == resource_id && assignment.is_active() {
                active_assignment = Some(assignment.clone());
                break;
            }
        }

        Ok(ResourceDetail {
            resource,
            active_assignment,
        })
    }

    /// Archive of completed assignments, oldest first
    pub fn fulfillment_history(&self) -> DispatchResult<Vec<FulfillmentRecord>> {
        let history = self
            .history
            .read()
            .map_err(|e| DispatchError::LockPoisoned(e.to_string()))?;
        Ok(history.clone())
    }

    pub(crate) fn handle(&self, assignment_id: &str) -> DispatchResult<AssignmentHandle> {
        let assignments = self.assignments_read()?;
        assignments
            .get(assignment_id)
            .cloned()
            .ok_or_else(|| DispatchError::AssignmentNotFound {
                assignment_id: assignment_id.to_string(),
            })
    }

    pub(crate) fn push_history(&self, record: FulfillmentRecord) -> DispatchResult<()> {
        let mut history = self
            .history
            .write()
            .map_err(|e| DispatchError::LockPoisoned(e.to_string()))?;
        history.push(record);
        Ok(())
    }

    fn requests_read(&self) -> DispatchResult<RwLockReadGuard<'_, HashMap<String, DispatchRequest>>> {
        self.requests
            .read()
            .map_err(|e| DispatchError::LockPoisoned(e.to_string()))
    }

    fn requests_write(
        &self,
    ) -> DispatchResult<RwLockWriteGuard<'_, HashMap<String, DispatchRequest>>> {
        self.requests
            .write()
            .map_err(|e| DispatchError::LockPoisoned(e.to_string()))
    }

    fn assignments_read(
        &self,
    ) -> DispatchResult<RwLockReadGuard<'_, HashMap<String, AssignmentHandle>>> {
        self.assignments
            .read()
            .map_err(|e| DispatchError::LockPoisoned(e.to_string()))
    }

    fn assignments_write(
        &self,
    ) -> DispatchResult<RwLockWriteGuard<'_, HashMap<String, AssignmentHandle>>> {
        self.assignments
            .write()
            .map_err(|e| DispatchError::LockPoisoned(e.to_string()))
    }
}

impl Default for FulfillmentService {
    fn default() -> Self {
        Self::new(Arc::new(ResourceRegistry::new()))
    }
}

fn short_id(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &id[..8])
}
