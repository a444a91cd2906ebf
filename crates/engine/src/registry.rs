//! Resource registry
//!
//! Thread-safe store of known response resources. All status changes go
//! through the registry so that claiming a resource for an assignment is
//! atomic: two dispatchers racing for the same unit cannot both win.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rallypoint_domain::{Location, Resource, ResourceStatus, ResourceType};
use tracing::{debug, info};

use crate::error::{DispatchError, DispatchResult};

/// Thread-safe registry of response resources
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    resources: RwLock<HashMap<String, Resource>>,
}

impl ResourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            resources: RwLock::new(HashMap::new()),
        }
    }

    /// Register a resource, replacing any existing entry with the same id
    pub fn register(&self, resource: Resource) -> DispatchResult<()> {
        let mut resources = self.write()?;
        debug!(
            resource_id = %resource.id,
            resource_type = %resource.resource_type,
            "Registering resource"
        );
        resources.insert(resource.id.clone(), resource);
        Ok(())
    }

    /// Fetch a snapshot of a resource by id
    pub fn get(&self, resource_id: &str) -> DispatchResult<Resource> {
        let resources = self.read()?;
        resources
            .get(resource_id)
            .cloned()
            .ok_or_else(|| DispatchError::ResourceNotFound {
                resource_id: resource_id.to_string(),
            })
    }

    /// List resources, optionally filtered by type and status, sorted by id
    pub fn list(
        &self,
        type_filter: Option<&ResourceType>,
        status_filter: Option<ResourceStatus>,
    ) -> DispatchResult<Vec<Resource>> {
        let resources = self.read()?;
        let mut matched: Vec<Resource> = resources
            .values()
            .filter(|r| type_filter.map_or(true, |t| r.resource_type == *t))
            .filter(|r| status_filter.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matched)
    }

    /// Update a resource's status and, optionally, its position
    pub fn set_status(
        &self,
        resource_id: &str,
        status: ResourceStatus,
        location: Option<Location>,
    ) -> DispatchResult<()> {
        let mut resources = self.write()?;
        let resource =
            resources
                .get_mut(resource_id)
                .ok_or_else(|| DispatchError::ResourceNotFound {
                    resource_id: resource_id.to_string(),
                })?;
        resource.status = status;
        if let Some(location) = location {
            resource.location = location;
        }
        Ok(())
    }

    /// Atomically claim an available resource for dispatch
    ///
    /// The availability check and the status change happen under one
    /// write lock, so exactly one of any set of concurrent claimers
    /// succeeds. Returns the resource as it looked at claim time.
    pub fn claim(&self, resource_id: &str) -> DispatchResult<Resource> {
        let mut resources = self.write()?;
        let resource =
            resources
                .get_mut(resource_id)
                .ok_or_else(|| DispatchError::ResourceNotFound {
                    resource_id: resource_id.to_string(),
                })?;
        if resource.status != ResourceStatus::Available {
            return Err(DispatchError::ResourceUnavailable {
                resource_id: resource_id.to_string(),
                status: resource.status,
            });
        }
        resource.status = ResourceStatus::Dispatched;
        info!(resource_id = %resource.id, "Resource claimed for dispatch");
        Ok(resource.clone())
    }

    /// Return a resource to the available pool
    pub fn release(&self, resource_id: &str) -> DispatchResult<()> {
        self.set_status(resource_id, ResourceStatus::Available, None)
    }

    /// Number of registered resources
    pub fn count(&self) -> DispatchResult<usize> {
        Ok(self.read()?.len())
    }

    fn read(&self) -> DispatchResult<RwLockReadGuard<'_, HashMap<String, Resource>>> {
        self.resources
            .read()
            .map_err(|e| DispatchError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> DispatchResult<RwLockWriteGuard<'_, HashMap<String, Resource>>> {
        self.resources
            .write()
            .map_err(|e| DispatchError::LockPoisoned(e.to_string()))
    }
}
