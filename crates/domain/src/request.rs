//! Dispatch requests and requirement constraints
//!
//! A request asks for one unit of a given type at a location. Requirement
//! constraints are a closed, validated set so a malformed constraint fails
//! fast instead of silently matching nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DomainError, DomainResult};
use crate::geo::Location;
use crate::resource::{Resource, ResourceType};

/// Highest urgency
pub const MIN_PRIORITY: u8 = 1;

/// Lowest urgency
pub const MAX_PRIORITY: u8 = 5;

/// Priority assumed when a draft does not name one
pub const DEFAULT_PRIORITY: u8 = 3;

/// Constraints a resource must satisfy to serve a request
///
/// All present constraints must hold. The capability constraint is
/// match-any; capacity minimums must all be met; the operator match is
/// exact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    /// Resource must have at least one of these capabilities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<BTreeSet<String>>,

    /// Resource capacity entries that must meet or exceed these values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_capacity: Option<BTreeMap<String, i64>>,

    /// Resource operator must match exactly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
}

impl Requirements {
    /// No constraints; every resource of the requested type matches
    pub fn none() -> Self {
        Self::default()
    }

    /// Require at least one of the named capabilities
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = Some(capabilities.into_iter().map(Into::into).collect());
        self
    }

    /// Require a minimum capacity figure
    pub fn with_min_capacity(mut self, kind: impl Into<String>, minimum: i64) -> Self {
        self.min_capacity
            .get_or_insert_with(BTreeMap::new)
            .insert(kind.into(), minimum);
        self
    }

    /// Require an exact operator match
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Whether no constraint is present
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_none() && self.min_capacity.is_none() && self.operator.is_none()
    }

    /// Reject constraint sets that could never match anything
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(capabilities) = &self.capabilities {
            if capabilities.is_empty() {
                return Err(DomainError::InvalidRequirements {
                    reason: "capability constraint must name at least one capability".to_string(),
                });
            }
        }
        if let Some(min_capacity) = &self.min_capacity {
            for (kind, minimum) in min_capacity {
                if *minimum <= 0 {
                    return Err(DomainError::InvalidRequirements {
                        reason: format!(
                            "minimum capacity for '{}' must be positive, got {}",
                            kind, minimum
                        ),
                    });
                }
            }
        }
        if let Some(operator) = &self.operator {
            if operator.is_empty() {
                return Err(DomainError::InvalidRequirements {
                    reason: "operator constraint must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether the given resource satisfies every present constraint
    pub fn satisfied_by(&self, resource: &Resource) -> bool {
        if let Some(required) = &self.capabilities {
            if !required.iter().any(|c| resource.capabilities.contains(c)) {
                return false;
            }
        }
        if let Some(minimums) = &self.min_capacity {
            for (kind, minimum) in minimums {
                match resource.capacity.get(kind) {
                    Some(amount) if amount >= minimum => {}
                    _ => return false,
                }
            }
        }
        if let Some(operator) = &self.operator {
            if resource.operator.as_deref() != Some(operator.as_str()) {
                return false;
            }
        }
        true
    }
}

/// A finalized dispatch request
///
/// Immutable once created; the engine stamps the identifier and creation
/// time when finalizing a [`RequestDraft`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Unique request identifier
    pub id: String,

    /// Who raised the request
    pub requester_id: String,

    /// Where help is needed
    pub location: Location,

    /// Kind of unit requested
    pub resource_type: ResourceType,

    /// Urgency from 1 (highest) to 5 (lowest)
    pub priority: u8,

    /// Constraints the assigned resource must satisfy
    pub requirements: Requirements,

    /// Free-text description of the situation
    pub description: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Response deadline (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

/// Caller-supplied fields of a dispatch request
///
/// The engine finalizes a draft by generating the identifier, stamping the
/// creation time, and defaulting the priority to [`DEFAULT_PRIORITY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDraft {
    /// Who is raising the request
    pub requester_id: String,

    /// Where help is needed
    pub location: Location,

    /// Kind of unit requested
    pub resource_type: ResourceType,

    /// Urgency from 1 (highest) to 5 (lowest); defaults to 3 when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    /// Constraints the assigned resource must satisfy
    #[serde(default)]
    pub requirements: Requirements,

    /// Free-text description of the situation
    #[serde(default)]
    pub description: String,

    /// Response deadline (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

impl RequestDraft {
    /// Create a draft with no constraints and default priority
    pub fn new(
        requester_id: impl Into<String>,
        location: Location,
        resource_type: ResourceType,
    ) -> Self {
        Self {
            requester_id: requester_id.into(),
            location,
            resource_type,
            priority: None,
            requirements: Requirements::none(),
            description: String::new(),
            deadline: None,
        }
    }

    /// Set the urgency (1 highest, 5 lowest)
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the requirement constraints
    pub fn with_requirements(mut self, requirements: Requirements) -> Self {
        self.requirements = requirements;
        self
    }

    /// Set the free-text description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the response deadline
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Validate the draft and finalize it into a [`DispatchRequest`]
    pub fn into_request(
        self,
        id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<DispatchRequest> {
        self.location.validate()?;
        self.requirements.validate()?;

        let priority = self.priority.unwrap_or(DEFAULT_PRIORITY);
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
            return Err(DomainError::InvalidPriority { priority });
        }

        Ok(DispatchRequest {
            id: id.into(),
            requester_id: self.requester_id,
            location: self.location,
            resource_type: self.resource_type,
            priority,
            requirements: self.requirements,
            description: self.description,
            created_at,
            deadline: self.deadline,
        })
    }
}
