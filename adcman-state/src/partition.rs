//! Partition data model and field diffing.

use serde::{Deserialize, Serialize};

use crate::route_domain::RouteDomainRef;

/// Desired state of an administrative partition.
///
/// `None` fields mean "leave as observed" on update; on create, an unset
/// route domain maps to the system default `0`.
#[derive(Debug, Clone)]
pub struct PartitionSpec {
    pub name: String,
    pub description: Option<String>,
    pub route_domain: Option<RouteDomainRef>,
    pub present: bool,
}

impl PartitionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            route_domain: None,
            present: true,
        }
    }
}

/// Partition state as currently stored on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionState {
    pub name: String,
    pub description: Option<String>,
    pub route_domain_id: u32,
}

/// Full field set handed to a partition create call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionCreate {
    pub name: String,
    pub description: Option<String>,
    pub route_domain_id: u32,
}

/// Field-level update payload; only fields that differ are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionUpdate {
    pub description: Option<String>,
    pub route_domain_id: Option<u32>,
}

impl PartitionUpdate {
    /// Diff desired values against the observed state.
    ///
    /// The route domain must already be resolved to an id; the partition
    /// name is the lookup key and never diffs.
    pub fn diff(
        observed: &PartitionState,
        description: Option<&str>,
        route_domain_id: Option<u32>,
    ) -> Self {
        let mut update = PartitionUpdate::default();

        if let Some(description) = description
            && observed.description.as_deref() != Some(description)
        {
            update.description = Some(description.to_string());
        }

        if let Some(id) = route_domain_id
            && observed.route_domain_id != id
        {
            update.route_domain_id = Some(id);
        }

        update
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.route_domain_id.is_none()
    }
}
