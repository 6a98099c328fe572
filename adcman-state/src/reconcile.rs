//! Partition reconciliation.
//!
//! Computes the minimal set of remote mutations for a desired partition
//! state and reports whether any mutation was issued. Observed state is
//! fetched fresh on every call; the device is the single source of truth.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::device::PartitionDevice;
use crate::error::{Error, Result};
use crate::partition::{PartitionCreate, PartitionSpec, PartitionUpdate};
use crate::route_domain::RouteDomainRef;

/// Mutation issued by a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Created,
    Updated,
    Deleted,
}

/// Outcome of a reconciliation run.
///
/// `changed` is true iff at least one remote mutation was issued. A failed
/// apply call surfaces as an error instead of a report.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub changed: bool,
    pub action: Option<Action>,
}

impl ReconcileReport {
    pub(crate) fn unchanged() -> Self {
        Self::default()
    }

    pub(crate) fn applied(action: Action) -> Self {
        Self {
            changed: true,
            action: Some(action),
        }
    }
}

/// Reconcile a partition against the device.
pub async fn reconcile_partition<D: PartitionDevice>(
    spec: &PartitionSpec,
    device: &D,
) -> Result<ReconcileReport> {
    let observed = device.fetch_partition(&spec.name).await?;

    if !spec.present {
        return match observed {
            None => {
                debug!(name = %spec.name, "Partition already absent");
                Ok(ReconcileReport::unchanged())
            }
            Some(_) => {
                info!(name = %spec.name, "Deleting partition");
                device.delete_partition(&spec.name).await?;
                Ok(ReconcileReport::applied(Action::Deleted))
            }
        };
    }

    // Symbolic names resolve before any diff or create; an unresolvable
    // name is a hard error, not "no change".
    let route_domain_id = match &spec.route_domain {
        Some(reference) => Some(resolve(device, reference).await?),
        None => None,
    };

    match observed {
        None => {
            let fields = PartitionCreate {
                name: spec.name.clone(),
                description: spec.description.clone(),
                route_domain_id: route_domain_id.unwrap_or(0),
            };
            info!(
                name = %spec.name,
                route_domain = fields.route_domain_id,
                "Creating partition"
            );
            device.create_partition(&fields).await?;
            Ok(ReconcileReport::applied(Action::Created))
        }
        Some(current) => {
            let changes =
                PartitionUpdate::diff(&current, spec.description.as_deref(), route_domain_id);
            if changes.is_empty() {
                debug!(name = %spec.name, "Partition already in desired state");
                return Ok(ReconcileReport::unchanged());
            }
            info!(name = %spec.name, "Updating partition");
            device.update_partition(&spec.name, &changes).await?;
            Ok(ReconcileReport::applied(Action::Updated))
        }
    }
}

async fn resolve<D: PartitionDevice>(device: &D, reference: &RouteDomainRef) -> Result<u32> {
    match reference {
        RouteDomainRef::Id(id) => Ok(*id),
        RouteDomainRef::Name(name) => device
            .resolve_route_domain(name)
            .await?
            .ok_or_else(|| Error::InvalidReference { name: name.clone() }),
    }
}
