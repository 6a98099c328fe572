//! Partition and route-domain endpoints.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

use adcman_state::{
    PartitionCreate, PartitionDevice, PartitionState, PartitionUpdate, Result,
};

use crate::client::{DeviceClient, check, json, send};

const PARTITION_BASE: &str = "/mgmt/tm/auth/partition";
const ROUTE_DOMAIN_BASE: &str = "/mgmt/tm/net/route-domain";

/// Wire form of a partition resource.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartitionResource {
    name: String,
    description: Option<String>,
    #[serde(default)]
    default_route_domain: u32,
}

impl From<PartitionResource> for PartitionState {
    fn from(resource: PartitionResource) -> Self {
        PartitionState {
            name: resource.name,
            description: resource.description,
            route_domain_id: resource.default_route_domain,
        }
    }
}

/// Create/update payload; unset fields are left out of the body entirely.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct PartitionPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_route_domain: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PartitionCollection {
    #[serde(default)]
    items: Vec<PartitionResource>,
}

#[derive(Debug, Deserialize)]
struct RouteDomainResource {
    id: u32,
}

impl DeviceClient {
    /// All partitions on the device.
    pub async fn list_partitions(&self) -> Result<Vec<PartitionState>> {
        let response = send("partition list", self.get(PARTITION_BASE)).await?;
        let response = check("partition list", response).await?;
        let collection: PartitionCollection = json("partition list", response).await?;
        Ok(collection.items.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PartitionDevice for DeviceClient {
    async fn fetch_partition(&self, name: &str) -> Result<Option<PartitionState>> {
        let path = format!("{}/{}", PARTITION_BASE, name);
        let response = send("partition fetch", self.get(&path)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check("partition fetch", response).await?;
        let resource: PartitionResource = json("partition fetch", response).await?;
        Ok(Some(resource.into()))
    }

    async fn create_partition(&self, fields: &PartitionCreate) -> Result<()> {
        let payload = PartitionPayload {
            name: Some(&fields.name),
            description: fields.description.as_deref(),
            default_route_domain: Some(fields.route_domain_id),
        };
        info!(name = %fields.name, "Creating partition on device");
        let response = send("partition create", self.post(PARTITION_BASE).json(&payload)).await?;
        check("partition create", response).await?;
        Ok(())
    }

    async fn update_partition(&self, name: &str, changes: &PartitionUpdate) -> Result<()> {
        let payload = PartitionPayload {
            name: None,
            description: changes.description.as_deref(),
            default_route_domain: changes.route_domain_id,
        };
        let path = format!("{}/{}", PARTITION_BASE, name);
        info!(name = %name, "Updating partition on device");
        let response = send("partition update", self.patch(&path).json(&payload)).await?;
        check("partition update", response).await?;
        Ok(())
    }

    async fn delete_partition(&self, name: &str) -> Result<()> {
        let path = format!("{}/{}", PARTITION_BASE, name);
        info!(name = %name, "Deleting partition on device");
        let response = send("partition delete", self.delete(&path)).await?;
        check("partition delete", response).await?;
        Ok(())
    }

    async fn resolve_route_domain(&self, name: &str) -> Result<Option<u32>> {
        let path = format!("{}/{}", ROUTE_DOMAIN_BASE, name);
        let response = send("route domain lookup", self.get(&path)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check("route domain lookup", response).await?;
        let resource: RouteDomainResource = json("route domain lookup", response).await?;
        Ok(Some(resource.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_payload_carries_only_set_fields() {
        let payload = PartitionPayload {
            name: None,
            description: Some("app A"),
            default_route_domain: None,
        };
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"description":"app A"}"#
        );
    }

    #[test]
    fn create_payload_uses_device_field_names() {
        let payload = PartitionPayload {
            name: Some("app-a"),
            description: None,
            default_route_domain: Some(0),
        };
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"name":"app-a","defaultRouteDomain":0}"#
        );
    }

    #[test]
    fn partition_resource_defaults_the_route_domain() {
        let resource: PartitionResource =
            serde_json::from_str(r#"{"name":"Common","description":"factory"}"#).unwrap();
        let state = PartitionState::from(resource);
        assert_eq!(state.route_domain_id, 0);
        assert_eq!(state.description.as_deref(), Some("factory"));
    }
}
