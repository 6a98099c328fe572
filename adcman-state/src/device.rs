//! Device collaborator traits.
//!
//! The remote-access boundary for the reconcilers. Implementations own
//! transport, authentication, timeout and retry behavior; the reconcilers
//! never retry on their own.

use std::path::Path;

use async_trait::async_trait;

use crate::dns::{DnsPatch, DnsState};
use crate::error::Result;
use crate::partition::{PartitionCreate, PartitionState, PartitionUpdate};
use crate::secret::Passphrase;

/// Partition CRUD plus route-domain name resolution.
#[async_trait]
pub trait PartitionDevice {
    /// Fetch a partition by name; `None` when it does not exist.
    async fn fetch_partition(&self, name: &str) -> Result<Option<PartitionState>>;

    async fn create_partition(&self, fields: &PartitionCreate) -> Result<()>;

    /// Apply only the fields set in `changes`.
    async fn update_partition(&self, name: &str, changes: &PartitionUpdate) -> Result<()>;

    async fn delete_partition(&self, name: &str) -> Result<()>;

    /// Resolve a symbolic route-domain name to its id; `None` when unknown.
    async fn resolve_route_domain(&self, name: &str) -> Result<Option<u32>>;
}

/// Named configuration archives on the device.
#[async_trait]
pub trait ArchiveDevice {
    async fn archive_exists(&self, name: &str) -> Result<bool>;

    /// Create the archive on the device; the passphrase is handed over
    /// verbatim and must never be logged.
    async fn create_archive(&self, name: &str, passphrase: Option<&Passphrase>) -> Result<()>;

    /// Download the archive to `dest`, returning the byte count.
    async fn download_archive(&self, name: &str, dest: &Path) -> Result<u64>;
}

/// Device DNS configuration.
#[async_trait]
pub trait DnsDevice {
    /// Whether the management interface is configured via DHCP.
    async fn mgmt_dhcp_enabled(&self) -> Result<bool>;

    async fn read_dns(&self) -> Result<DnsState>;

    /// Apply only the fields set in `patch`.
    async fn apply_dns(&self, patch: &DnsPatch) -> Result<()>;

    /// Persist the running configuration.
    async fn save_config(&self) -> Result<()>;
}
