//! adcman-state: idempotent state reconciliation for ADC appliances
//!
//! Desired/observed data model, field diffing and the reconciliation engines
//! for administrative partitions, device DNS settings and UCS archive
//! fetches. Remote access goes through the traits in [`device`]; transport,
//! timeout and retry behavior belong to the implementations.

pub mod archive;
pub mod device;
pub mod dns;
pub mod error;
pub mod partition;
pub mod reconcile;
pub mod route_domain;
pub mod secret;

pub use archive::{FetchReport, FetchRequest, fetch_archive};
pub use device::{ArchiveDevice, DnsDevice, PartitionDevice};
pub use dns::{DnsCache, DnsPatch, DnsSettings, DnsState, IpVersion};
pub use error::{Error, Result};
pub use partition::{PartitionCreate, PartitionSpec, PartitionState, PartitionUpdate};
pub use reconcile::{Action, ReconcileReport, reconcile_partition};
pub use route_domain::RouteDomainRef;
pub use secret::Passphrase;
