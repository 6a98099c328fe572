//! Device DNS settings reconciliation.
//!
//! Name servers, search domains and forwarders diff independently; the
//! device configuration is saved once per invocation when anything changed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::device::DnsDevice;
use crate::error::{Error, Result};
use crate::reconcile::{Action, ReconcileReport};

/// DNS lookup caching on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DnsCache {
    Enable,
    Disable,
}

impl DnsCache {
    pub fn as_str(&self) -> &'static str {
        match self {
            DnsCache::Enable => "enable",
            DnsCache::Disable => "disable",
        }
    }
}

/// IP version used for DNS resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpVersion {
    V4,
    V6,
}

/// Desired DNS configuration.
///
/// Empty lists and `None` scalars mean "leave as observed". With `append`,
/// list entries are added to the device lists instead of replacing them.
#[derive(Debug, Clone, Default)]
pub struct DnsSettings {
    pub name_servers: Vec<String>,
    pub search_domains: Vec<String>,
    pub forwarders: Vec<String>,
    pub cache: Option<DnsCache>,
    pub ip_version: Option<IpVersion>,
    pub append: bool,
}

impl DnsSettings {
    fn has_entries(&self) -> bool {
        !self.name_servers.is_empty()
            || !self.search_domains.is_empty()
            || !self.forwarders.is_empty()
    }

    fn is_empty(&self) -> bool {
        !self.has_entries() && self.cache.is_none() && self.ip_version.is_none()
    }
}

/// DNS configuration as currently stored on the device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnsState {
    pub name_servers: Vec<String>,
    pub search_domains: Vec<String>,
    pub forwarders: Vec<String>,
    pub cache: Option<DnsCache>,
    pub ip_version: Option<IpVersion>,
}

/// Field patch applied to the device; only set fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DnsPatch {
    pub name_servers: Option<Vec<String>>,
    pub search_domains: Option<Vec<String>>,
    pub forwarders: Option<Vec<String>>,
    pub cache: Option<DnsCache>,
    pub ip_version: Option<IpVersion>,
}

impl DnsPatch {
    pub fn is_empty(&self) -> bool {
        self.name_servers.is_none()
            && self.search_domains.is_none()
            && self.forwarders.is_none()
            && self.cache.is_none()
            && self.ip_version.is_none()
    }
}

/// Ensure the given DNS entries and scalars are present on the device.
pub async fn ensure_present<D: DnsDevice>(
    settings: &DnsSettings,
    device: &D,
) -> Result<ReconcileReport> {
    if settings.is_empty() {
        return Err(Error::Validation(
            "At least one DNS setting is required".to_string(),
        ));
    }
    if settings.append && !settings.has_entries() {
        return Err(Error::Validation(
            "Append requires name servers, search domains or forwarders".to_string(),
        ));
    }
    guard_mgmt_dhcp(device).await?;

    let current = device.read_dns().await?;
    let patch = present_patch(settings, &current);
    if patch.is_empty() {
        debug!("DNS settings already in desired state");
        return Ok(ReconcileReport::unchanged());
    }

    info!("Updating device DNS settings");
    device.apply_dns(&patch).await?;
    device.save_config().await?;
    Ok(ReconcileReport::applied(Action::Updated))
}

/// Remove the given DNS entries from the device lists.
pub async fn ensure_absent<D: DnsDevice>(
    settings: &DnsSettings,
    device: &D,
) -> Result<ReconcileReport> {
    if !settings.has_entries() {
        return Err(Error::Validation(
            "Removal requires name servers, search domains or forwarders".to_string(),
        ));
    }
    guard_mgmt_dhcp(device).await?;

    let current = device.read_dns().await?;
    let patch = absent_patch(settings, &current);
    if patch.is_empty() {
        debug!("No matching DNS entries on the device");
        return Ok(ReconcileReport::unchanged());
    }

    info!("Removing device DNS entries");
    device.apply_dns(&patch).await?;
    device.save_config().await?;
    Ok(ReconcileReport::applied(Action::Updated))
}

/// DNS cannot be managed while the management interface is under DHCP control.
async fn guard_mgmt_dhcp<D: DnsDevice>(device: &D) -> Result<()> {
    if device.mgmt_dhcp_enabled().await? {
        return Err(Error::Validation(
            "DHCP on the management interface must be disabled to manage DNS".to_string(),
        ));
    }
    Ok(())
}

fn present_patch(settings: &DnsSettings, current: &DnsState) -> DnsPatch {
    let mut patch = DnsPatch {
        name_servers: merge_list(&settings.name_servers, &current.name_servers, settings.append),
        search_domains: merge_list(
            &settings.search_domains,
            &current.search_domains,
            settings.append,
        ),
        forwarders: merge_list(&settings.forwarders, &current.forwarders, settings.append),
        ..DnsPatch::default()
    };

    if let Some(cache) = settings.cache
        && current.cache != Some(cache)
    {
        patch.cache = Some(cache);
    }
    if let Some(ip_version) = settings.ip_version
        && current.ip_version != Some(ip_version)
    {
        patch.ip_version = Some(ip_version);
    }

    patch
}

fn absent_patch(settings: &DnsSettings, current: &DnsState) -> DnsPatch {
    DnsPatch {
        name_servers: remove_list(&settings.name_servers, &current.name_servers),
        search_domains: remove_list(&settings.search_domains, &current.search_domains),
        forwarders: remove_list(&settings.forwarders, &current.forwarders),
        ..DnsPatch::default()
    }
}

/// Replacement list for one field group, `None` when already satisfied.
fn merge_list(desired: &[String], current: &[String], append: bool) -> Option<Vec<String>> {
    if desired.is_empty() {
        return None;
    }

    if append {
        let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
        if desired.iter().all(|entry| current_set.contains(entry.as_str())) {
            return None;
        }
        let mut merged = current.to_vec();
        for entry in desired {
            if !merged.contains(entry) {
                merged.push(entry.clone());
            }
        }
        Some(merged)
    } else if current != desired {
        Some(desired.to_vec())
    } else {
        None
    }
}

/// Remaining list after removing the unwanted entries, `None` when nothing
/// matched.
fn remove_list(unwanted: &[String], current: &[String]) -> Option<Vec<String>> {
    if unwanted.is_empty() || current.is_empty() {
        return None;
    }

    let remaining: Vec<String> = current
        .iter()
        .filter(|entry| !unwanted.contains(entry))
        .cloned()
        .collect();

    if remaining.len() == current.len() {
        None
    } else {
        Some(remaining)
    }
}
