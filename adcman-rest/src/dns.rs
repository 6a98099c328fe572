//! Device DNS endpoints.
//!
//! Name servers and search domains live on the DNS resource; forwarders,
//! the cache toggle and the management-DHCP flag are db variables.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use adcman_state::dns::{DnsCache, DnsPatch, DnsState, IpVersion};
use adcman_state::{DnsDevice, Result};

use crate::client::{DeviceClient, check, json, send};

const DNS_PATH: &str = "/mgmt/tm/sys/dns";
const DB_DNS_CACHE: &str = "/mgmt/tm/sys/db/dns.cache";
const DB_FORWARDERS: &str = "/mgmt/tm/sys/db/dns.proxy.__iter__";
const DB_MGMT_DHCP: &str = "/mgmt/tm/sys/db/dhclient.mgmt";
const CONFIG_PATH: &str = "/mgmt/tm/sys/config";

const INCLUDE_INET6: &str = "options inet6";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DnsResource {
    #[serde(default)]
    name_servers: Vec<String>,
    #[serde(default)]
    search: Vec<String>,
    include: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct DnsPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    name_servers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include: Option<String>,
}

impl DnsPayload {
    fn from_patch(patch: &DnsPatch) -> Self {
        DnsPayload {
            name_servers: patch.name_servers.clone(),
            search: patch.search_domains.clone(),
            include: patch.ip_version.map(|v| match v {
                IpVersion::V6 => INCLUDE_INET6.to_string(),
                IpVersion::V4 => String::new(),
            }),
        }
    }

    fn is_empty(&self) -> bool {
        self.name_servers.is_none() && self.search.is_none() && self.include.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct DbValue {
    value: String,
}

#[derive(Debug, Serialize)]
struct DbPayload<'a> {
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct SaveCommand<'a> {
    command: &'a str,
}

fn ip_version_from_include(include: Option<&str>) -> IpVersion {
    match include {
        Some(include) if include.contains(INCLUDE_INET6) => IpVersion::V6,
        _ => IpVersion::V4,
    }
}

fn cache_from_value(value: &str) -> Option<DnsCache> {
    match value {
        "enable" => Some(DnsCache::Enable),
        "disable" => Some(DnsCache::Disable),
        _ => None,
    }
}

#[async_trait]
impl DnsDevice for DeviceClient {
    async fn mgmt_dhcp_enabled(&self) -> Result<bool> {
        let response = send("dhcp flag read", self.get(DB_MGMT_DHCP)).await?;
        let response = check("dhcp flag read", response).await?;
        let db: DbValue = json("dhcp flag read", response).await?;
        Ok(db.value == "enable")
    }

    async fn read_dns(&self) -> Result<DnsState> {
        let response = send("dns read", self.get(DNS_PATH)).await?;
        let response = check("dns read", response).await?;
        let resource: DnsResource = json("dns read", response).await?;

        let response = send("dns cache read", self.get(DB_DNS_CACHE)).await?;
        let response = check("dns cache read", response).await?;
        let cache: DbValue = json("dns cache read", response).await?;

        let response = send("forwarders read", self.get(DB_FORWARDERS)).await?;
        let response = check("forwarders read", response).await?;
        let forwarders: DbValue = json("forwarders read", response).await?;

        Ok(DnsState {
            name_servers: resource.name_servers,
            search_domains: resource.search,
            forwarders: forwarders
                .value
                .split_whitespace()
                .map(|f| f.to_string())
                .collect(),
            cache: cache_from_value(&cache.value),
            ip_version: Some(ip_version_from_include(resource.include.as_deref())),
        })
    }

    async fn apply_dns(&self, patch: &DnsPatch) -> Result<()> {
        let payload = DnsPayload::from_patch(patch);
        if !payload.is_empty() {
            info!("Patching device DNS resource");
            let response = send("dns update", self.patch(DNS_PATH).json(&payload)).await?;
            check("dns update", response).await?;
        }

        if let Some(forwarders) = &patch.forwarders {
            let joined = forwarders.join(" ");
            info!("Patching DNS forwarders");
            let response = send(
                "forwarders update",
                self.patch(DB_FORWARDERS).json(&DbPayload { value: &joined }),
            )
            .await?;
            check("forwarders update", response).await?;
        }

        if let Some(cache) = patch.cache {
            info!(cache = cache.as_str(), "Patching DNS cache setting");
            let response = send(
                "dns cache update",
                self.patch(DB_DNS_CACHE)
                    .json(&DbPayload { value: cache.as_str() }),
            )
            .await?;
            check("dns cache update", response).await?;
        }

        Ok(())
    }

    async fn save_config(&self) -> Result<()> {
        let response = send(
            "config save",
            self.post(CONFIG_PATH).json(&SaveCommand { command: "save" }),
        )
        .await?;
        check("config save", response).await?;
        Ok(())
    }
}
