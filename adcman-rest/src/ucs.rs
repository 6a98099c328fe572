//! UCS archive endpoints.
//!
//! Archives are created through the sys/ucs save command and downloaded as
//! a byte stream from the file-transfer endpoint.

use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::info;

use adcman_state::{ArchiveDevice, Error, Passphrase, Result};

use crate::client::{DeviceClient, check, json, send};

const UCS_PATH: &str = "/mgmt/tm/sys/ucs";
const UCS_DOWNLOAD_BASE: &str = "/mgmt/shared/file-transfer/ucs-downloads";

#[derive(Debug, Deserialize)]
struct UcsCollection {
    #[serde(default)]
    items: Vec<UcsItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UcsItem {
    api_raw_values: UcsRawValues,
}

#[derive(Debug, Deserialize)]
struct UcsRawValues {
    filename: String,
}

#[derive(Debug, Serialize)]
struct UcsSaveCommand<'a> {
    command: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    passphrase: Option<&'a str>,
}

/// Device filenames are absolute paths under the archive directory.
fn filename_matches(filename: &str, name: &str) -> bool {
    filename
        .rsplit('/')
        .next()
        .is_some_and(|basename| basename == name)
}

#[async_trait]
impl ArchiveDevice for DeviceClient {
    async fn archive_exists(&self, name: &str) -> Result<bool> {
        let response = send("archive list", self.get(UCS_PATH)).await?;
        let response = check("archive list", response).await?;
        let collection: UcsCollection = json("archive list", response).await?;
        Ok(collection
            .items
            .iter()
            .any(|item| filename_matches(&item.api_raw_values.filename, name)))
    }

    async fn create_archive(&self, name: &str, passphrase: Option<&Passphrase>) -> Result<()> {
        let command = UcsSaveCommand {
            command: "save",
            name,
            passphrase: passphrase.map(Passphrase::expose),
        };
        info!(name = %name, "Saving UCS archive on device");
        let response = send("archive create", self.post(UCS_PATH).json(&command)).await?;
        check("archive create", response).await?;
        Ok(())
    }

    async fn download_archive(&self, name: &str, dest: &Path) -> Result<u64> {
        let path = format!("{}/{}", UCS_DOWNLOAD_BASE, name);
        let response = send("archive download", self.get(&path)).await?;
        let response = check("archive download", response).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut bytes: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::remote("archive download", e.to_string()))?;
            file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
        }
        file.flush().await?;

        info!(name = %name, bytes, "UCS archive downloaded");
        Ok(bytes)
    }
}
