//! Archive fetch-and-cache policy.
//!
//! Downloads go through a temporary sibling path and are renamed into place,
//! so a failed transfer never clobbers an existing destination.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::device::ArchiveDevice;
use crate::error::{Error, Result};
use crate::secret::Passphrase;

/// Options for fetching a named archive to a local destination.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub name: String,
    pub dest: PathBuf,
    /// Re-fetch over an existing destination (default true)
    pub force: bool,
    /// Preserve an existing destination under a backup path first
    pub backup: bool,
    /// Create the archive on the device when it is missing (default true)
    pub create_on_missing: bool,
    /// Treat a missing archive as an error instead of "nothing fetched"
    pub fail_on_missing: bool,
    pub passphrase: Option<Passphrase>,
}

impl FetchRequest {
    pub fn new(name: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dest: dest.into(),
            force: true,
            backup: false,
            create_on_missing: true,
            fail_on_missing: false,
            passphrase: None,
        }
    }
}

/// Outcome of an archive fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchReport {
    pub changed: bool,
    /// Where the previous destination was preserved, when a backup was taken
    pub backup_file: Option<PathBuf>,
    pub bytes: u64,
}

/// Fetch an archive according to the request policy.
pub async fn fetch_archive<D: ArchiveDevice>(
    request: &FetchRequest,
    device: &D,
) -> Result<FetchReport> {
    let dest_exists = tokio::fs::try_exists(&request.dest).await?;

    if dest_exists && !request.force {
        debug!(
            dest = %request.dest.display(),
            "Destination exists and force is off, skipping fetch"
        );
        return Ok(FetchReport::default());
    }

    // The source must be fetchable before the destination is touched, so a
    // skipped fetch leaves no backup behind.
    if !device.archive_exists(&request.name).await? {
        if request.fail_on_missing {
            return Err(Error::SourceNotFound {
                name: request.name.clone(),
            });
        }
        if !request.create_on_missing {
            debug!(
                name = %request.name,
                "Archive missing on device and creation disabled, nothing to fetch"
            );
            return Ok(FetchReport::default());
        }
        info!(name = %request.name, "Creating archive on device");
        device
            .create_archive(&request.name, request.passphrase.as_ref())
            .await?;
    }

    let mut report = FetchReport {
        changed: true,
        ..FetchReport::default()
    };

    if dest_exists && request.backup {
        let backup = backup_path(&request.dest);
        tokio::fs::copy(&request.dest, &backup).await?;
        info!(backup = %backup.display(), "Preserved existing destination");
        report.backup_file = Some(backup);
    }

    let tmp = tmp_path(&request.dest);
    let bytes = match device.download_archive(&request.name, &tmp).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e);
        }
    };
    tokio::fs::rename(&tmp, &request.dest).await?;

    info!(
        name = %request.name,
        dest = %request.dest.display(),
        bytes,
        "Archive fetched"
    );
    report.bytes = bytes;
    Ok(report)
}

fn backup_path(dest: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    append_suffix(dest, &format!(".{}.bak", stamp))
}

fn tmp_path(dest: &Path) -> PathBuf {
    append_suffix(dest, ".part")
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
