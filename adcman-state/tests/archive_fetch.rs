//! Archive fetch policy tests with a filesystem-backed destination.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use adcman_state::{ArchiveDevice, Error, FetchRequest, Passphrase, Result, fetch_archive};

const ARCHIVE: &str = "config.ucs";
const REMOTE_CONTENT: &[u8] = b"ucs-archive-v2";

struct FakeArchiveDevice {
    archives: Mutex<HashSet<String>>,
    created: Mutex<Vec<(String, Option<String>)>>,
    downloads: Mutex<u32>,
    fail_download: bool,
}

impl FakeArchiveDevice {
    fn new() -> Self {
        Self {
            archives: Mutex::new(HashSet::new()),
            created: Mutex::new(Vec::new()),
            downloads: Mutex::new(0),
            fail_download: false,
        }
    }

    fn with_archive(self, name: &str) -> Self {
        self.archives.lock().unwrap().insert(name.to_string());
        self
    }

    fn failing_downloads(mut self) -> Self {
        self.fail_download = true;
        self
    }

    fn download_count(&self) -> u32 {
        *self.downloads.lock().unwrap()
    }

    fn created_archives(&self) -> Vec<(String, Option<String>)> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArchiveDevice for FakeArchiveDevice {
    async fn archive_exists(&self, name: &str) -> Result<bool> {
        Ok(self.archives.lock().unwrap().contains(name))
    }

    async fn create_archive(&self, name: &str, passphrase: Option<&Passphrase>) -> Result<()> {
        self.created.lock().unwrap().push((
            name.to_string(),
            passphrase.map(|p| p.expose().to_string()),
        ));
        self.archives.lock().unwrap().insert(name.to_string());
        Ok(())
    }

    async fn download_archive(&self, name: &str, dest: &Path) -> Result<u64> {
        *self.downloads.lock().unwrap() += 1;
        if self.fail_download {
            return Err(Error::remote("archive download", "stream reset"));
        }
        assert!(self.archives.lock().unwrap().contains(name));
        tokio::fs::write(dest, REMOTE_CONTENT).await?;
        Ok(REMOTE_CONTENT.len() as u64)
    }
}

fn request_in(dir: &TempDir) -> FetchRequest {
    FetchRequest::new(ARCHIVE, dir.path().join(ARCHIVE))
}

#[tokio::test]
async fn missing_destination_always_fetches() {
    let dir = TempDir::new().unwrap();
    let device = FakeArchiveDevice::new().with_archive(ARCHIVE);
    let request = request_in(&dir);

    let report = fetch_archive(&request, &device).await.unwrap();
    assert!(report.changed);
    assert_eq!(report.bytes, REMOTE_CONTENT.len() as u64);
    assert_eq!(tokio::fs::read(&request.dest).await.unwrap(), REMOTE_CONTENT);
}

#[tokio::test]
async fn existing_destination_without_force_is_untouched() {
    let dir = TempDir::new().unwrap();
    // Source state is irrelevant when force is off; no archive on the device
    let device = FakeArchiveDevice::new();
    let mut request = request_in(&dir);
    request.force = false;
    tokio::fs::write(&request.dest, b"local copy").await.unwrap();

    let report = fetch_archive(&request, &device).await.unwrap();
    assert!(!report.changed);
    assert_eq!(
        tokio::fs::read(&request.dest).await.unwrap(),
        b"local copy"
    );
    assert_eq!(device.download_count(), 0);
}

#[tokio::test]
async fn force_refetches_over_an_existing_destination() {
    let dir = TempDir::new().unwrap();
    let device = FakeArchiveDevice::new().with_archive(ARCHIVE);
    let request = request_in(&dir);
    tokio::fs::write(&request.dest, b"stale").await.unwrap();

    let report = fetch_archive(&request, &device).await.unwrap();
    assert!(report.changed);
    assert!(report.backup_file.is_none());
    assert_eq!(tokio::fs::read(&request.dest).await.unwrap(), REMOTE_CONTENT);
}

#[tokio::test]
async fn backup_preserves_the_previous_content() {
    let dir = TempDir::new().unwrap();
    let device = FakeArchiveDevice::new().with_archive(ARCHIVE);
    let mut request = request_in(&dir);
    request.backup = true;
    tokio::fs::write(&request.dest, b"stale").await.unwrap();

    let report = fetch_archive(&request, &device).await.unwrap();
    assert!(report.changed);

    let backup = report.backup_file.expect("backup path in report");
    assert!(tokio::fs::try_exists(&backup).await.unwrap());
    assert_eq!(tokio::fs::read(&backup).await.unwrap(), b"stale");
    assert_eq!(tokio::fs::read(&request.dest).await.unwrap(), REMOTE_CONTENT);
}

#[tokio::test]
async fn missing_source_is_created_then_fetched() {
    let dir = TempDir::new().unwrap();
    let device = FakeArchiveDevice::new();
    let mut request = request_in(&dir);
    request.passphrase = Some(Passphrase::new("s3cret"));

    let report = fetch_archive(&request, &device).await.unwrap();
    assert!(report.changed);
    // The passphrase reaches the creation step verbatim
    assert_eq!(
        device.created_archives(),
        vec![(ARCHIVE.to_string(), Some("s3cret".to_string()))]
    );
    assert!(tokio::fs::try_exists(&request.dest).await.unwrap());
}

#[tokio::test]
async fn missing_source_with_creation_disabled_fetches_nothing() {
    let dir = TempDir::new().unwrap();
    let device = FakeArchiveDevice::new();
    let mut request = request_in(&dir);
    request.create_on_missing = false;

    let report = fetch_archive(&request, &device).await.unwrap();
    assert!(!report.changed);
    assert!(!tokio::fs::try_exists(&request.dest).await.unwrap());
    assert_eq!(device.download_count(), 0);
}

#[tokio::test]
async fn skipped_fetch_takes_no_backup() {
    let dir = TempDir::new().unwrap();
    let device = FakeArchiveDevice::new();
    let mut request = request_in(&dir);
    request.create_on_missing = false;
    request.backup = true;
    tokio::fs::write(&request.dest, b"local copy").await.unwrap();

    let report = fetch_archive(&request, &device).await.unwrap();
    assert!(!report.changed);
    assert!(report.backup_file.is_none());

    // Destination is the only file in the directory
    let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
    let mut count = 0;
    while entries.next_entry().await.unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 1);
}

#[tokio::test]
async fn fail_on_missing_is_an_error() {
    let dir = TempDir::new().unwrap();
    let device = FakeArchiveDevice::new();
    let mut request = request_in(&dir);
    request.fail_on_missing = true;

    let err = fetch_archive(&request, &device).await.unwrap_err();
    assert!(matches!(err, Error::SourceNotFound { name } if name == ARCHIVE));
}

#[tokio::test]
async fn failed_download_keeps_the_existing_destination() {
    let dir = TempDir::new().unwrap();
    let device = FakeArchiveDevice::new()
        .with_archive(ARCHIVE)
        .failing_downloads();
    let request = request_in(&dir);
    tokio::fs::write(&request.dest, b"stale").await.unwrap();

    let err = fetch_archive(&request, &device).await.unwrap_err();
    assert!(matches!(err, Error::RemoteOperationFailed { .. }));
    assert_eq!(tokio::fs::read(&request.dest).await.unwrap(), b"stale");

    // No partial download is left behind
    let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        names.push(entry.file_name());
    }
    assert_eq!(names, vec![std::ffi::OsString::from(ARCHIVE)]);
}
