//! Fixture payloads loaded once at startup
//!
//! Two byte sequences back every cycle: the content the download step
//! expects to read back, and the content the upload steps write. Both are
//! read once from local paths and never reloaded.

use bytes::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A fixture file could not be read at startup. Fatal: the probe cannot
/// run without its reference payloads.
#[derive(Debug, Error)]
#[error("unable to read fixture file '{path}': {source}")]
pub struct FixtureError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Immutable probe payloads
#[derive(Debug, Clone)]
pub struct Fixture {
    /// Content the download step must read back, byte for byte
    pub download_expected: Bytes,

    /// Content the upload and multipart-upload steps write
    pub upload_payload: Bytes,
}

impl Fixture {
    /// Read both payloads from disk.
    pub async fn load(download_path: &Path, upload_path: &Path) -> Result<Self, FixtureError> {
        let download_expected = read_payload(download_path).await?;
        let upload_payload = read_payload(upload_path).await?;
        Ok(Self {
            download_expected,
            upload_payload,
        })
    }
}

async fn read_payload(path: &Path) -> Result<Bytes, FixtureError> {
    tokio::fs::read(path)
        .await
        .map(Bytes::from)
        .map_err(|source| FixtureError {
            path: path.to_path_buf(),
            source,
        })
}
