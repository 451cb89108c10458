//! First-run bootstrap
//!
//! One-shot setup invoked instead of the scheduler: create the bucket if
//! absent and seed the object the steady-state download step expects.
//! Idempotent — an existing bucket is a success — but any real failure is
//! fatal to the invocation, unlike steady-state errors which are only
//! reported.

use crate::store::{BucketStatus, ObjectStore, StoreError};
use bytes::Bytes;
use thiserror::Error;

/// Fatal first-run failure
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("unable to create bucket '{bucket}': {source}")]
    CreateBucket {
        bucket: String,
        #[source]
        source: StoreError,
    },

    #[error("unable to seed object '{key}': {source}")]
    Seed {
        key: String,
        #[source]
        source: StoreError,
    },
}

/// Prepare the bucket and seed the download object.
pub async fn first_run(
    store: &dyn ObjectStore,
    bucket: &str,
    download_key: &str,
    download_expected: Bytes,
) -> Result<(), BootstrapError> {
    tracing::info!(bucket, "creating bucket");
    match store.ensure_bucket().await {
        Ok(BucketStatus::Created) => tracing::info!(bucket, "bucket created"),
        Ok(BucketStatus::AlreadyExists) => tracing::warn!(bucket, "bucket already exists"),
        Err(source) => {
            return Err(BootstrapError::CreateBucket {
                bucket: bucket.to_string(),
                source,
            })
        }
    }

    tracing::info!(key = download_key, "seeding download object");
    store
        .put(download_key, download_expected)
        .await
        .map_err(|source| BootstrapError::Seed {
            key: download_key.to_string(),
            source,
        })?;

    Ok(())
}
