//! Object-store capability interface and backends
//!
//! The probe talks to storage through the [`ObjectStore`] trait: a small,
//! stateless capability set (put, multipart put, get, delete-with-version,
//! restore, ensure-bucket). There is exactly one production backend,
//! [`S3Store`], built on `aws-sdk-s3`, and one in-memory backend,
//! [`MemoryStore`], used by tests.

mod client;
mod error;
pub mod memory;

pub use client::{S3Store, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

use async_trait::async_trait;
use bytes::Bytes;

/// Minimum multipart part size accepted by S3 (5 MiB)
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Part size used by the multipart probe step
pub const PROBE_PART_SIZE: usize = MIN_PART_SIZE;

/// In-flight part limit used by the multipart probe step
pub const PROBE_PART_CONCURRENCY: usize = 5;

/// Outcome of an ensure-bucket call. "Already exists" (including already
/// owned by the caller) is a success, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    /// The bucket was created by this call
    Created,
    /// The bucket already existed (possibly owned by the caller)
    AlreadyExists,
}

/// Capability interface over the object store.
///
/// Each operation is independent and stateless from the caller's
/// perspective; connection reuse inside a backend is an implementation
/// detail.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `data` to `key` in a single request.
    async fn put(&self, key: &str, data: Bytes) -> StoreResult<()>;

    /// Upload `data` to `key` as a multipart upload: split into parts of
    /// `part_size` (at least one part, the last may be short) and upload
    /// with at most `concurrency` parts in flight.
    async fn multipart_put(
        &self,
        key: &str,
        data: Bytes,
        part_size: usize,
        concurrency: usize,
    ) -> StoreResult<()>;

    /// Download the object at `key`. A missing object is the distinct
    /// [`StoreError::NotFound`] variant.
    async fn get(&self, key: &str) -> StoreResult<Bytes>;

    /// Delete the object at `key`, first resolving its current version id
    /// by listing versions (the id is unrecoverable after the delete).
    ///
    /// Returns `Ok(None)` when the key has no version list (unversioned
    /// store) — that is not a delete failure.
    async fn delete(&self, key: &str) -> StoreResult<Option<String>>;

    /// Copy the given previous version back onto the live key.
    ///
    /// `None` fails fast with [`StoreError::RestoreWithoutVersion`] instead
    /// of attempting an undefined restore.
    async fn restore(&self, key: &str, version_id: Option<&str>) -> StoreResult<()>;

    /// Create the configured bucket if absent.
    async fn ensure_bucket(&self) -> StoreResult<BucketStatus>;
}
