//! In-memory object-store backend
//!
//! Backs the test suite: full version history per key, optional
//! unversioned mode, and one-shot fault injection per operation so cycle
//! tests can exercise step isolation without a live endpoint.

use super::error::{StoreError, StoreResult};
use super::{BucketStatus, ObjectStore};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;

/// Operation names accepted by [`MemoryStore::fail_next`]
pub const OPS: &[&str] = &[
    "put",
    "multipart_put",
    "get",
    "delete",
    "restore",
    "ensure_bucket",
];

#[derive(Default)]
struct Inner {
    bucket_exists: bool,
    /// Live object content per key
    live: HashMap<String, Bytes>,
    /// Version history per key, oldest first: (version id, content)
    history: HashMap<String, Vec<(String, Bytes)>>,
    next_version: u64,
    /// One-shot injected failures keyed by operation name
    faults: HashMap<&'static str, StoreError>,
}

/// In-memory [`ObjectStore`] with optional versioning
pub struct MemoryStore {
    versioned: bool,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// A store that behaves like a versioning-enabled bucket
    pub fn new() -> Self {
        Self {
            versioned: true,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// A store that never yields version ids (versioning unsupported)
    pub fn unversioned() -> Self {
        Self {
            versioned: false,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Make the next call to `op` fail with `err`. One-shot.
    pub fn fail_next(&self, op: &'static str, err: StoreError) {
        assert!(OPS.contains(&op), "unknown operation '{op}'");
        self.inner.lock().unwrap().faults.insert(op, err);
    }

    /// Current live content of `key`, if any
    pub fn live_object(&self, key: &str) -> Option<Bytes> {
        self.inner.lock().unwrap().live.get(key).cloned()
    }

    /// Whether ensure_bucket has run
    pub fn bucket_exists(&self) -> bool {
        self.inner.lock().unwrap().bucket_exists
    }

    fn take_fault(inner: &mut Inner, op: &'static str) -> StoreResult<()> {
        match inner.faults.remove(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn record_version(&self, inner: &mut Inner, key: &str, data: Bytes) -> Option<String> {
        inner.live.insert(key.to_string(), data.clone());
        if !self.versioned {
            return None;
        }
        inner.next_version += 1;
        let id = format!("v{}", inner.next_version);
        inner
            .history
            .entry(key.to_string())
            .or_default()
            .push((id.clone(), data));
        Some(id)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, data: Bytes) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_fault(&mut inner, "put")?;
        self.record_version(&mut inner, key, data);
        Ok(())
    }

    async fn multipart_put(
        &self,
        key: &str,
        data: Bytes,
        part_size: usize,
        concurrency: usize,
    ) -> StoreResult<()> {
        if part_size == 0 || concurrency == 0 {
            return Err(StoreError::MultipartUpload(
                "part size and concurrency must be non-zero".to_string(),
            ));
        }
        let mut inner = self.inner.lock().unwrap();
        Self::take_fault(&mut inner, "multipart_put")?;
        self.record_version(&mut inner, key, data);
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_fault(&mut inner, "get")?;
        inner
            .live
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                bucket: "memory".to_string(),
                key: key.to_string(),
            })
    }

    async fn delete(&self, key: &str) -> StoreResult<Option<String>> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_fault(&mut inner, "delete")?;

        // Version id of the latest entry, resolved before the delete; an
        // unversioned store yields None.
        let version_id = inner
            .history
            .get(key)
            .and_then(|h| h.last())
            .map(|(id, _)| id.clone());

        inner.live.remove(key);
        Ok(version_id)
    }

    async fn restore(&self, key: &str, version_id: Option<&str>) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_fault(&mut inner, "restore")?;

        let version_id = version_id.ok_or_else(|| StoreError::RestoreWithoutVersion {
            key: key.to_string(),
        })?;

        let data = inner
            .history
            .get(key)
            .and_then(|h| h.iter().find(|(id, _)| id == version_id))
            .map(|(_, data)| data.clone())
            .ok_or_else(|| StoreError::Service {
                code: "NoSuchVersion".to_string(),
                message: format!("version '{}' of '{}' does not exist", version_id, key),
            })?;

        inner.live.insert(key.to_string(), data);
        Ok(())
    }

    async fn ensure_bucket(&self) -> StoreResult<BucketStatus> {
        let mut inner = self.inner.lock().unwrap();
        Self::take_fault(&mut inner, "ensure_bucket")?;
        if inner.bucket_exists {
            Ok(BucketStatus::AlreadyExists)
        } else {
            inner.bucket_exists = true;
            Ok(BucketStatus::Created)
        }
    }
}
