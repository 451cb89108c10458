//! One probe pass over the configured storage operations
//!
//! The cycle runs its steps in a fixed order — upload, optional multipart
//! upload, optional delete+restore, download-with-verify — and isolates
//! every failure to the step that produced it. A probe must maximize signal
//! per interval: one unreachable operation still leaves the others
//! measured. Disabled steps emit nothing, so absence of a metric means
//! "not probed", never "failed".

use super::consistency;
use super::result::{ObjectVersion, Operation, ProbeResult, StepError};
use crate::fixture::Fixture;
use crate::metrics::MetricsSink;
use crate::store::{ObjectStore, PROBE_PART_CONCURRENCY, PROBE_PART_SIZE};
use std::sync::Arc;
use std::time::Instant;

/// Which steps a cycle runs, and against which keys
#[derive(Debug, Clone)]
pub struct CycleOptions {
    /// Key written by the upload and multipart-upload steps
    pub upload_key: String,

    /// Key exercised by the versioning check and the download step
    pub download_key: String,

    /// Run the multipart-upload step
    pub multipart_check: bool,

    /// Run the delete+restore versioning check
    pub versioning_check: bool,
}

impl CycleOptions {
    /// Operations a cycle with these options will probe, in order
    pub fn enabled_operations(&self) -> Vec<Operation> {
        let mut ops = vec![Operation::Upload];
        if self.multipart_check {
            ops.push(Operation::MultipartUpload);
        }
        if self.versioning_check {
            ops.push(Operation::Delete);
            ops.push(Operation::Restore);
        }
        ops.push(Operation::Download);
        ops
    }
}

/// Orchestrates one pass of storage operations and reports one
/// [`ProbeResult`] per enabled step to the sink.
pub struct ProbeCycle {
    store: Arc<dyn ObjectStore>,
    fixture: Arc<Fixture>,
    options: CycleOptions,
    sink: Arc<dyn MetricsSink>,
}

impl ProbeCycle {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        fixture: Arc<Fixture>,
        options: CycleOptions,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            store,
            fixture,
            options,
            sink,
        }
    }

    /// Run one full pass. Always returns exactly one result per enabled
    /// step, regardless of failures; nothing propagates past this boundary.
    pub async fn run(&self) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(5);

        results.push(self.upload_step().await);
        if self.options.multipart_check {
            results.push(self.multipart_step().await);
        }
        if self.options.versioning_check {
            self.versioning_steps(&mut results).await;
        }
        results.push(self.download_step().await);

        results
    }

    async fn upload_step(&self) -> ProbeResult {
        self.sink.begin(Operation::Upload);
        let start = Instant::now();
        let outcome = self
            .store
            .put(&self.options.upload_key, self.fixture.upload_payload.clone())
            .await
            .map_err(StepError::from);
        self.finish(Operation::Upload, start, outcome)
    }

    async fn multipart_step(&self) -> ProbeResult {
        self.sink.begin(Operation::MultipartUpload);
        let start = Instant::now();
        let outcome = self
            .store
            .multipart_put(
                &self.options.upload_key,
                self.fixture.upload_payload.clone(),
                PROBE_PART_SIZE,
                PROBE_PART_CONCURRENCY,
            )
            .await
            .map_err(StepError::from);
        self.finish(Operation::MultipartUpload, start, outcome)
    }

    /// Delete the download object capturing its version id, then restore
    /// it. Restore runs even when delete failed or yielded no id — it then
    /// reports its own error instead of cascading silently.
    async fn versioning_steps(&self, results: &mut Vec<ProbeResult>) {
        self.sink.begin(Operation::Delete);
        let start = Instant::now();
        let delete_outcome = self.store.delete(&self.options.download_key).await;

        let version = ObjectVersion {
            key: self.options.download_key.clone(),
            version_id: delete_outcome.as_ref().ok().cloned().flatten(),
        };
        results.push(self.finish(
            Operation::Delete,
            start,
            delete_outcome.map(|_| ()).map_err(StepError::from),
        ));

        self.sink.begin(Operation::Restore);
        let start = Instant::now();
        let restore_outcome = self
            .store
            .restore(&version.key, version.version_id.as_deref())
            .await
            .map_err(StepError::from);
        results.push(self.finish(Operation::Restore, start, restore_outcome));
    }

    async fn download_step(&self) -> ProbeResult {
        self.sink.begin(Operation::Download);
        let start = Instant::now();
        let outcome = match self.store.get(&self.options.download_key).await {
            Ok(bytes) => consistency::verify(&self.fixture.download_expected, &bytes)
                .map_err(StepError::from),
            Err(e) => Err(StepError::from(e)),
        };
        self.finish(Operation::Download, start, outcome)
    }

    fn finish(
        &self,
        operation: Operation,
        start: Instant,
        outcome: Result<(), StepError>,
    ) -> ProbeResult {
        let duration = start.elapsed();
        let result = match outcome {
            Ok(()) => {
                tracing::debug!(%operation, elapsed_ms = duration.as_millis() as u64, "probe step ok");
                ProbeResult::ok(operation, duration)
            }
            Err(error) => {
                tracing::error!(%operation, kind = error.kind(), "probe step failed: {}", error);
                ProbeResult::failed(operation, duration, error)
            }
        };
        self.sink.record(&result);
        result
    }
}
