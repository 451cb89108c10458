//! Per-step probe outcome types

use super::consistency::MismatchError;
use crate::store::StoreError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Storage operations the probe can exercise, in cycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Upload,
    MultipartUpload,
    Delete,
    Restore,
    Download,
}

impl Operation {
    /// All operations, in the fixed cycle order
    pub const ALL: [Operation; 5] = [
        Operation::Upload,
        Operation::MultipartUpload,
        Operation::Delete,
        Operation::Restore,
        Operation::Download,
    ];

    /// Stable snake_case name, used as the metric name prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Upload => "upload",
            Operation::MultipartUpload => "multipart_upload",
            Operation::Delete => "delete",
            Operation::Restore => "restore",
            Operation::Download => "download",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a step failed. Transport failures (unreachable, denied, timed out)
/// and content mismatches (store answered with wrong bytes) are separate
/// categories and must never collapse into one another.
#[derive(Debug, Error, Clone)]
pub enum StepError {
    #[error(transparent)]
    Transport(#[from] StoreError),

    #[error(transparent)]
    Mismatch(#[from] MismatchError),
}

impl StepError {
    /// Stable discriminator for assertions and logs
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Transport(e) => e.kind(),
            StepError::Mismatch(_) => "mismatch",
        }
    }

    /// Label recorded on the error gauge for this step
    pub fn label(&self) -> String {
        self.to_string()
    }
}

/// Outcome of one probe step. Produced once per enabled step per cycle and
/// forwarded to the metrics sink immediately; never retained.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub operation: Operation,
    pub succeeded: bool,
    pub duration: Duration,
    pub error: Option<StepError>,
}

impl ProbeResult {
    pub fn ok(operation: Operation, duration: Duration) -> Self {
        Self {
            operation,
            succeeded: true,
            duration,
            error: None,
        }
    }

    pub fn failed(operation: Operation, duration: Duration, error: StepError) -> Self {
        Self {
            operation,
            succeeded: false,
            duration,
            error: Some(error),
        }
    }

    /// Error-gauge label, if the step failed
    pub fn error_label(&self) -> Option<String> {
        self.error.as_ref().map(StepError::label)
    }
}

/// Version handle produced by the delete step and consumed by the restore
/// step within the same cycle. `version_id: None` is the explicit "no
/// version" signal — never an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersion {
    pub key: String,
    pub version_id: Option<String>,
}
