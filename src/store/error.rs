//! Error types for object-store operations

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to the object store.
///
/// Every variant is a step-local failure from the probe's perspective: it is
/// recorded and the cycle moves on. Only client construction
/// (`InvalidConfig`) happens before probing starts.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// AWS SDK error that fits no more specific variant
    #[error("sdk error: {0}")]
    Sdk(String),

    /// S3 service error with a specific error code
    #[error("service error ({code}): {message}")]
    Service { code: String, message: String },

    /// Object not found in bucket
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Access denied
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Network-level failure (dispatch, connection, response)
    #[error("network error: {0}")]
    Network(String),

    /// Operation exceeded the transport timeout
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Multipart upload failure (initiate, part, or complete)
    #[error("multipart upload error: {0}")]
    MultipartUpload(String),

    /// Restore was attempted without a version id to restore from
    #[error("no version id available to restore '{key}' (store may not support versioning)")]
    RestoreWithoutVersion { key: String },

    /// Invalid client configuration
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// Stable discriminator used in metric labels and assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Sdk(_) => "sdk",
            StoreError::Service { .. } => "service",
            StoreError::NotFound { .. } => "not_found",
            StoreError::AccessDenied(_) => "access_denied",
            StoreError::Network(_) => "network",
            StoreError::Timeout(_) => "timeout",
            StoreError::MultipartUpload(_) => "multipart_upload",
            StoreError::RestoreWithoutVersion { .. } => "restore_without_version",
            StoreError::InvalidConfig(_) => "invalid_config",
        }
    }
}

/// Convert AWS SDK errors to StoreError
impl<E> From<aws_sdk_s3::error::SdkError<E>> for StoreError
where
    E: std::error::Error + 'static,
{
    fn from(error: aws_sdk_s3::error::SdkError<E>) -> Self {
        match error {
            aws_sdk_s3::error::SdkError::DispatchFailure(e) => {
                if e.is_timeout() {
                    StoreError::Timeout(format!("{:?}", e))
                } else {
                    StoreError::Network(format!("dispatch failure: {:?}", e))
                }
            }
            aws_sdk_s3::error::SdkError::TimeoutError(e) => {
                StoreError::Timeout(format!("{:?}", e))
            }
            aws_sdk_s3::error::SdkError::ResponseError(e) => {
                StoreError::Network(format!("response error: {:?}", e))
            }
            aws_sdk_s3::error::SdkError::ServiceError(e) => {
                let err_str = format!("{:?}", e);

                if err_str.contains("NoSuchKey") {
                    StoreError::Service {
                        code: "NoSuchKey".to_string(),
                        message: "the specified key does not exist".to_string(),
                    }
                } else if err_str.contains("NoSuchBucket") {
                    StoreError::Service {
                        code: "NoSuchBucket".to_string(),
                        message: "the specified bucket does not exist".to_string(),
                    }
                } else if err_str.contains("AccessDenied") {
                    StoreError::AccessDenied("access denied to resource".to_string())
                } else {
                    StoreError::Service {
                        code: "Unknown".to_string(),
                        message: err_str,
                    }
                }
            }
            _ => StoreError::Sdk(format!("{:?}", error)),
        }
    }
}
