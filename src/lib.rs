/*!
 * bucketprobe - Synthetic monitoring probe for S3-compatible object stores
 *
 * On a fixed interval the probe uploads, optionally multipart-uploads,
 * optionally deletes and restores a versioned object, and downloads a
 * known object verifying its content byte for byte. Every step's outcome
 * and duration is exported as Prometheus gauges, so storage-endpoint
 * degradation (availability, consistency, versioning support) is visible
 * independently of application traffic.
 */

pub mod bootstrap;
pub mod config;
pub mod fixture;
pub mod logging;
pub mod metrics;
pub mod probe;
pub mod scheduler;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use fixture::Fixture;
pub use metrics::{MetricsSink, PrometheusSink};
pub use probe::{CycleOptions, Operation, ProbeCycle, ProbeResult};
pub use scheduler::Scheduler;
pub use store::{MemoryStore, ObjectStore, S3Store, StoreError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
