//! Probe-cycle orchestration: step ordering, error isolation, and the
//! per-step results the metrics sink consumes.

mod consistency;
mod cycle;
mod result;

pub use consistency::{verify, MismatchError};
pub use cycle::{CycleOptions, ProbeCycle};
pub use result::{ObjectVersion, Operation, ProbeResult, StepError};
