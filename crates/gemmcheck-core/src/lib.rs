//! Matmul throughput benchmark and stress test.
//!
//! The pieces compose as sizing, then timed sampling through a
//! [`MatmulBackend`], then aggregation into a report:
//!
//! ```
//! use gemmcheck_core::sizing::{filter_candidates, stress_dimension, WorkloadPlan};
//! use gemmcheck_common::{gib_to_bytes, DEFAULT_CANDIDATE_SIZES};
//!
//! let plan = WorkloadPlan::matmul(gib_to_bytes(1), 1.0, 2);
//! assert_eq!(plan.max_dimension(), 13_377);
//! assert_eq!(filter_candidates(13_377, &DEFAULT_CANDIDATE_SIZES).last(), Some(&8192));
//! assert_eq!(stress_dimension(13_377, 8192), Some(8192));
//! ```
//!
//! [`CandleBackend`] runs on candle tensors; build with the `cuda` feature
//! to reach GPUs.

pub mod aggregate;
pub mod backend;
pub mod benchmark;
pub mod candle;
pub mod error;
pub mod report;
pub mod sampler;
pub mod sizing;
pub mod stress;

pub use aggregate::{fold_outcomes, peak, round2, ErrorBudget, Peak, ThroughputSummary};
pub use backend::{DeviceInfo, DeviceSelector, MatmulBackend};
pub use benchmark::{benchmark_device, run_benchmark};
pub use candle::{
    open_backend, CandleBackend, CandleOperands, TENSOR_LIBRARY, TENSOR_LIBRARY_VERSION,
};
pub use error::{EnvironmentError, SampleError};
pub use report::{BenchmarkEntry, BenchmarkReport, EnvironmentInfo, RunStatus, StressReport};
pub use sampler::{tflops, Sample};
pub use sizing::WorkloadPlan;
pub use stress::{run_stress, stress_device};
