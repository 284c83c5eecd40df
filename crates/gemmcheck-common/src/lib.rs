//! Common types for the gemmcheck diagnostics.
//!
//! This crate holds what both command-line tools share: the matmul element
//! type, memory units, and the sizing/sampling policy configuration.

pub mod config;
pub mod dtype;
pub mod units;

pub use config::{
    BenchmarkPolicy, ConfigError, GemmcheckConfig, StressPolicy, TelemetryConfig,
    DEFAULT_CANDIDATE_SIZES,
};
pub use dtype::MatmulDtype;
pub use units::{gib_to_bytes, BYTES_PER_GIB};
