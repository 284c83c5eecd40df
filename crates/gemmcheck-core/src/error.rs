//! Error types for environment detection and sampling.

use gemmcheck_common::MatmulDtype;
use thiserror::Error;

/// The tensor library or device cannot be used at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    /// The tensor library was built without the requested backend.
    #[error("tensor library not installed with {backend} support")]
    LibraryMissing { backend: &'static str },

    /// The backend is present but the device could not be opened.
    #[error("CUDA/ROCm not available: {0}")]
    DeviceUnavailable(String),
}

/// A single allocate/compute/synchronize call failed.
///
/// These are recoverable at the driver level: the benchmark stops escalating
/// sizes, the stress loop counts them against its error threshold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("allocation of two {dimension}x{dimension} {dtype} operands failed: {message}")]
    Allocation {
        dimension: usize,
        dtype: MatmulDtype,
        message: String,
    },

    #[error("matrix multiply failed: {0}")]
    Compute(String),

    #[error("device synchronization failed: {0}")]
    Synchronize(String),
}

impl SampleError {
    /// Short category name used in log fields.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Allocation { .. } => "allocation",
            Self::Compute(_) => "compute",
            Self::Synchronize(_) => "synchronize",
        }
    }
}
