//! The seam between the sampling policy and a tensor library.

use gemmcheck_common::MatmulDtype;
use serde::Serialize;

use crate::error::SampleError;

/// Which device to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceSelector {
    /// Host CPU.
    Cpu,
    /// CUDA (or HIP through CUDA-compatible builds) device by ordinal.
    Cuda(usize),
}

impl Default for DeviceSelector {
    fn default() -> Self {
        Self::Cuda(0)
    }
}

impl std::fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda(ordinal) => write!(f, "cuda:{ordinal}"),
        }
    }
}

impl std::str::FromStr for DeviceSelector {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.split_once(':') {
            None if lower == "cpu" => Ok(Self::Cpu),
            None if lower == "cuda" || lower == "gpu" => Ok(Self::Cuda(0)),
            Some(("cuda" | "gpu", ordinal)) => ordinal
                .parse::<usize>()
                .map(Self::Cuda)
                .map_err(|e| format!("invalid device ordinal `{ordinal}`: {e}")),
            _ => Err(format!("invalid device: {s}. Must be one of: cpu, cuda, cuda:<N>")),
        }
    }
}

/// Identity of the device a backend is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Human readable name, e.g. `AMD Instinct MI210`.
    pub name: String,
    /// Number of devices of this kind visible to the process.
    pub count: usize,
    /// Ordinal of the selected device.
    pub ordinal: usize,
}

/// Matrix multiply primitives needed by the samplers.
///
/// Device work may be asynchronous: `multiply` only has to enqueue the
/// product, and `synchronize` must block until everything enqueued so far
/// has completed. Implementations report failures as [`SampleError`] and
/// never panic on device errors.
pub trait MatmulBackend {
    /// Device-resident operands (and the most recent product).
    type Operands;

    fn device_info(&self) -> &DeviceInfo;

    /// Allocate two randomly initialised `dimension x dimension` operands.
    fn allocate(&self, dimension: usize, dtype: MatmulDtype)
    -> Result<Self::Operands, SampleError>;

    /// Enqueue one product of the two operands, replacing the previous result.
    fn multiply(&self, operands: &mut Self::Operands) -> Result<(), SampleError>;

    /// Block until all enqueued device work has finished.
    fn synchronize(&self) -> Result<(), SampleError>;

    /// Free the operands and product and return cached memory to the device.
    fn release(&self, operands: Self::Operands) -> Result<(), SampleError>;
}
