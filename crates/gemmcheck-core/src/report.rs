//! JSON report documents.
//!
//! Both reports are assembled once, after sampling ends, and serialized as
//! flat JSON objects. Optional fields are omitted rather than written as
//! `null`, except the fields that consumers expect to always be present
//! (`rocm_version`, the stress temperatures).

use gemmcheck_common::MatmulDtype;
use serde::Serialize;

use crate::aggregate::round2;
use crate::error::{EnvironmentError, SampleError};
use crate::sampler::Sample;

/// Overall outcome of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Error,
    CompletedWithErrors,
}

impl RunStatus {
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::CompletedWithErrors => "completed_with_errors",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tensor library and platform metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentInfo {
    pub library: String,
    pub library_version: String,
    pub rocm_version: Option<String>,
    pub cuda_available: bool,
}

/// One size of the benchmark ladder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BenchmarkEntry {
    Measured {
        size: usize,
        dtype: &'static str,
        time_ms: f64,
        tflops: f64,
    },
    Failed {
        size: usize,
        dtype: &'static str,
        status: RunStatus,
        error: String,
    },
}

impl BenchmarkEntry {
    pub fn measured(sample: &Sample, dtype: MatmulDtype) -> Self {
        Self::Measured {
            size: sample.dimension,
            dtype: dtype.report_label(),
            time_ms: sample.elapsed_ms(),
            tflops: round2(sample.tflops),
        }
    }

    pub fn failed(size: usize, dtype: MatmulDtype, error: &SampleError) -> Self {
        Self::Failed {
            size,
            dtype: dtype.report_label(),
            status: RunStatus::Error,
            error: error.to_string(),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Self::Measured { size, .. } | Self::Failed { size, .. } => *size,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Measured { .. })
    }
}

/// Output of `bench-matmul`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    pub status: RunStatus,
    #[serde(flatten)]
    pub environment: Option<EnvironmentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmarks: Option<Vec<BenchmarkEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit_gb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_matrix_dim: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_sizes: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_tflops: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BenchmarkReport {
    /// Report for an environment that could not be used at all.
    ///
    /// A missing library yields only `status` and `error`; an unavailable
    /// device still carries the environment metadata and an empty ladder.
    pub fn environment_error(environment: EnvironmentInfo, error: &EnvironmentError) -> Self {
        let (environment, benchmarks) = match error {
            EnvironmentError::LibraryMissing { .. } => (None, None),
            EnvironmentError::DeviceUnavailable(_) => (Some(environment), Some(Vec::new())),
        };
        Self {
            status: RunStatus::Error,
            environment,
            benchmarks,
            device_name: None,
            device_count: None,
            memory_limit_gb: None,
            max_matrix_dim: None,
            test_sizes: None,
            peak_tflops: None,
            peak_size: None,
            error: Some(error.to_string()),
        }
    }
}

/// Output of `bench-stress`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressReport {
    pub status: RunStatus,
    pub duration_sec: f64,
    pub iterations: usize,
    pub errors: usize,
    pub avg_tflops: f64,
    pub min_tflops: f64,
    pub max_tflops: f64,
    pub gpu_temp_start_c: Option<f64>,
    pub gpu_temp_end_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix_dim: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StressReport {
    /// Report for a run that never started sampling.
    pub fn not_started(error_message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Error,
            duration_sec: 0.0,
            iterations: 0,
            errors: 0,
            avg_tflops: 0.0,
            min_tflops: 0.0,
            max_tflops: 0.0,
            gpu_temp_start_c: None,
            gpu_temp_end_c: None,
            matrix_dim: None,
            error_message: Some(error_message.into()),
        }
    }

    pub fn environment_error(error: &EnvironmentError) -> Self {
        Self::not_started(error.to_string())
    }
}
