//! [`MatmulBackend`] on top of candle tensors.

use candle_core::{DType, Device, Tensor};
use gemmcheck_common::MatmulDtype;
use tracing::debug;

use crate::backend::{DeviceInfo, DeviceSelector, MatmulBackend};
use crate::error::{EnvironmentError, SampleError};
use crate::report::EnvironmentInfo;

/// Library name written to reports.
pub const TENSOR_LIBRARY: &str = "candle-core";
/// Library version written to reports.
pub const TENSOR_LIBRARY_VERSION: &str = "0.9";

/// Map the configured element type onto candle's.
pub const fn candle_dtype(dtype: MatmulDtype) -> DType {
    match dtype {
        MatmulDtype::F16 => DType::F16,
        MatmulDtype::Bf16 => DType::BF16,
        MatmulDtype::F32 => DType::F32,
    }
}

/// Whether candle was built with its CUDA backend.
pub fn cuda_compiled() -> bool {
    candle_core::utils::cuda_is_available()
}

impl EnvironmentInfo {
    /// Collect library and platform metadata for the current process.
    pub fn detect() -> Self {
        Self {
            library: TENSOR_LIBRARY.to_string(),
            library_version: TENSOR_LIBRARY_VERSION.to_string(),
            rocm_version: gemmcheck_probe::rocm_version(),
            cuda_available: cuda_compiled() && cuda_device_count() > 0,
        }
    }
}

/// Number of visible CUDA devices; zero without driver support.
#[cfg(feature = "cuda")]
pub fn cuda_device_count() -> usize {
    match cudarc::driver::CudaContext::device_count() {
        Ok(count) => usize::try_from(count).unwrap_or(0),
        Err(e) => {
            debug!(error = %e, "CUDA device count unavailable");
            0
        }
    }
}

#[cfg(not(feature = "cuda"))]
pub fn cuda_device_count() -> usize {
    0
}

#[cfg(feature = "cuda")]
fn cuda_device_name(ordinal: usize) -> Option<String> {
    cudarc::driver::CudaContext::new(ordinal)
        .and_then(|ctx| ctx.name())
        .map_err(|e| debug!(ordinal, error = %e, "CUDA device name unavailable"))
        .ok()
}

#[cfg(not(feature = "cuda"))]
fn cuda_device_name(_ordinal: usize) -> Option<String> {
    None
}

/// Operands and the most recent product.
#[derive(Debug)]
pub struct CandleOperands {
    lhs: Tensor,
    rhs: Tensor,
    product: Option<Tensor>,
}

impl CandleOperands {
    pub fn product(&self) -> Option<&Tensor> {
        self.product.as_ref()
    }
}

/// A candle device plus its identity.
#[derive(Debug, Clone)]
pub struct CandleBackend {
    device: Device,
    info: DeviceInfo,
}

impl CandleBackend {
    pub fn cpu() -> Self {
        let cores = std::thread::available_parallelism()
            .map(std::num::NonZero::get)
            .unwrap_or(1);
        Self {
            device: Device::Cpu,
            info: DeviceInfo {
                name: format!("CPU ({cores} threads)"),
                count: 1,
                ordinal: 0,
            },
        }
    }

    /// Open CUDA device `ordinal`.
    pub fn cuda(ordinal: usize) -> Result<Self, EnvironmentError> {
        if !cuda_compiled() {
            return Err(EnvironmentError::LibraryMissing { backend: "CUDA" });
        }
        let device = Device::new_cuda(ordinal)
            .map_err(|e| EnvironmentError::DeviceUnavailable(e.to_string()))?;
        let name = cuda_device_name(ordinal)
            .or_else(|| gemmcheck_probe::device_name_from_smi(ordinal))
            .unwrap_or_else(|| format!("CUDA device {ordinal}"));
        let count = cuda_device_count().max(ordinal + 1);
        debug!(ordinal, %name, count, "opened CUDA device");
        Ok(Self {
            device,
            info: DeviceInfo {
                name,
                count,
                ordinal,
            },
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// A standard-normal `dimension x dimension` matrix of `dtype`.
    ///
    /// randn is only implemented for f32/f64 on every device, so narrower
    /// types are drawn in f32 and converted, half the rows at a time. With
    /// one operand already resident the transient peak is then six bytes per
    /// element for 2-byte types, the same as the three matrices the sizing
    /// plan budgets for.
    fn random_matrix(
        &self,
        dimension: usize,
        dtype: MatmulDtype,
    ) -> candle_core::Result<Tensor> {
        let target = candle_dtype(dtype);
        if target == DType::F32 {
            return Tensor::randn(0f32, 1f32, (dimension, dimension), &self.device);
        }
        let top = dimension / 2;
        let mut halves = Vec::with_capacity(2);
        for rows in [top, dimension - top] {
            if rows == 0 {
                continue;
            }
            let drawn = Tensor::randn(0f32, 1f32, (rows, dimension), &self.device)?;
            halves.push(drawn.to_dtype(target)?);
        }
        Tensor::cat(&halves, 0)
    }
}

/// Open the backend for `selector`.
pub fn open_backend(selector: DeviceSelector) -> Result<CandleBackend, EnvironmentError> {
    match selector {
        DeviceSelector::Cpu => Ok(CandleBackend::cpu()),
        DeviceSelector::Cuda(ordinal) => CandleBackend::cuda(ordinal),
    }
}

impl MatmulBackend for CandleBackend {
    type Operands = CandleOperands;

    fn device_info(&self) -> &DeviceInfo {
        &self.info
    }

    fn allocate(
        &self,
        dimension: usize,
        dtype: MatmulDtype,
    ) -> Result<CandleOperands, SampleError> {
        let alloc_err = |e: candle_core::Error| SampleError::Allocation {
            dimension,
            dtype,
            message: e.to_string(),
        };
        let lhs = self.random_matrix(dimension, dtype).map_err(alloc_err)?;
        let rhs = self.random_matrix(dimension, dtype).map_err(alloc_err)?;
        Ok(CandleOperands {
            lhs,
            rhs,
            product: None,
        })
    }

    fn multiply(&self, operands: &mut CandleOperands) -> Result<(), SampleError> {
        // Drop the previous product first so only three matrices are live.
        operands.product = None;
        let product = operands
            .lhs
            .matmul(&operands.rhs)
            .map_err(|e| SampleError::Compute(e.to_string()))?;
        operands.product = Some(product);
        Ok(())
    }

    fn synchronize(&self) -> Result<(), SampleError> {
        self.device.synchronize().map_err(|e| SampleError::Synchronize(e.to_string()))
    }

    fn release(&self, operands: CandleOperands) -> Result<(), SampleError> {
        drop(operands);
        // Freed buffers return to the device once outstanding work is done.
        self.synchronize()
    }
}
