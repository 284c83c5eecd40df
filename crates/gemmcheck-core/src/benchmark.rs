//! Fixed-iteration throughput benchmark over a ladder of sizes.

use gemmcheck_common::{gib_to_bytes, BenchmarkPolicy};
use tracing::{debug, info, warn};

use crate::aggregate::peak;
use crate::backend::{DeviceSelector, MatmulBackend};
use crate::candle::open_backend;
use crate::error::SampleError;
use crate::report::{BenchmarkEntry, BenchmarkReport, EnvironmentInfo, RunStatus};
use crate::sampler::{time_matmuls, warmup, Sample};
use crate::sizing::{filter_candidates, WorkloadPlan};

/// Detect the environment, open `selector` and run the benchmark on it.
pub fn benchmark_device(
    selector: DeviceSelector,
    policy: &BenchmarkPolicy,
    memory_limit_gb: u64,
) -> BenchmarkReport {
    let environment = EnvironmentInfo::detect();
    debug!(?environment, %selector, "benchmark environment");
    match open_backend(selector) {
        Ok(backend) => run_benchmark(&backend, policy, memory_limit_gb, environment),
        Err(e) => {
            warn!(error = %e, "device not usable");
            BenchmarkReport::environment_error(environment, &e)
        }
    }
}

/// Run the size ladder on an opened backend.
///
/// Sizes run in ascending order; the first failing size gets an error entry
/// and no larger size is attempted. Neither a failed size nor an empty
/// ladder changes the overall status.
pub fn run_benchmark<B: MatmulBackend>(
    backend: &B,
    policy: &BenchmarkPolicy,
    memory_limit_gb: u64,
    environment: EnvironmentInfo,
) -> BenchmarkReport {
    let plan = WorkloadPlan::matmul(
        gib_to_bytes(memory_limit_gb),
        policy.headroom,
        policy.dtype.byte_width(),
    );
    let max_dim = plan.max_dimension();
    let sizes = filter_candidates(max_dim, &policy.candidate_sizes);
    let device = backend.device_info();
    info!(
        device = %device.name,
        max_dim,
        sizes = ?sizes,
        dtype = %policy.dtype,
        "planned benchmark"
    );
    if sizes.is_empty() {
        warn!(
            memory_limit_gb,
            max_dim,
            dtype = %policy.dtype,
            "no benchmark size fits the memory limit"
        );
    }

    let mut entries = Vec::with_capacity(sizes.len());
    let mut samples = Vec::with_capacity(sizes.len());
    for &size in &sizes {
        match measure_size(backend, policy, size) {
            Ok(sample) => {
                info!(
                    size,
                    time_ms = sample.elapsed_ms(),
                    tflops = sample.tflops,
                    "size complete"
                );
                entries.push(BenchmarkEntry::measured(&sample, policy.dtype));
                samples.push(sample);
            }
            Err(e) => {
                warn!(size, kind = e.kind(), error = %e, "size failed, not escalating further");
                entries.push(BenchmarkEntry::failed(size, policy.dtype, &e));
                break;
            }
        }
    }

    let best = peak(&samples);
    if let Some(best) = best {
        info!(peak_size = best.size, peak_tflops = best.tflops, "benchmark complete");
    }

    BenchmarkReport {
        status: RunStatus::Success,
        environment: Some(environment),
        benchmarks: Some(entries),
        device_name: Some(device.name.clone()),
        device_count: Some(device.count),
        memory_limit_gb: Some(memory_limit_gb),
        max_matrix_dim: Some(max_dim),
        test_sizes: Some(sizes),
        peak_tflops: best.map(|p| p.tflops),
        peak_size: best.map(|p| p.size),
        error: None,
    }
}

/// Allocate, warm up, time, and always release one size.
fn measure_size<B: MatmulBackend>(
    backend: &B,
    policy: &BenchmarkPolicy,
    size: usize,
) -> Result<Sample, SampleError> {
    let mut operands = backend.allocate(size, policy.dtype)?;
    let measured = backend
        .synchronize()
        .and_then(|()| warmup(backend, &mut operands, policy.warmup_iterations))
        .and_then(|()| time_matmuls(backend, &mut operands, size, policy.iterations));
    let released = backend.release(operands);
    let sample = measured?;
    released?;
    Ok(sample)
}
