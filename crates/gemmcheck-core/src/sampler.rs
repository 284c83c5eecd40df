//! Timed matmul sampling.
//!
//! Device work is asynchronous relative to the host clock, so every timed
//! region is bracketed by a full synchronization: the leading one keeps
//! earlier work out of the measurement, the trailing one makes sure the
//! multiplies have actually finished before the clock stops.

use std::time::{Duration, Instant};
use tracing::trace;

use crate::backend::MatmulBackend;
use crate::error::SampleError;

/// One measured run of `N x N` matmuls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub dimension: usize,
    /// Wall-clock time of a single multiply.
    pub elapsed: Duration,
    pub tflops: f64,
}

impl Sample {
    pub fn from_elapsed(dimension: usize, elapsed: Duration) -> Self {
        Self {
            dimension,
            elapsed,
            tflops: tflops(dimension, elapsed.as_secs_f64()),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_nanos() as f64 / 1e6
    }
}

/// FLOPs of one dense `N x N` by `N x N` product (multiply-add counts as two).
pub fn matmul_flops(dimension: usize) -> f64 {
    let n = dimension as f64;
    2.0 * n * n * n
}

/// Throughput in TFLOPS for one `dimension` product taking `elapsed_secs`.
pub fn tflops(dimension: usize, elapsed_secs: f64) -> f64 {
    matmul_flops(dimension) / elapsed_secs / 1e12
}

/// Issue `count` untimed multiplies and wait for them.
pub fn warmup<B: MatmulBackend>(
    backend: &B,
    operands: &mut B::Operands,
    count: usize,
) -> Result<(), SampleError> {
    if count == 0 {
        return Ok(());
    }
    for _ in 0..count {
        backend.multiply(operands)?;
    }
    backend.synchronize()
}

/// Time `iterations` back-to-back multiplies under one start/end bracket.
///
/// The returned sample carries the per-multiply average.
pub fn time_matmuls<B: MatmulBackend>(
    backend: &B,
    operands: &mut B::Operands,
    dimension: usize,
    iterations: usize,
) -> Result<Sample, SampleError> {
    let iterations = iterations.max(1);

    backend.synchronize()?;
    let start = Instant::now();
    for _ in 0..iterations {
        backend.multiply(operands)?;
    }
    backend.synchronize()?;
    let total = start.elapsed();

    // A zero reading would report infinite throughput.
    let per_iter = total.div_f64(iterations as f64).max(Duration::from_nanos(1));
    let sample = Sample::from_elapsed(dimension, per_iter);
    trace!(
        dimension,
        iterations,
        elapsed_us = per_iter.as_micros() as u64,
        tflops = sample.tflops,
        "timed matmul"
    );
    Ok(sample)
}
