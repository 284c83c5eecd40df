//! Time-boxed sustained matmul load.

use std::time::{Duration, Instant};

use gemmcheck_common::{gib_to_bytes, StressPolicy};
use gemmcheck_probe::TemperatureProbe;
use tracing::{debug, info, warn};

use crate::aggregate::{round2, ErrorBudget};
use crate::backend::{DeviceSelector, MatmulBackend};
use crate::candle::open_backend;
use crate::report::{RunStatus, StressReport};
use crate::sampler::time_matmuls;
use crate::sizing::{stress_dimension, WorkloadPlan};

/// Open `selector` and run the stress loop on it.
pub fn stress_device(
    selector: DeviceSelector,
    policy: &StressPolicy,
    duration: Duration,
    memory_limit_gb: u64,
    probe: &dyn TemperatureProbe,
) -> StressReport {
    match open_backend(selector) {
        Ok(backend) => run_stress(&backend, policy, duration, memory_limit_gb, probe),
        Err(e) => {
            warn!(error = %e, "device not usable");
            StressReport::environment_error(&e)
        }
    }
}

/// Multiply one pair of operands repeatedly until `duration` elapses.
///
/// The deadline is checked before each iteration, so the last multiply may
/// run past it. Failed iterations count against
/// [`StressPolicy::error_threshold`]; exceeding it stops the loop early but
/// still produces a full report.
pub fn run_stress<B: MatmulBackend>(
    backend: &B,
    policy: &StressPolicy,
    duration: Duration,
    memory_limit_gb: u64,
    probe: &dyn TemperatureProbe,
) -> StressReport {
    let plan = WorkloadPlan::matmul(
        gib_to_bytes(memory_limit_gb),
        policy.headroom,
        policy.dtype.byte_width(),
    );
    let bound = plan.max_dimension();
    let Some(dimension) = stress_dimension(bound, policy.max_dimension) else {
        warn!(memory_limit_gb, bound, "no stress workload fits the memory limit");
        let dtype = policy.dtype;
        return StressReport::not_started(format!(
            "no stress workload fits in {memory_limit_gb} GiB: \
             largest {dtype} matmul dimension is {bound}"
        ));
    };
    info!(
        device = %backend.device_info().name,
        dimension,
        dtype = %policy.dtype,
        duration_sec = duration.as_secs_f64(),
        "starting stress run"
    );

    let gpu_temp_start_c = probe.read_celsius();
    debug!(?gpu_temp_start_c, "start temperature");

    let mut report = StressReport {
        status: RunStatus::Error,
        duration_sec: duration.as_secs_f64(),
        iterations: 0,
        errors: 0,
        avg_tflops: 0.0,
        min_tflops: 0.0,
        max_tflops: 0.0,
        gpu_temp_start_c,
        gpu_temp_end_c: None,
        matrix_dim: Some(dimension),
        error_message: None,
    };

    match backend.allocate(dimension, policy.dtype).and_then(|ops| {
        backend.synchronize()?;
        Ok(ops)
    }) {
        Ok(mut operands) => {
            let started = Instant::now();
            let deadline = started + duration;
            let mut budget = ErrorBudget::new(policy.error_threshold);
            while Instant::now() < deadline {
                let outcome = time_matmuls(backend, &mut operands, dimension, 1);
                if let Err(e) = &outcome {
                    warn!(
                        kind = e.kind(),
                        error = %e,
                        errors = budget.errors() + 1,
                        "stress iteration failed"
                    );
                }
                if budget.record(outcome).is_break() {
                    break;
                }
            }
            report.duration_sec = round2(started.elapsed().as_secs_f64());

            let summary = budget.summary();
            report.iterations = budget.iterations();
            report.errors = budget.errors();
            report.avg_tflops = summary.mean;
            report.min_tflops = summary.min;
            report.max_tflops = summary.max;
            report.error_message = budget.abort_message().map(str::to_string);
            report.status = budget.status();

            if let Err(e) = backend.release(operands) {
                warn!(error = %e, "failed to release stress operands");
                report.status = RunStatus::Error;
                // An abort message from the loop stays first.
                let release = format!("failed to release operands: {e}");
                report.error_message = Some(match report.error_message.take() {
                    Some(abort) => format!("{abort}; {release}"),
                    None => release,
                });
            }
        }
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "stress setup failed");
            report.error_message = Some(e.to_string());
        }
    }

    report.gpu_temp_end_c = probe.read_celsius();
    info!(
        status = %report.status,
        iterations = report.iterations,
        errors = report.errors,
        avg_tflops = report.avg_tflops,
        "stress run complete"
    );
    report
}
