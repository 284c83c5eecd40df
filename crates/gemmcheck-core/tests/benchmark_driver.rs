//! Benchmark driver behaviour against a scripted backend.

mod common;

use common::{environment, Call, StubBackend};
use gemmcheck_common::{BenchmarkPolicy, DEFAULT_CANDIDATE_SIZES};
use gemmcheck_core::{run_benchmark, BenchmarkEntry, RunStatus};

fn policy() -> BenchmarkPolicy {
    BenchmarkPolicy::default()
}

#[test]
fn full_ladder_at_sixteen_gib() {
    let backend = StubBackend::new();
    let report = run_benchmark(&backend, &policy(), 16, environment());

    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.max_matrix_dim, Some(53_509));
    assert_eq!(report.test_sizes.as_deref(), Some(&DEFAULT_CANDIDATE_SIZES[..]));
    let entries = report.benchmarks.as_ref().unwrap();
    assert_eq!(entries.len(), 6);
    assert!(entries.iter().all(BenchmarkEntry::is_measured));
    assert_eq!(report.device_name.as_deref(), Some("Stub GPU"));
    assert_eq!(report.device_count, Some(2));
    assert!(report.error.is_none());

    let best = entries
        .iter()
        .filter_map(|e| match e {
            BenchmarkEntry::Measured { tflops, .. } => Some(*tflops),
            BenchmarkEntry::Failed { .. } => None,
        })
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(report.peak_tflops, Some(best));
    assert!(DEFAULT_CANDIDATE_SIZES.contains(&report.peak_size.unwrap()));
}

#[test]
fn one_gib_stops_before_16384() {
    let backend = StubBackend::new();
    let report = run_benchmark(&backend, &policy(), 1, environment());
    assert_eq!(report.max_matrix_dim, Some(13_377));
    assert_eq!(report.test_sizes, Some(vec![512, 1024, 2048, 4096, 8192]));
    assert!(!backend.calls().contains(&Call::Allocate(16384)));
}

#[test]
fn failure_halts_escalation() {
    let backend = StubBackend::new().failing_allocation_from(4096);
    let report = run_benchmark(&backend, &policy(), 16, environment());

    // A failed size does not fail the run.
    assert_eq!(report.status, RunStatus::Success);
    let entries = report.benchmarks.unwrap();
    let sizes: Vec<usize> = entries.iter().map(BenchmarkEntry::size).collect();
    assert_eq!(sizes, vec![512, 1024, 2048, 4096]);
    let BenchmarkEntry::Failed { status, error, .. } = &entries[3] else {
        panic!("expected a failed entry, got {:?}", entries[3]);
    };
    assert_eq!(*status, RunStatus::Error);
    assert!(error.contains("out of memory"));

    let calls = backend.calls();
    assert!(!calls.contains(&Call::Allocate(8192)));
    for size in [512, 1024, 2048] {
        assert!(calls.contains(&Call::Release(size)));
    }
    assert!(report.peak_size.unwrap() <= 2048);
}

#[test]
fn compute_failure_releases_operands() {
    // Warmup for 512 is multiply #0, its timed run #1..=10; #11 is 1024's warmup.
    let backend = StubBackend::new().failing_multiplies(|i| i == 11);
    let report = run_benchmark(&backend, &policy(), 16, environment());
    let entries = report.benchmarks.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].is_measured());
    assert!(!entries[1].is_measured());
    assert!(backend.calls().contains(&Call::Release(1024)));
    assert_eq!(report.peak_size, Some(512));
}

#[test]
fn first_size_failing_leaves_no_peak() {
    let backend = StubBackend::new().failing_allocation_from(512);
    let report = run_benchmark(&backend, &policy(), 16, environment());
    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.peak_tflops, None);
    assert_eq!(report.peak_size, None);

    let value = serde_json::to_value(&report).unwrap();
    assert!(value.get("peak_tflops").is_none());
    assert!(value.get("peak_size").is_none());
}

#[test]
fn synchronization_brackets_timed_region() {
    let backend = StubBackend::new();
    let policy = BenchmarkPolicy {
        candidate_sizes: vec![64],
        iterations: 3,
        ..policy()
    };
    run_benchmark(&backend, &policy, 16, environment());

    use Call::*;
    assert_eq!(
        backend.calls(),
        vec![
            Allocate(64),
            Synchronize,
            Multiply(64),
            Synchronize,
            Synchronize,
            Multiply(64),
            Multiply(64),
            Multiply(64),
            Synchronize,
            Release(64),
        ]
    );
}

#[test]
fn zero_warmup_skips_straight_to_timing() {
    let backend = StubBackend::new();
    let policy = BenchmarkPolicy {
        candidate_sizes: vec![64],
        iterations: 2,
        warmup_iterations: 0,
        ..policy()
    };
    run_benchmark(&backend, &policy, 16, environment());
    assert_eq!(backend.multiply_count(), 2);
}

#[test]
fn nothing_fits_succeeds_without_allocating() {
    let backend = StubBackend::new();
    let report = run_benchmark(&backend, &policy(), 0, environment());
    assert_eq!(report.status, RunStatus::Success);
    assert_eq!(report.max_matrix_dim, Some(0));
    assert_eq!(report.test_sizes, Some(vec![]));
    assert!(report.error.is_none());
    assert!(backend.calls().is_empty());

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["status"], "success");
    assert_eq!(value["benchmarks"], serde_json::json!([]));
    assert_eq!(value["test_sizes"], serde_json::json!([]));
    assert!(value.get("error").is_none());
    assert!(value.get("peak_tflops").is_none());
}

#[test]
fn report_json_field_set() {
    let backend = StubBackend::new();
    let policy = BenchmarkPolicy {
        candidate_sizes: vec![128, 256],
        ..policy()
    };
    let report = run_benchmark(&backend, &policy, 16, environment());
    let value = serde_json::to_value(&report).unwrap();
    let object = value.as_object().unwrap();

    for key in [
        "status",
        "library",
        "library_version",
        "rocm_version",
        "cuda_available",
        "benchmarks",
        "device_name",
        "device_count",
        "memory_limit_gb",
        "max_matrix_dim",
        "test_sizes",
        "peak_tflops",
        "peak_size",
    ] {
        assert!(object.contains_key(key), "missing {key}");
    }
    assert!(!object.contains_key("error"));
    assert_eq!(value["status"], "success");
    assert_eq!(value["rocm_version"], "6.1.2");
    assert_eq!(value["benchmarks"][0]["dtype"], "float16");
    assert_eq!(value["test_sizes"], serde_json::json!([128, 256]));
}
