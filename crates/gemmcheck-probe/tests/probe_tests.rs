//! Integration tests for `gemmcheck-probe`.
//!
//! None of these need vendor tools installed; they cover parsing and the
//! environment-driven install lookup.

use gemmcheck_probe::{parse_celsius, rocm_version, temperature_probe, TemperatureProbe};
use gemmcheck_common::TelemetryConfig;
use proptest::prelude::*;
use serial_test::serial;

proptest! {
    #[test]
    fn celsius_reading_round_trips(whole in 0u32..150, tenths in 0u32..10) {
        let text = format!("GPU[0] {whole}.{tenths}C");
        let expected: f64 = format!("{whole}.{tenths}").parse().unwrap();
        prop_assert_eq!(parse_celsius(&text), Some(expected));
    }

    #[test]
    fn text_without_digits_never_parses(s in "[a-zA-Z :=\\-\n]{0,64}") {
        prop_assert_eq!(parse_celsius(&s), None);
    }
}

#[test]
#[serial(gemmcheck_env)]
fn rocm_path_env_is_honoured() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".info")).unwrap();
    std::fs::write(dir.path().join(".info/version"), "5.7.1-98\n").unwrap();

    temp_env::with_var("ROCM_PATH", Some(dir.path()), || {
        assert_eq!(rocm_version(), Some("5.7.1-98".to_string()));
    });
}

#[test]
fn missing_helper_yields_none() {
    let config = TelemetryConfig {
        command: "gemmcheck-missing-temperature-tool".to_string(),
        timeout_ms: 200,
        ..TelemetryConfig::default()
    };
    assert_eq!(temperature_probe(&config).read_celsius(), None);
}
