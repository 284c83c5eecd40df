//! Sizing and sampling policy configuration.
//!
//! Loads [`GemmcheckConfig`] from a TOML file with environment variable
//! overrides via `GEMMCHECK_*` prefixed variables. Every field has a default,
//! so a partial file (or none at all) is fine.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dtype::MatmulDtype;

/// Benchmark size ladder, ascending.
pub const DEFAULT_CANDIDATE_SIZES: [usize; 6] = [512, 1024, 2048, 4096, 8192, 16384];

/// Policy for the fixed-iteration benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkPolicy {
    /// Square matrix sizes to try, strictly ascending.
    /// Override: `GEMMCHECK_BENCH_SIZES` (comma separated)
    pub candidate_sizes: Vec<usize>,

    /// Timed multiplies per size, averaged under one start/end bracket.
    /// Override: `GEMMCHECK_BENCH_ITERATIONS`
    pub iterations: usize,

    /// Untimed multiplies issued before timing starts.
    /// Override: `GEMMCHECK_BENCH_WARMUP`
    pub warmup_iterations: usize,

    /// Fraction of the memory limit actually targeted.
    /// Override: `GEMMCHECK_BENCH_HEADROOM`
    pub headroom: f64,

    /// Operand element type.
    /// Override: `GEMMCHECK_BENCH_DTYPE`
    pub dtype: MatmulDtype,
}

impl Default for BenchmarkPolicy {
    fn default() -> Self {
        Self {
            candidate_sizes: DEFAULT_CANDIDATE_SIZES.to_vec(),
            iterations: 10,
            warmup_iterations: 1,
            headroom: 1.0,
            dtype: MatmulDtype::F16,
        }
    }
}

/// Policy for the time-boxed stress run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressPolicy {
    /// Upper cap on the stress matrix dimension before power-of-two rounding.
    /// Override: `GEMMCHECK_STRESS_MAX_DIM`
    pub max_dimension: usize,

    /// Fraction of the memory limit actually targeted.
    /// Override: `GEMMCHECK_STRESS_HEADROOM`
    pub headroom: f64,

    /// Sampling stops once the error count exceeds this value.
    /// Override: `GEMMCHECK_STRESS_ERROR_THRESHOLD`
    pub error_threshold: usize,

    /// Operand element type.
    /// Override: `GEMMCHECK_STRESS_DTYPE`
    pub dtype: MatmulDtype,
}

impl Default for StressPolicy {
    fn default() -> Self {
        Self {
            max_dimension: 8192,
            headroom: 0.5,
            error_threshold: 10,
            dtype: MatmulDtype::F16,
        }
    }
}

/// External temperature helper settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Read temperatures at all.
    /// Override: `GEMMCHECK_TEMP_ENABLED`
    pub enabled: bool,

    /// Program to run.
    /// Override: `GEMMCHECK_TEMP_COMMAND`
    pub command: String,

    /// Arguments passed to `command`.
    pub args: Vec<String>,

    /// Kill the helper after this many milliseconds.
    /// Override: `GEMMCHECK_TEMP_TIMEOUT_MS`
    pub timeout_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "rocm-smi".to_string(),
            args: vec!["--showtemp".to_string()],
            timeout_ms: 5_000,
        }
    }
}

/// Full configuration for both tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GemmcheckConfig {
    pub benchmark: BenchmarkPolicy,
    pub stress: StressPolicy,
    pub telemetry: TelemetryConfig,
}

/// Errors that can occur when loading or validating a [`GemmcheckConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid environment override {key}={value}: {reason}")]
    EnvOverride {
        key: String,
        value: String,
        reason: String,
    },
}

impl GemmcheckConfig {
    /// Generate a default configuration TOML string.
    pub fn default_toml() -> String {
        let cfg = Self::default();
        toml::to_string_pretty(&cfg).expect("default config should serialize")
    }

    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut cfg: GemmcheckConfig = toml::from_str(toml_str)?;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load only from environment variables, starting from defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `path` when given, otherwise from the environment alone.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::from_env(),
        }
    }

    /// Validate the configuration, returning an error with a descriptive
    /// message on failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bench = &self.benchmark;
        if bench.candidate_sizes.is_empty() {
            return Err(ConfigError::Validation(
                "benchmark.candidate_sizes must not be empty".into(),
            ));
        }
        if bench.candidate_sizes.contains(&0) {
            return Err(ConfigError::Validation(
                "benchmark.candidate_sizes must be > 0".into(),
            ));
        }
        if bench.candidate_sizes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::Validation(format!(
                "benchmark.candidate_sizes must be strictly ascending, got {:?}",
                bench.candidate_sizes
            )));
        }
        if bench.iterations == 0 {
            return Err(ConfigError::Validation("benchmark.iterations must be > 0".into()));
        }
        validate_headroom("benchmark.headroom", bench.headroom)?;

        let stress = &self.stress;
        if stress.max_dimension == 0 {
            return Err(ConfigError::Validation("stress.max_dimension must be > 0".into()));
        }
        validate_headroom("stress.headroom", stress.headroom)?;

        let telemetry = &self.telemetry;
        if telemetry.timeout_ms == 0 {
            return Err(ConfigError::Validation("telemetry.timeout_ms must be > 0".into()));
        }
        if telemetry.command.trim().is_empty() {
            return Err(ConfigError::Validation("telemetry.command must not be empty".into()));
        }
        Ok(())
    }

    /// Apply `GEMMCHECK_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("GEMMCHECK_BENCH_SIZES") {
            self.benchmark.candidate_sizes = parse_size_list(&val).map_err(|reason| {
                ConfigError::EnvOverride {
                    key: "GEMMCHECK_BENCH_SIZES".into(),
                    value: val.clone(),
                    reason,
                }
            })?;
        }

        if let Some(v) = parse_env::<usize>("GEMMCHECK_BENCH_ITERATIONS")? {
            self.benchmark.iterations = v;
        }
        if let Some(v) = parse_env::<usize>("GEMMCHECK_BENCH_WARMUP")? {
            self.benchmark.warmup_iterations = v;
        }
        if let Some(v) = parse_env::<f64>("GEMMCHECK_BENCH_HEADROOM")? {
            self.benchmark.headroom = v;
        }
        if let Some(v) = parse_env::<MatmulDtype>("GEMMCHECK_BENCH_DTYPE")? {
            self.benchmark.dtype = v;
        }

        if let Some(v) = parse_env::<usize>("GEMMCHECK_STRESS_MAX_DIM")? {
            self.stress.max_dimension = v;
        }
        if let Some(v) = parse_env::<f64>("GEMMCHECK_STRESS_HEADROOM")? {
            self.stress.headroom = v;
        }
        if let Some(v) = parse_env::<usize>("GEMMCHECK_STRESS_ERROR_THRESHOLD")? {
            self.stress.error_threshold = v;
        }
        if let Some(v) = parse_env::<MatmulDtype>("GEMMCHECK_STRESS_DTYPE")? {
            self.stress.dtype = v;
        }

        if let Ok(val) = std::env::var("GEMMCHECK_TEMP_ENABLED") {
            self.telemetry.enabled = matches!(val.trim(), "1" | "true" | "yes");
        }
        if let Ok(val) = std::env::var("GEMMCHECK_TEMP_COMMAND") {
            self.telemetry.command = val;
        }
        if let Some(v) = parse_env::<u64>("GEMMCHECK_TEMP_TIMEOUT_MS")? {
            self.telemetry.timeout_ms = v;
        }

        Ok(())
    }
}

fn validate_headroom(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{field} must be in (0, 1], got {value}")))
    }
}

fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<T>().map(Some).map_err(|e| ConfigError::EnvOverride {
            key: key.into(),
            value: val.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}

fn parse_size_list(raw: &str) -> Result<Vec<usize>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<usize>().map_err(|e| format!("{part}: {e}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serial_test::serial;

    proptest! {
        #[test]
        fn size_list_round_trips(
            sizes in prop::collection::vec(1usize..100_000, 0..8),
            pad in "[ ]{0,3}",
        ) {
            let joined = sizes
                .iter()
                .map(|s| format!("{pad}{s}{pad}"))
                .collect::<Vec<_>>()
                .join(",");
            prop_assert_eq!(parse_size_list(&joined).unwrap(), sizes);
        }

        #[test]
        fn size_list_rejects_non_numeric(word in "[a-z]{1,8}") {
            let err = parse_size_list(&format!("512,{word}")).unwrap_err();
            prop_assert!(err.starts_with(&word));
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(GemmcheckConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml_str = GemmcheckConfig::default_toml();
        let cfg: GemmcheckConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(cfg, GemmcheckConfig::default());
    }

    #[test]
    #[serial(gemmcheck_env)]
    fn test_partial_toml_keeps_defaults() {
        let cfg = GemmcheckConfig::from_toml(
            r#"
[stress]
error_threshold = 3
"#,
        )
        .unwrap();
        assert_eq!(cfg.stress.error_threshold, 3);
        assert_eq!(cfg.stress.max_dimension, 8192);
        assert_eq!(cfg.benchmark, BenchmarkPolicy::default());
    }

    #[test]
    fn test_validation_rejects_unsorted_sizes() {
        let mut cfg = GemmcheckConfig::default();
        cfg.benchmark.candidate_sizes = vec![1024, 512];
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("strictly ascending"));
    }

    #[test]
    fn test_validation_rejects_zero_iterations() {
        let mut cfg = GemmcheckConfig::default();
        cfg.benchmark.iterations = 0;
        assert!(cfg.validate().unwrap_err().to_string().contains("iterations"));
    }

    #[test]
    fn test_validation_rejects_headroom_above_one() {
        let mut cfg = GemmcheckConfig::default();
        cfg.stress.headroom = 1.5;
        assert!(cfg.validate().unwrap_err().to_string().contains("stress.headroom"));
    }

    #[test]
    fn test_zero_error_threshold_is_allowed() {
        let mut cfg = GemmcheckConfig::default();
        cfg.stress.error_threshold = 0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    #[serial(gemmcheck_env)]
    fn test_env_override_sizes() {
        temp_env::with_var("GEMMCHECK_BENCH_SIZES", Some("64, 128,256"), || {
            let cfg = GemmcheckConfig::from_env().unwrap();
            assert_eq!(cfg.benchmark.candidate_sizes, vec![64, 128, 256]);
        });
    }

    #[test]
    #[serial(gemmcheck_env)]
    fn test_env_override_bad_number() {
        temp_env::with_var("GEMMCHECK_STRESS_ERROR_THRESHOLD", Some("lots"), || {
            let err = GemmcheckConfig::from_env().unwrap_err();
            let ConfigError::EnvOverride { key, .. } = &err else {
                panic!("expected an override error, got {err}");
            };
            assert_eq!(key, "GEMMCHECK_STRESS_ERROR_THRESHOLD");
        });
    }

    #[test]
    #[serial(gemmcheck_env)]
    fn test_env_disables_telemetry() {
        temp_env::with_var("GEMMCHECK_TEMP_ENABLED", Some("0"), || {
            assert!(!GemmcheckConfig::from_env().unwrap().telemetry.enabled);
        });
    }

    #[test]
    #[serial(gemmcheck_env)]
    fn test_env_overrides_file() {
        temp_env::with_var("GEMMCHECK_BENCH_DTYPE", Some("bf16"), || {
            let cfg = GemmcheckConfig::from_toml("[benchmark]\ndtype = \"f32\"\n").unwrap();
            assert_eq!(cfg.benchmark.dtype, MatmulDtype::Bf16);
        });
    }
}
