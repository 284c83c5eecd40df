//! GPU temperature readings.

use gemmcheck_common::TelemetryConfig;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

use crate::command::run_with_timeout;

/// A best-effort source of the current GPU temperature in degrees Celsius.
///
/// Implementations must not fail: any problem is reported as `None`.
/// Closures returning `Option<f64>` implement this trait, which keeps the
/// stress driver testable without spawning processes.
pub trait TemperatureProbe {
    fn read_celsius(&self) -> Option<f64>;
}

impl<F> TemperatureProbe for F
where
    F: Fn() -> Option<f64>,
{
    fn read_celsius(&self) -> Option<f64> {
        self()
    }
}

/// Probe used when telemetry is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemperature;

impl TemperatureProbe for NoTemperature {
    fn read_celsius(&self) -> Option<f64> {
        None
    }
}

/// Reads temperatures by running a vendor SMI tool (default `rocm-smi --showtemp`).
#[derive(Debug, Clone)]
pub struct SmiTemperatureProbe {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl SmiTemperatureProbe {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(
            config.command.clone(),
            config.args.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }
}

impl TemperatureProbe for SmiTemperatureProbe {
    fn read_celsius(&self) -> Option<f64> {
        // Output is parsed even on a non-zero exit; the tool sometimes
        // reports partial tables with a failing status.
        match run_with_timeout(&self.program, &self.args, self.timeout) {
            Ok(output) => {
                let reading = parse_celsius(&String::from_utf8_lossy(&output.stdout));
                debug!(program = %self.program, ?reading, "temperature probe");
                reading
            }
            Err(e) => {
                debug!(error = %e, "temperature probe unavailable");
                None
            }
        }
    }
}

/// Build the probe described by `config`.
pub fn temperature_probe(config: &TelemetryConfig) -> Box<dyn TemperatureProbe> {
    if config.enabled {
        Box::new(SmiTemperatureProbe::from_config(config))
    } else {
        Box::new(NoTemperature)
    }
}

/// Extract the first `<number>c` reading from SMI output.
///
/// Lines are lowercased first, so `45.0C` and `45.0c` both match.
///
/// ```
/// use gemmcheck_probe::parse_celsius;
///
/// assert_eq!(parse_celsius("0    45.0c   120.0W"), Some(45.0));
/// assert_eq!(parse_celsius("no readings here"), None);
/// ```
pub fn parse_celsius(text: &str) -> Option<f64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let regex = RE.get_or_init(|| {
        Regex::new(r"(\d+\.?\d*)c").expect("Failed to compile temperature regex pattern")
    });

    text.lines().map(str::to_lowercase).filter(|line| line.contains('c')).find_map(|line| {
        regex.captures(&line).and_then(|caps| caps.get(1)).and_then(|m| m.as_str().parse().ok())
    })
}
