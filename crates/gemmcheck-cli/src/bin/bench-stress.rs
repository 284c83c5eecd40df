//! Sustained matmul stress test.
//!
//! Keeps one device busy with back-to-back matmuls for a fixed wall-clock
//! duration and prints a JSON report on stdout.

use std::time::Duration;

use clap::Parser;
use gemmcheck_cli::exit::{for_status, EXIT_FAILURE};
use gemmcheck_cli::{emit_report, setup_logging, CommonArgs, LONG_VERSION};
use gemmcheck_core::stress_device;
use gemmcheck_probe::temperature_probe;
use tracing::error;

/// GPU stress test
#[derive(Parser)]
#[command(name = "bench-stress", version, long_version = LONG_VERSION)]
#[command(about = "Sustained GPU matmul stress test")]
struct Cli {
    /// Test duration in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    duration: u64,

    #[command(flatten)]
    common: CommonArgs,
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let config = cli.common.load_config()?;
    let probe = temperature_probe(&config.telemetry);
    let report = stress_device(
        cli.common.device,
        &config.stress,
        Duration::from_secs(cli.duration),
        cli.common.memory_limit,
        probe.as_ref(),
    );
    emit_report(&report)?;
    Ok(for_status(report.status))
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = setup_logging(&cli.common.log_level, cli.common.log_format) {
        eprintln!("warning: {e:#}");
    }

    let code = run(&cli).unwrap_or_else(|e| {
        error!("{e:#}");
        EXIT_FAILURE
    });
    std::process::exit(code);
}
