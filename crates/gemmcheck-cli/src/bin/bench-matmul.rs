//! Matrix multiplication throughput benchmark.
//!
//! Runs square matmuls over a ladder of sizes that fit the memory limit and
//! prints a JSON report on stdout.

use clap::Parser;
use gemmcheck_cli::exit::{for_status, EXIT_FAILURE};
use gemmcheck_cli::{emit_report, setup_logging, CommonArgs, LONG_VERSION};
use gemmcheck_core::benchmark_device;
use tracing::error;

/// Matrix multiplication benchmark
#[derive(Parser)]
#[command(name = "bench-matmul", version, long_version = LONG_VERSION)]
#[command(about = "Matrix multiplication throughput benchmark")]
#[command(after_help = r#"Examples:
  # Benchmark GPU 0 within the default 16 GiB budget
  bench-matmul

  # Smaller budget on the second GPU
  bench-matmul --memory-limit 4 --device cuda:1
"#)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let config = cli.common.load_config()?;
    let report = benchmark_device(cli.common.device, &config.benchmark, cli.common.memory_limit);
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
