//! Shared plumbing for the `bench-matmul` and `bench-stress` binaries.

pub mod args;
pub mod exit;
pub mod logging;
pub mod output;

pub use args::{CommonArgs, LogFormat};
pub use logging::setup_logging;
pub use output::emit_report;

/// `--version` long form with toolchain and target.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (rustc ",
    env!("VERGEN_RUSTC_SEMVER"),
    ", ",
    env!("VERGEN_CARGO_TARGET_TRIPLE"),
    ")"
);
