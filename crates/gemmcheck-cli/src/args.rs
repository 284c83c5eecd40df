//! Flags shared by both binaries.

use anyhow::Context;
use clap::{Args, ValueEnum};
use gemmcheck_common::GemmcheckConfig;
use gemmcheck_core::DeviceSelector;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Memory limit in GiB used to size the matrices
    #[arg(long, value_name = "GB", default_value_t = 16)]
    pub memory_limit: u64,

    /// Device to run on (cpu, cuda, cuda:N)
    #[arg(long, value_name = "DEVICE", default_value = "cuda", env = "GEMMCHECK_DEVICE")]
    pub device: DeviceSelector,

    /// TOML file with sizing and sampling policy
    #[arg(short, long, value_name = "PATH", env = "GEMMCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log layout on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl CommonArgs {
    /// Defaults, then `--config`, then `GEMMCHECK_*` overrides, validated.
    pub fn load_config(&self) -> anyhow::Result<GemmcheckConfig> {
        GemmcheckConfig::resolve(self.config.as_deref()).with_context(|| match &self.config {
            Some(path) => format!("Failed to load configuration from {}", path.display()),
            None => "Failed to load configuration from environment".to_string(),
        })
    }
}
