//! ROCm install metadata and SMI-based device naming.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::command::stdout_if_success;

const SMI_TIMEOUT: Duration = Duration::from_secs(5);

/// ROCm version of the local install, if any.
///
/// Reads `$ROCM_PATH/.info/version` (default `/opt/rocm`) and falls back to
/// `rocm-smi --version`.
pub fn rocm_version() -> Option<String> {
    let root = std::env::var_os("ROCM_PATH")
        .map_or_else(|| PathBuf::from("/opt/rocm"), PathBuf::from);
    rocm_version_from_install(&root).or_else(|| {
        stdout_if_success("rocm-smi", &["--version".to_string()], SMI_TIMEOUT)
            .as_deref()
            .and_then(parse_rocm_smi_version)
    })
}

/// Read the version file of a ROCm install rooted at `root`.
pub fn rocm_version_from_install(root: &Path) -> Option<String> {
    let path = root.join(".info").join("version");
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            let version = contents.lines().next().map(str::trim).filter(|v| !v.is_empty())?;
            Some(version.to_string())
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no ROCm version file");
            None
        }
    }
}

/// Parse the version out of `rocm-smi --version` output.
///
/// ```
/// use gemmcheck_probe::parse_rocm_smi_version;
///
/// assert_eq!(parse_rocm_smi_version("ROCM-SMI version: 2.3.1+abc"), Some("2.3.1+abc".into()));
/// assert_eq!(parse_rocm_smi_version("usage: rocm-smi"), None);
/// ```
pub fn parse_rocm_smi_version(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.to_lowercase().contains("version"))
        .and_then(|line| line.split_once(':').map(|(_, v)| v.trim().to_string()))
        .filter(|v| !v.is_empty())
}

/// Name of GPU `ordinal` according to `nvidia-smi` or `rocm-smi`.
pub fn device_name_from_smi(ordinal: usize) -> Option<String> {
    let nvidia_args = [
        "--query-gpu=name".to_string(),
        "--format=csv,noheader".to_string(),
        "-i".to_string(),
        ordinal.to_string(),
    ];
    if let Some(name) = stdout_if_success("nvidia-smi", &nvidia_args, SMI_TIMEOUT)
        .and_then(|out| out.lines().next().map(|l| l.trim().to_string()))
        .filter(|name| !name.is_empty())
    {
        return Some(name);
    }

    stdout_if_success("rocm-smi", &["--showproductname".to_string()], SMI_TIMEOUT)
        .and_then(|out| parse_rocm_product_name(&out, ordinal))
}

/// Find the card series of GPU `ordinal` in `rocm-smi --showproductname` output.
pub fn parse_rocm_product_name(output: &str, ordinal: usize) -> Option<String> {
    let prefix = format!("GPU[{ordinal}]");
    output
        .lines()
        .filter(|line| line.trim_start().starts_with(&prefix))
        .find(|line| line.to_lowercase().contains("card series"))
        .and_then(|line| line.rsplit(':').next())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}
