//! Bounded external command execution.

use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors produced while running an external helper.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },
}

/// Run `program` with `args`, capturing stdout, and give up after `timeout`.
///
/// The child is killed when the timeout fires. A non-zero exit status is not
/// an error here; callers decide whether partial output is usable.
pub fn run_with_timeout(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<Output, ProbeError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ProbeError::Runtime)?;

    runtime.block_on(async {
        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProbeError::Spawn {
                program: program.to_string(),
                source,
            })?;

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                debug!(
                    program,
                    status = %output.status,
                    bytes = output.stdout.len(),
                    "helper finished"
                );
                Ok(output)
            }
            Ok(Err(source)) => Err(ProbeError::Wait {
                program: program.to_string(),
                source,
            }),
            // Dropping the wait future drops the child, and kill_on_drop reaps it.
            Err(_) => Err(ProbeError::Timeout {
                program: program.to_string(),
                timeout,
            }),
        }
    })
}

/// Stdout of a successful run, or `None`.
pub(crate) fn stdout_if_success(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Option<String> {
    match run_with_timeout(program, args, timeout) {
        Ok(output) if output.status.success() => String::from_utf8(output.stdout).ok(),
        Ok(output) => {
            debug!(program, status = %output.status, "helper exited unsuccessfully");
            None
        }
        Err(e) => {
            debug!(error = %e, "helper unavailable");
            None
        }
    }
}
