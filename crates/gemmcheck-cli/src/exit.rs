//! Process exit codes.

use gemmcheck_core::RunStatus;

pub const EXIT_SUCCESS: i32 = 0;
/// Any non-success report, or a configuration problem.
pub const EXIT_FAILURE: i32 = 1;

/// `0` only for a fully successful run; `completed_with_errors` also fails.
pub const fn for_status(status: RunStatus) -> i32 {
    if status.is_success() { EXIT_SUCCESS } else { EXIT_FAILURE }
}
