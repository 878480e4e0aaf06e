//! Process exit codes.
//!
//! The exit code mirrors the test run that was read. Reporting problems only
//! change it under `--strict`.

pub const EXIT_SUCCESS: i32 = 0;
/// At least one test in the input failed.
pub const TESTS_FAILED: i32 = 1;
/// Unreadable input or unusable arguments.
pub const CONFIG_ERROR: i32 = 2;
/// Upload rejected or failed (strict mode only).
pub const UPLOAD_FAILED: i32 = 3;
