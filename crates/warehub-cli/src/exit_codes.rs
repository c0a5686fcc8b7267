//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

#![allow(dead_code)]

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - the run failed as a whole, nothing was written
pub const ERROR: i32 = 1;

/// Partial failure - some repositories failed or were skipped, the rest
/// were published
pub const PARTIAL_FAILURE: i32 = 3;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
