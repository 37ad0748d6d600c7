//! Structured exit codes for machine-readable error handling.
//!
//! Scripts can tell a bad dataset from a bad query without parsing messages.

use homesales_error::{ErrorCategory, HomeSalesError};

/// Success (standard convention)
pub const SUCCESS: i32 = 0;

/// General error (fallback for unknown and internal errors)
pub const GENERAL_ERROR: i32 = 1;

/// CLI usage error (invalid arguments, missing flags)
pub const USAGE_ERROR: i32 = 2;

/// Configuration error (YAML parse failure, failed validation)
pub const CONFIG_ERROR: i32 = 3;

/// Data error (dataset missing or unreadable, partitioned write failed)
pub const DATA_ERROR: i32 = 4;

/// Query error (syntax, unknown view or column, timeout)
pub const QUERY_ERROR: i32 = 5;

/// Map an error to its exit code, by category when it is a `HomeSalesError`.
pub fn for_error(e: &anyhow::Error) -> i32 {
    if let Some(hs) = e.downcast_ref::<HomeSalesError>() {
        return match hs.code.category() {
            ErrorCategory::Dataset | ErrorCategory::Storage => DATA_ERROR,
            ErrorCategory::Config => CONFIG_ERROR,
            ErrorCategory::Query => QUERY_ERROR,
            ErrorCategory::Internal => GENERAL_ERROR,
            _ => GENERAL_ERROR,
        };
    }

    // Fallback for errors that were never classified
    let s = e.to_string().to_lowercase();
    if s.contains("usage") || s.contains("argument") {
        return USAGE_ERROR;
    }
    if s.contains("config") || s.contains("yaml") {
        return CONFIG_ERROR;
    }
    GENERAL_ERROR
}
