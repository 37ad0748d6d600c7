//! # homesales-error
//!
//! Unified error types for the homesales analysis walkthrough.
//!
//! Every classified failure carries:
//! - A stable numeric code (HS-XXXX)
//! - Optional structured JSON context
//! - An optional hint describing how to fix the input

mod code;
mod context;
mod convert;

pub use code::{ErrorCategory, ErrorCode};
pub use context::ErrorContext;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The unified error type for all homesales operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeSalesError {
    /// Numeric error code (e.g., "HS-2002")
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Structured context for programmatic handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,

    /// Suggestion for correcting the query or configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl HomeSalesError {
    /// Create a new error with code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    /// Add structured context
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Add a hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Serialize to compact JSON for machine-readable output
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::warn!("Failed to serialize HomeSalesError: {}", e);
            format!(
                r#"{{"code":"{}","message":"Serialization failed"}}"#,
                self.code
            )
        })
    }

    /// Serialize to pretty JSON for logging
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }

    /// Shorthand for a `ViewNotFound` error listing the views that do exist.
    pub fn view_not_found(view: &str, available_views: Vec<String>) -> Self {
        let mut err = Self::new(
            ErrorCode::ViewNotFound,
            format!("View '{}' is not registered", view),
        );
        if let Some(closest) = convert::find_closest_match(view, &available_views) {
            err = err.with_hint(format!("Did you mean '{}'?", closest));
        }
        err.with_context(ErrorContext::ViewNotFound {
            view: view.to_string(),
            available_views,
        })
    }
}

impl fmt::Display for HomeSalesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (Hint: {})", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for HomeSalesError {}

/// Result type alias for homesales operations
pub type Result<T> = std::result::Result<T, HomeSalesError>;
