//! # Error Contexts
//!
//! Structured metadata attached to errors so callers can act on them
//! without parsing messages.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorContext {
    /// Context for HS-2002 (FieldNotFound)
    FieldNotFound {
        field: String,
        view: Option<String>,
        available_fields: Vec<String>,
    },

    /// Context for HS-2003 (ViewNotFound)
    ViewNotFound {
        view: String,
        available_views: Vec<String>,
    },

    /// Context for dataset errors (HS-1001, 1002, 1003)
    Dataset {
        path: String,
        format: String,
    },

    /// Context for HS-4002 (PartitionColumnMissing) and other partition write failures
    Partition {
        column: String,
        output_dir: String,
        available_columns: Vec<String>,
    },

    /// Context for HS-3001..3003 (config errors)
    Config {
        file_path: Option<String>,
        field: Option<String>,
    },

    /// Context for HS-2005 (QueryTimeout)
    Timeout {
        timeout_seconds: u64,
        sql: String,
    },

    /// Generic key-value context for extensibility
    Generic {
        #[serde(flatten)]
        data: std::collections::HashMap<String, serde_json::Value>,
    },
}
