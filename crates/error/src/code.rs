use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric error codes following HS-XXXX format.
///
/// ## Code Ranges
/// - **1000-1999**: Dataset errors
/// - **2000-2999**: Query errors
/// - **3000-3999**: Configuration errors
/// - **4000-4999**: Storage errors
/// - **5000-5999**: Internal/System errors
///
/// Codes are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
#[non_exhaustive]
pub enum ErrorCode {
    // === Dataset Errors (1000-1999) ===
    /// HS-1001: Dataset path does not exist
    DatasetNotFound = 1001,
    /// HS-1002: Dataset exists but could not be read or parsed
    DatasetUnreadable = 1002,
    /// HS-1003: Dataset columns do not match the expected schema
    SchemaMismatch = 1003,

    // === Query Errors (2000-2999) ===
    /// HS-2001: SQL syntax or planning error
    SyntaxError = 2001,
    /// HS-2002: Field/column not found
    FieldNotFound = 2002,
    /// HS-2003: View not registered
    ViewNotFound = 2003,
    /// HS-2004: Type mismatch in expression
    TypeMismatch = 2004,
    /// HS-2005: Query exceeded the configured timeout
    QueryTimeout = 2005,
    /// HS-2006: No named analysis query matches the request
    UnknownQuery = 2006,

    // === Configuration Errors (3000-3999) ===
    /// HS-3001: Configuration could not be loaded or failed validation
    InvalidConfig = 3001,
    /// HS-3002: Missing required field in config
    MissingRequiredField = 3002,
    /// HS-3003: View name is not a valid identifier
    InvalidViewName = 3003,

    // === Storage Errors (4000-4999) ===
    /// HS-4001: Writing output files failed
    WriteFailed = 4001,
    /// HS-4002: Partition column is not part of the view
    PartitionColumnMissing = 4002,
    /// HS-4003: Output directory already holds data and overwrite is off
    OutputNotEmpty = 4003,

    // === Internal Errors (5000-5999) ===
    /// HS-5001: Internal DataFusion error
    EngineInternal = 5001,
    /// HS-5002: Serialization/deserialization failed
    SerializationFailed = 5002,
    /// HS-5003: Unexpected internal state
    InternalPanic = 5003,
    /// HS-5004: Feature not implemented
    NotImplemented = 5004,

    /// HS-9999: Unknown/unclassified error
    Unknown = 9999,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Get the formatted code string (e.g., "HS-2002")
    pub fn as_str(&self) -> String {
        format!("HS-{:04}", self.as_u16())
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self.as_u16() {
            1000..=1999 => ErrorCategory::Dataset,
            2000..=2999 => ErrorCategory::Query,
            3000..=3999 => ErrorCategory::Config,
            4000..=4999 => ErrorCategory::Storage,
            _ => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> String {
        code.as_str()
    }
}

impl TryFrom<String> for ErrorCode {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        let num: u16 = s
            .strip_prefix("HS-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| "Invalid format".to_string())?;
        Self::try_from(num).map_err(|_| "Unknown code".to_string())
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(n: u16) -> std::result::Result<Self, Self::Error> {
        match n {
            1001 => Ok(Self::DatasetNotFound),
            1002 => Ok(Self::DatasetUnreadable),
            1003 => Ok(Self::SchemaMismatch),
            2001 => Ok(Self::SyntaxError),
            2002 => Ok(Self::FieldNotFound),
            2003 => Ok(Self::ViewNotFound),
            2004 => Ok(Self::TypeMismatch),
            2005 => Ok(Self::QueryTimeout),
            2006 => Ok(Self::UnknownQuery),
            3001 => Ok(Self::InvalidConfig),
            3002 => Ok(Self::MissingRequiredField),
            3003 => Ok(Self::InvalidViewName),
            4001 => Ok(Self::WriteFailed),
            4002 => Ok(Self::PartitionColumnMissing),
            4003 => Ok(Self::OutputNotEmpty),
            5001 => Ok(Self::EngineInternal),
            5002 => Ok(Self::SerializationFailed),
            5003 => Ok(Self::InternalPanic),
            5004 => Ok(Self::NotImplemented),
            9999 => Ok(Self::Unknown),
            _ => Err(format!("Unknown error code: {}", n)),
        }
    }
}

/// High-level error category, used by the CLI to pick an exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorCategory {
    Dataset,
    Query,
    Config,
    Storage,
    Internal,
}
