use anyhow::{Context, Result};
use homesales_error::{ErrorCode, ErrorContext, HomeSalesError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::models::DATE_BUILT;

// Default constants
pub const DEFAULT_CONFIG_PATH: &str = "homesales.yaml";
pub const DEFAULT_VIEW_NAME: &str = "home_sales";
pub const DEFAULT_PARTITIONED_VIEW_NAME: &str = "p_home_sales";
pub const DEFAULT_PARTITION_DIR: &str = "home_sales_partitioned";
pub const DEFAULT_DELIMITER: char = ',';
pub const DEFAULT_TARGET_PARTITIONS: usize = 4;
pub const DEFAULT_QUERY_TIMEOUT_SECONDS: u64 = 300;

pub const DEFAULT_TELEMETRY_ENABLED: bool = false;
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";
pub const DEFAULT_SERVICE_NAME: &str = "homesales";

pub const ENV_PREFIX: &str = "HOMESALES";

#[derive(Debug, Deserialize, Serialize, Default, Clone, Validate)]
pub struct AppConfig {
    #[serde(default)]
    #[validate(nested)]
    pub dataset: DatasetSettings,
    #[serde(default)]
    #[validate(nested)]
    pub partition: PartitionSettings,
    #[serde(default)]
    #[validate(nested)]
    pub engine: EngineSettings,
    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

/// Where the delimited home sales file lives and how to read it.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct DatasetSettings {
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default = "default_view_name")]
    #[validate(custom(function = "validate_view_name"))]
    pub view_name: String,

    #[serde(default = "default_has_header")]
    pub has_header: bool,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Let the engine infer column types instead of using the canonical schema
    #[serde(default)]
    pub infer_schema: bool,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            path: None,
            view_name: default_view_name(),
            has_header: default_has_header(),
            delimiter: default_delimiter(),
            infer_schema: false,
        }
    }
}

impl DatasetSettings {
    pub fn require_path(&self) -> std::result::Result<&str, HomeSalesError> {
        self.path.as_deref().ok_or_else(|| {
            HomeSalesError::new(ErrorCode::MissingRequiredField, "No dataset path configured")
                .with_context(ErrorContext::Config {
                    file_path: None,
                    field: Some("dataset.path".to_string()),
                })
                .with_hint("Set dataset.path, HOMESALES_DATASET__PATH or pass --dataset")
        })
    }
}

/// Layout of the partitioned Parquet copy.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct PartitionSettings {
    #[serde(default = "default_partition_dir")]
    #[validate(length(min = 1))]
    pub output_dir: String,

    #[serde(default = "default_partition_column")]
    #[validate(length(min = 1))]
    pub column: String,

    #[serde(default = "default_partitioned_view_name")]
    #[validate(custom(function = "validate_view_name"))]
    pub view_name: String,

    #[serde(default = "default_overwrite")]
    pub overwrite: bool,

    /// Parquet codec, e.g. `snappy` or `zstd(3)`; the engine default applies when unset
    #[serde(default)]
    pub compression: Option<String>,
}

impl Default for PartitionSettings {
    fn default() -> Self {
        Self {
            output_dir: default_partition_dir(),
            column: default_partition_column(),
            view_name: default_partitioned_view_name(),
            overwrite: default_overwrite(),
            compression: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct EngineSettings {
    #[serde(default = "default_target_partitions")]
    #[validate(range(min = 1))]
    pub target_partitions: usize,

    #[serde(default)]
    pub memory_limit_mb: Option<usize>,

    #[serde(default)]
    pub spill_dir: Option<String>,

    #[serde(default = "default_query_timeout_seconds")]
    #[validate(range(min = 1))]
    pub query_timeout_seconds: u64,

    /// Raw DataFusion options, e.g. `datafusion.execution.batch_size: "4096"`
    #[serde(default)]
    pub datafusion_config: HashMap<String, String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            target_partitions: default_target_partitions(),
            memory_limit_mb: None,
            spill_dir: None,
            query_timeout_seconds: default_query_timeout_seconds(),
            datafusion_config: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_otlp_endpoint")]
    #[validate(url)]
    pub endpoint: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            endpoint: default_otlp_endpoint(),
            service_name: default_service_name(),
        }
    }
}

fn default_view_name() -> String {
    DEFAULT_VIEW_NAME.to_string()
}

fn default_has_header() -> bool {
    true
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

fn default_partition_dir() -> String {
    DEFAULT_PARTITION_DIR.to_string()
}

fn default_partition_column() -> String {
    DATE_BUILT.to_string()
}

fn default_partitioned_view_name() -> String {
    DEFAULT_PARTITIONED_VIEW_NAME.to_string()
}

fn default_overwrite() -> bool {
    true
}

fn default_target_partitions() -> usize {
    DEFAULT_TARGET_PARTITIONS
}

fn default_query_timeout_seconds() -> u64 {
    DEFAULT_QUERY_TIMEOUT_SECONDS
}

fn default_telemetry_enabled() -> bool {
    DEFAULT_TELEMETRY_ENABLED
}

fn default_otlp_endpoint() -> String {
    DEFAULT_OTLP_ENDPOINT.to_string()
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

/// View names are plain lowercase SQL identifiers so they never need quoting.
pub fn is_valid_view_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn validate_view_name(name: &str) -> Result<(), validator::ValidationError> {
    if is_valid_view_name(name) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_view_name"))
    }
}

impl AppConfig {
    /// Load configuration from `path` (if it exists), then `HOMESALES_*`
    /// environment overrides, then validate.
    ///
    /// Nested keys use a double underscore: `HOMESALES_DATASET__PATH`
    /// sets `dataset.path`.
    pub fn from_file(path: &str) -> Result<Self> {
        let builder = config::Config::builder();

        let builder = if std::path::Path::new(path).exists() {
            builder.add_source(config::File::with_name(path))
        } else {
            builder
        };

        let builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder
            .build()
            .map_err(|e| config_error(path, format!("Failed to build configuration: {}", e)))?;

        let app_config: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| config_error(path, format!("Failed to deserialize configuration: {}", e)))?;

        app_config.validate().map_err(|e| {
            config_error(path, format!("Configuration validation failed: {}", e))
        })?;

        tracing::debug!(path, dataset = ?app_config.dataset.path, "Configuration loaded");

        Ok(app_config)
    }

    /// Parse a YAML document directly, without environment overrides.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Yaml))
            .build()
            .context("Failed to parse configuration")?;
        let app_config: AppConfig = cfg
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app_config
            .validate()
            .map_err(|e| config_error("<inline>", format!("Configuration validation failed: {}", e)))?;
        Ok(app_config)
    }
}

fn config_error(path: &str, message: String) -> anyhow::Error {
    HomeSalesError::new(ErrorCode::InvalidConfig, message)
        .with_context(ErrorContext::Config {
            file_path: Some(path.to_string()),
            field: None,
        })
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dataset.view_name, "home_sales");
        assert_eq!(config.partition.column, "date_built");
        assert_eq!(config.partition.view_name, "p_home_sales");
        assert_eq!(config.engine.target_partitions, 4);
    }

    #[test]
    fn test_telemetry_config_validation() {
        let config = TelemetryConfig {
            endpoint: "not_a_url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_view_name_rules() {
        assert!(is_valid_view_name("home_sales"));
        assert!(is_valid_view_name("_tmp2"));
        assert!(!is_valid_view_name(""));
        assert!(!is_valid_view_name("Home_Sales"));
        assert!(!is_valid_view_name("2homes"));
        assert!(!is_valid_view_name("home-sales"));
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
dataset:
  path: data/home_sales_revised.csv
  delimiter: ";"
partition:
  output_dir: /tmp/out
  compression: snappy
engine:
  query_timeout_seconds: 30
  datafusion_config:
    datafusion.execution.batch_size: "1024"
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.dataset.path.as_deref(),
            Some("data/home_sales_revised.csv")
        );
        assert_eq!(config.dataset.delimiter, ';');
        assert!(config.dataset.has_header);
        assert_eq!(config.partition.output_dir, "/tmp/out");
        assert_eq!(config.partition.compression.as_deref(), Some("snappy"));
        assert_eq!(config.engine.query_timeout_seconds, 30);
        assert_eq!(config.engine.datafusion_config.len(), 1);
    }

    #[test]
    fn test_invalid_view_name_rejected() {
        let yaml = "dataset:\n  view_name: Bad-Name\n";
        let err = AppConfig::from_yaml_str(yaml).unwrap_err();
        let hs = err.downcast_ref::<HomeSalesError>().unwrap();
        assert_eq!(hs.code, ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_missing_path_is_reported() {
        let config = AppConfig::default();
        let err = config.dataset.require_path().unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
    }

    #[test]
    fn test_from_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("homesales.yaml");
        std::fs::write(&path, "dataset:\n  path: sales.csv\n  view_name: sales\n").unwrap();

        let config = AppConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.dataset.path.as_deref(), Some("sales.csv"));
        assert_eq!(config.dataset.view_name, "sales");
    }
}
