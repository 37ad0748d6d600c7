//! Configuration for a CLI invocation: the YAML file and `HOMESALES_*`
//! environment, then command-line overrides.

use anyhow::Result;
use homesales_common::config::AppConfig;

/// Command-line values that take precedence over the file and environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub dataset: Option<String>,
    pub output_dir: Option<String>,
    pub partition_column: Option<String>,
}

pub fn load(path: &str, overrides: &Overrides) -> Result<AppConfig> {
    let mut config = AppConfig::from_file(path)?;
    apply_overrides(&mut config, overrides);
    Ok(config)
}

fn apply_overrides(config: &mut AppConfig, overrides: &Overrides) {
    if let Some(dataset) = &overrides.dataset {
        config.dataset.path = Some(dataset.clone());
    }
    if let Some(dir) = &overrides.output_dir {
        config.partition.output_dir = dir.clone();
    }
    if let Some(column) = &overrides.partition_column {
        config.partition.column = column.clone();
    }
}
