//! Structured output handling for CLI commands.

use homesales_error::HomeSalesError;
use serde::Serialize;

use crate::exit_codes;

#[derive(clap::ValueEnum, Clone, Debug, Default, PartialEq, Eq, Copy)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Returns true if the output format is intended for machine consumption
    pub fn is_machine_readable(&self) -> bool {
        match self {
            OutputFormat::Human => false,
            OutputFormat::Json | OutputFormat::Yaml => true,
        }
    }
}

/// Envelope for JSON/YAML output
#[derive(Serialize)]
pub struct CommandResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub exit_code: i32,
    #[serde(flatten)]
    pub data: T,
}

impl<T> CommandResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            exit_code: exit_codes::SUCCESS,
            data,
        }
    }

    pub fn error(message: String, exit_code: i32, data: T) -> Self {
        Self {
            status: "error".to_string(),
            message: Some(message),
            exit_code,
            data,
        }
    }
}

/// Classified details attached to machine-readable errors
#[derive(Serialize, Default)]
pub struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<HomeSalesError>,
}

impl ErrorDetails {
    pub fn from_error(e: &anyhow::Error) -> Self {
        Self {
            error: e.downcast_ref::<HomeSalesError>().cloned(),
        }
    }
}

/// Print the output to stdout in the requested format
pub fn print_output<T: Serialize>(format: OutputFormat, data: T) -> anyhow::Result<()> {
    match format {
        // Human output is printed by the commands themselves
        OutputFormat::Human => {}
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&data)?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&data)?;
            println!("{}", yaml);
        }
    }
    Ok(())
}

/// Print a structured success response for machine outputs
pub fn print_success<T: Serialize>(format: OutputFormat, data: T) -> anyhow::Result<()> {
    if format == OutputFormat::Human {
        return Ok(());
    }
    print_output(format, CommandResponse::success(data))
}

/// Print a structured error response for machine outputs.
///
/// In human mode main prints the error to stderr instead.
pub fn print_error(format: OutputFormat, e: &anyhow::Error, exit_code: i32) -> anyhow::Result<()> {
    if format == OutputFormat::Human {
        return Ok(());
    }
    let response = CommandResponse::error(format!("{:#}", e), exit_code, ErrorDetails::from_error(e));
    print_output(format, response)
}
