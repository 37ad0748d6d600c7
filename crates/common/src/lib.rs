//! Common types and configuration shared across homesales crates.
//!
//! - **Configuration**: Strongly typed application configuration (`config`).
//! - **Data Model**: The home sale record and its Arrow schema (`models`).
//! - **Telemetry**: Observability setup (`telemetry`).
pub mod config;
pub mod models;
pub mod telemetry;
