//! Configuration management for the Siara voice bridge
//!
//! Supports loading configuration from:
//! - YAML/TOML files (config/default, config/{env})
//! - Environment variables (SIARA__ prefix, __ separator)
//!
//! Missing upstream credentials are deliberately not fatal at load
//! time: the gateways report a per-request configuration error
//! instead, so the process can start and serve /health regardless.

pub mod settings;

pub use settings::{
    load_settings, AgentforceConfig, BhashiniConfig, ObservabilityConfig, ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
