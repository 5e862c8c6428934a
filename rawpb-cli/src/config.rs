//! Configuration loading and parsing

use anyhow::{bail, Context, Result};
use rawpb_decoder::{DecoderConfig, FieldNumber, MAX_FIELD_NUMBER};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Fields to decode as nested messages instead of raw bytes
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub messages: Vec<FieldNumber>,
}

impl AppConfig {
    /// Reject field numbers the registry would refuse
    pub fn validate(&self) -> Result<()> {
        for &number in &self.schema.messages {
            if !(1..=MAX_FIELD_NUMBER).contains(&number) {
                bail!(
                    "Invalid message field number {} (expected 1..={})",
                    number,
                    MAX_FIELD_NUMBER
                );
            }
        }
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    config
        .validate()
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}
