//! Table building configuration, loadable from TOML.

use std::path::Path;

use gat_core::{GatError, GatResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiConfig {
    /// Topology-vector value of an element wired to its nominal bus
    #[serde(default = "default_reference_bus")]
    pub reference_bus: i32,
    /// Separator used when joining impacted element names for display
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            reference_bus: default_reference_bus(),
            separator: default_separator(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_reference_bus() -> i32 {
    1
}

fn default_separator() -> String {
    " - ".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    #[default]
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Hive-style partition columns (Parquet only)
    #[serde(default)]
    pub partitions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl KpiConfig {
    pub fn from_toml_str(contents: &str) -> GatResult<Self> {
        let config: KpiConfig =
            toml::from_str(contents).map_err(|err| GatError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> GatResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> GatResult<()> {
        if self.output.format == OutputFormat::Csv && !self.output.partitions.is_empty() {
            return Err(GatError::Config(
                "partitioned output requires the parquet format".to_string(),
            ));
        }
        Ok(())
    }
}
