//! Configuration file support.
//!
//! A configuration is a JSON document with four optional sections:
//!
//! ```json
//! {
//!   "extraction": { "extract_images": true, "min_image_size": 50 },
//!   "generation": { "schema": "rittdoc", "include_toc": false },
//!   "output": { "output_dir": "./output", "create_package": true },
//!   "service": { "host": "127.0.0.1", "port": 8000, "max_concurrent_jobs": 5 }
//! }
//! ```
//!
//! Missing fields take their defaults.

use crate::convert::ConvertOptions;
use crate::error::{Error, Result};
use crate::extract::ExtractOptions;
use crate::jobs::{OrchestratorConfig, DEFAULT_JOB_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENT_JOBS};
use crate::render::DocBookOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extraction options
    pub extraction: ExtractOptions,

    /// DocBook generation options
    pub generation: DocBookOptions,

    /// Output options
    pub output: OutputConfig,

    /// Job service options
    pub service: ServiceConfig,

    /// Log verbosity
    pub log_level: LogLevel,
}

/// Where and what to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory (job directories live below it)
    pub output_dir: PathBuf,

    /// Build the zip package
    pub create_package: bool,

    /// Write a validation report
    pub validate: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            create_package: true,
            validate: true,
        }
    }
}

/// HTTP service and worker pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Worker pool size
    pub max_concurrent_jobs: usize,

    /// Maximum job duration in seconds
    pub job_timeout_secs: u64,

    /// Largest accepted upload in megabytes
    pub max_upload_mb: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            job_timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
            max_upload_mb: 100,
        }
    }
}

impl ServiceConfig {
    /// `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Largest accepted upload in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// Log verbosity level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter string understood by `env_logger`.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.service.max_concurrent_jobs == 0 {
            return Err(Error::Input(
                "service.max_concurrent_jobs must be at least 1".into(),
            ));
        }
        if self.service.job_timeout_secs == 0 {
            return Err(Error::Input("service.job_timeout_secs must be positive".into()));
        }
        if !(1..=6).contains(&self.generation.toc_depth) {
            return Err(Error::Input("generation.toc_depth must be within 1..=6".into()));
        }
        Ok(())
    }

    /// Conversion options derived from the configuration.
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            extract: self.extraction.clone(),
            docbook: self.generation.clone(),
            create_package: self.output.create_package,
            validate: self.output.validate,
        }
    }

    /// Orchestrator settings derived from the configuration.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::new(&self.output.output_dir)
            .with_max_concurrent_jobs(self.service.max_concurrent_jobs)
            .with_job_timeout(Duration::from_secs(self.service.job_timeout_secs))
            .with_convert_options(self.convert_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Schema;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.service.port, 8000);
        assert_eq!(config.service.max_concurrent_jobs, 5);
        assert_eq!(config.extraction.min_image_size, 50);
        assert!(config.output.create_package);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_partial_json() {
        let config = Config::from_json(
            r#"{"generation": {"schema": "docbook42", "include_toc": true},
                "service": {"port": 9100}}"#,
        )
        .unwrap();
        assert_eq!(config.generation.schema, Schema::DocBook42);
        assert!(config.generation.include_toc);
        assert_eq!(config.generation.toc_depth, 3);
        assert_eq!(config.service.port, 9100);
        assert_eq!(config.service.host, "127.0.0.1");
        assert_eq!(config.service.bind_address(), "127.0.0.1:9100");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_json(r#"{"service": {"max_concurrent_jobs": 0}}"#),
            Err(Error::Input(_))
        ));
        assert!(matches!(Config::from_json("{ nope"), Err(Error::Json(_))));
    }

    #[test]
    fn test_round_trip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docxbook.json");
        let mut config = Config::default();
        config.output.create_package = false;
        std::fs::write(&path, config.to_json().unwrap()).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_orchestrator_config() {
        let mut config = Config::default();
        config.service.job_timeout_secs = 12;
        config.output.create_package = false;
        let orchestrator = config.orchestrator_config();
        assert_eq!(orchestrator.job_timeout, Duration::from_secs(12));
        assert!(!orchestrator.convert.create_package);
    }
}
