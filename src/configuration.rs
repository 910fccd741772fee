use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{
    Deserialize,
    Serialize
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Window and resolution used when sampling an arbitrary function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApproxConfiguration {
    start: f64,
    stop: f64,
    num_steps: usize
}

impl ApproxConfiguration {
    pub fn new(start: f64, stop: f64, num_steps: usize) -> ApproxConfiguration {
        ApproxConfiguration { start, stop, num_steps }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }
}

impl Default for ApproxConfiguration {
    fn default() -> Self {
        ApproxConfiguration {
            start: -10.0,
            stop: 10.0,
            num_steps: 100,
        }
    }
}

/// Crate-wide settings. Every section is optional in the JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    approx: ApproxConfiguration
}

impl Configuration {
    pub fn new() -> Configuration {
        Configuration::default()
    }

    pub fn approx(&self) -> &ApproxConfiguration {
        &self.approx
    }

    pub fn from_json_value(json_value: serde_json::Value) -> Result<Configuration, ConfigurationError> {
        Ok(serde_json::from_value(json_value)?)
    }

    pub fn from_reader<P: AsRef<Path>>(file_path: P) -> Result<Configuration, ConfigurationError> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        let configuration: Configuration = serde_json::from_reader(reader)?;
        tracing::debug!(?configuration, "loaded configuration");
        Ok(configuration)
    }
}
