use saccade_core::{Result, SaccadeError};
use saccade_data::DataConfig;
use saccade_detect::DetectorConfig;
use saccade_render::PlotConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Everything one run needs. Every field is optional in the JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub detector: DetectorConfig,
    pub data: DataConfig,
    /// Row of the trace matrix to plot
    pub trial: usize,
    pub plot: PlotConfig,
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SaccadeError::not_found("config file", path));
        }
        let config: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.detector
            .validate()
            .and_then(|_| self.data.validate())
            .and_then(|_| self.plot.validate())
            .map_err(SaccadeError::Config)
    }
}
