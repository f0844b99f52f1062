//! Named weights resources for the velocity classifier

use saccade_core::{Result, SaccadeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

const BUNDLED: &[(&str, &str)] = &[(
    "weights_synthetic",
    include_str!("../weights/weights_synthetic.json"),
)];

/// Parameters of the velocity model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    #[serde(default)]
    pub name: String,
    /// Threshold multiplier applied to the robust velocity spread
    pub lambda: f64,
    /// Steepness of the probability curve around the threshold
    pub slope: f64,
    /// Velocity floor (position units per second) for each component
    pub min_threshold: f64,
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
}

fn default_cutoff() -> f64 {
    0.5
}

impl Weights {
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.lambda) || !positive(self.slope) || !positive(self.min_threshold) {
            return Err(SaccadeError::Config(format!(
                "weights '{}' need positive finite lambda, slope and min_threshold",
                self.name
            )));
        }
        if !(self.cutoff > 0.0 && self.cutoff < 1.0) {
            return Err(SaccadeError::Config(format!(
                "weights '{}' cutoff must lie in (0, 1), got {}",
                self.name, self.cutoff
            )));
        }
        Ok(())
    }

    fn parse(name: &str, raw: &str) -> Result<Self> {
        let mut weights: Weights = serde_json::from_str(raw)?;
        if weights.name.is_empty() {
            weights.name = name.to_string();
        }
        weights.validate()?;
        Ok(weights)
    }
}

/// Resolves weights names against an optional directory, then the bundled set.
#[derive(Debug, Clone, Default)]
pub struct WeightsStore {
    dir: Option<PathBuf>,
}

impl WeightsStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn resolve(&self, name: &str) -> Result<Weights> {
        if name.is_empty() || name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(SaccadeError::Config(format!(
                "invalid weights name '{name}'"
            )));
        }

        if let Some(dir) = &self.dir {
            let path = dir.join(format!("{name}.json"));
            if path.is_file() {
                let weights = Weights::parse(name, &fs::read_to_string(&path)?)?;
                info!("Loaded weights '{}' from {}", name, path.display());
                return Ok(weights);
            }
            debug!("No {} in weights dir, trying bundled set", path.display());
        }

        match BUNDLED.iter().find(|(bundled, _)| *bundled == name) {
            Some((_, raw)) => {
                info!("Using bundled weights '{}'", name);
                Weights::parse(name, raw)
            }
            None => {
                let path = match &self.dir {
                    Some(dir) => dir.join(format!("{name}.json")),
                    None => PathBuf::from(name),
                };
                Err(SaccadeError::not_found("weights", path))
            }
        }
    }

    pub fn bundled_names() -> impl Iterator<Item = &'static str> {
        BUNDLED.iter().map(|(name, _)| *name)
    }
}
