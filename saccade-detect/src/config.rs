use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Detector parameters handed to the classifier constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Sampling frequency in Hz
    pub sampfreq: u32,
    /// Minimum saccade duration in ms
    pub min_sacc_dur: u32,
    /// Minimum distance between saccades in ms; closer ones are merged
    pub min_sacc_dist: u32,
    pub weights_name: String,
    /// Extra directory searched for `<weights_name>.json` before the bundled set
    pub weights_dir: Option<PathBuf>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sampfreq: 1000,
            min_sacc_dur: 6,
            min_sacc_dist: 10,
            weights_name: "weights_synthetic".to_string(),
            weights_dir: None,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sampfreq == 0 {
            return Err("sampfreq must be a positive number of Hz".to_string());
        }
        if self.min_sacc_dur == 0 {
            return Err("min_sacc_dur must be a positive number of ms".to_string());
        }
        if self.min_sacc_dist == 0 {
            return Err("min_sacc_dist must be a positive number of ms".to_string());
        }
        if self.weights_name.trim().is_empty() {
            return Err("weights_name must not be empty".to_string());
        }
        Ok(())
    }

    /// Converts a duration to samples, rounding up so thresholds are never undershot.
    pub fn ms_to_samples(&self, ms: u32) -> usize {
        let samples = (ms as u64 * self.sampfreq as u64).div_ceil(1000);
        (samples as usize).max(1)
    }

    pub fn min_duration_samples(&self) -> usize {
        self.ms_to_samples(self.min_sacc_dur)
    }

    pub fn min_distance_samples(&self) -> usize {
        self.ms_to_samples(self.min_sacc_dist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = DetectorConfig::default();
        assert_eq!(config.sampfreq, 1000);
        assert_eq!(config.min_sacc_dur, 6);
        assert_eq!(config.min_sacc_dist, 10);
        assert_eq!(config.weights_name, "weights_synthetic");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero() {
        for config in [
            DetectorConfig {
                sampfreq: 0,
                ..Default::default()
            },
            DetectorConfig {
                min_sacc_dur: 0,
                ..Default::default()
            },
            DetectorConfig {
                min_sacc_dist: 0,
                ..Default::default()
            },
            DetectorConfig {
                weights_name: String::new(),
                ..Default::default()
            },
        ] {
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_ms_to_samples() {
        let config = DetectorConfig::default();
        assert_eq!(config.min_duration_samples(), 6);
        assert_eq!(config.min_distance_samples(), 10);

        let slow = DetectorConfig {
            sampfreq: 250,
            ..Default::default()
        };
        // 6 ms at 250 Hz is 1.5 samples
        assert_eq!(slow.min_duration_samples(), 2);
        assert_eq!(slow.ms_to_samples(1), 1);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: DetectorConfig = serde_json::from_str(r#"{"sampfreq": 500}"#).unwrap();
        assert_eq!(config.sampfreq, 500);
        assert_eq!(config.min_sacc_dur, 6);
    }
}
