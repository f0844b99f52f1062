use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use saccade_core::{Matrix, Result, SaccadeError};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub trials: usize,
    pub samples: usize,
    pub sampfreq: u32,
    pub seed: u64,
    /// Measurement noise, in position units
    pub noise_sd: f64,
    pub min_amplitude: f64,
    pub max_amplitude: f64,
    pub min_fixation_ms: u32,
    pub max_fixation_ms: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            trials: 20,
            samples: 1000,
            sampfreq: 1000,
            seed: 42,
            noise_sd: 0.01,
            min_amplitude: 1.0,
            max_amplitude: 8.0,
            min_fixation_ms: 120,
            max_fixation_ms: 400,
        }
    }
}

impl SyntheticConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.sampfreq == 0 {
            return Err("sampfreq must be positive".to_string());
        }
        if !(self.noise_sd >= 0.0) {
            return Err("noise_sd must be non-negative".to_string());
        }
        if !(self.min_amplitude > 0.0 && self.min_amplitude <= self.max_amplitude) {
            return Err("amplitude range must be positive and ordered".to_string());
        }
        if self.min_fixation_ms == 0 || self.min_fixation_ms > self.max_fixation_ms {
            return Err("fixation range must be positive and ordered".to_string());
        }
        Ok(())
    }

    fn ms_to_samples(&self, ms: f64) -> usize {
        ((ms * self.sampfreq as f64 / 1000.0).round() as usize).max(1)
    }
}

/// Horizontal and vertical traces with their true saccade labels
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDataset {
    pub x: Matrix<f64>,
    pub y: Matrix<f64>,
    pub labels: Matrix<u8>,
}

/// Generates fixation/saccade sequences. Saccade durations follow the main
/// sequence (2.2 ms per unit of amplitude plus 21 ms) with a raised-cosine
/// position profile.
pub fn generate(config: &SyntheticConfig) -> Result<SyntheticDataset> {
    config.validate().map_err(SaccadeError::Config)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut x = Matrix::filled(config.trials, config.samples, 0.0);
    let mut y = Matrix::filled(config.trials, config.samples, 0.0);
    let mut labels = Matrix::filled(config.trials, config.samples, 0u8);

    let mut saccades = 0usize;
    for trial in 0..config.trials {
        let mut pos = (rng.random_range(-5.0..5.0), rng.random_range(-5.0..5.0));
        let mut t = 0usize;
        let xr = x.row_mut(trial)?;
        let yr = y.row_mut(trial)?;
        let lr = labels.row_mut(trial)?;

        while t < config.samples {
            let fixation_ms = rng.random_range(config.min_fixation_ms..=config.max_fixation_ms);
            let fixation_end = (t + config.ms_to_samples(fixation_ms as f64)).min(config.samples);
            while t < fixation_end {
                xr[t] = pos.0;
                yr[t] = pos.1;
                t += 1;
            }
            if t >= config.samples {
                break;
            }

            let amplitude = rng.random_range(config.min_amplitude..=config.max_amplitude);
            let angle = rng.random_range(0.0..(2.0 * PI));
            let duration = config.ms_to_samples(2.2 * amplitude + 21.0);
            let start = pos;
            let target = (
                start.0 + amplitude * angle.cos(),
                start.1 + amplitude * angle.sin(),
            );

            let end = (t + duration).min(config.samples);
            let onset = t;
            while t < end {
                let phase = (t - onset + 1) as f64 / duration as f64;
                let progress = 0.5 * (1.0 - (PI * phase).cos());
                xr[t] = start.0 + (target.0 - start.0) * progress;
                yr[t] = start.1 + (target.1 - start.1) * progress;
                lr[t] = 1;
                t += 1;
            }
            pos = target;
            saccades += 1;
        }

        if config.noise_sd > 0.0 {
            for v in xr.iter_mut().chain(yr.iter_mut()) {
                *v += config.noise_sd * standard_normal(&mut rng);
            }
        }
    }

    info!(
        "Generated {} synthetic trials with {} saccades (seed {})",
        config.trials, saccades, config.seed
    );
    Ok(SyntheticDataset { x, y, labels })
}

// Box-Muller
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = rng.random_range(f64::EPSILON..1.0);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use saccade_core::saccade_runs;

    fn small() -> SyntheticConfig {
        SyntheticConfig {
            trials: 4,
            samples: 800,
            ..SyntheticConfig::default()
        }
    }

    #[test]
    fn test_shapes_match() {
        let data = generate(&small()).unwrap();
        assert_eq!(data.x.shape(), (4, 800));
        assert_eq!(data.y.shape(), (4, 800));
        assert_eq!(data.labels.shape(), (4, 800));
    }

    #[test]
    fn test_same_seed_same_data() {
        let a = generate(&small()).unwrap();
        let b = generate(&small()).unwrap();
        assert_eq!(a, b);

        let c = generate(&SyntheticConfig {
            seed: 7,
            ..small()
        })
        .unwrap();
        assert_ne!(a.x, c.x);
    }

    #[test]
    fn test_every_trial_has_saccades() {
        let data = generate(&small()).unwrap();
        for row in data.labels.iter_rows() {
            let runs = saccade_runs(row);
            assert!(!runs.is_empty());
            // first run starts after a fixation of at least 120 ms
            assert!(runs[0].onset >= 120);
        }
    }

    #[test]
    fn test_saccade_moves_gaze() {
        let config = SyntheticConfig {
            noise_sd: 0.0,
            ..small()
        };
        let data = generate(&config).unwrap();
        let x = data.x.row(0).unwrap();
        let y = data.y.row(0).unwrap();
        let run = saccade_runs(data.labels.row(0).unwrap())[0];
        if run.offset < config.samples {
            let before = (x[run.onset - 1], y[run.onset - 1]);
            let after = (x[run.offset - 1], y[run.offset - 1]);
            let amplitude = ((after.0 - before.0).powi(2) + (after.1 - before.1).powi(2)).sqrt();
            assert!(amplitude >= config.min_amplitude - 1e-9);
            assert!(amplitude <= config.max_amplitude + 1e-9);
        }
    }

    #[test]
    fn test_invalid_config() {
        let config = SyntheticConfig {
            sampfreq: 0,
            ..SyntheticConfig::default()
        };
        assert!(matches!(generate(&config), Err(SaccadeError::Config(_))));
    }
}
