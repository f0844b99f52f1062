use crate::config::DetectorConfig;
use crate::postprocess::{clear_missing, merge_close, remove_short};
use crate::weights::{Weights, WeightsStore};
use saccade_core::{Matrix, Prediction, Result, SaccadeClassifier, SaccadeError, saccade_runs};
use tracing::{debug, info};

/// Velocity-threshold saccade classifier.
///
/// Each trial is differentiated with a 5-point moving window, every velocity
/// component is scaled by `max(lambda * robust_sd, min_threshold)` and the
/// resulting radius is squashed into a probability. Binary labels are the
/// probabilities above `cutoff`, with close saccades merged and short ones
/// dropped afterwards.
#[derive(Debug, Clone)]
pub struct VelocityClassifier {
    config: DetectorConfig,
    weights: Weights,
}

impl VelocityClassifier {
    pub fn new(config: DetectorConfig, weights: Weights) -> Result<Self> {
        config.validate().map_err(SaccadeError::Config)?;
        weights.validate()?;
        Ok(Self { config, weights })
    }

    /// Resolves `config.weights_name` and builds the classifier.
    pub fn from_config(config: DetectorConfig) -> Result<Self> {
        config.validate().map_err(SaccadeError::Config)?;
        let weights = WeightsStore::new(config.weights_dir.clone()).resolve(&config.weights_name)?;
        info!(
            "Classifier ready: {} Hz, min duration {} ms, min distance {} ms, weights '{}'",
            config.sampfreq, config.min_sacc_dur, config.min_sacc_dist, weights.name
        );
        Self::new(config, weights)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    fn predict_row(
        &self,
        x: &[f64],
        y: Option<&[f64]>,
        labels: &mut [u8],
        probability: &mut [f64],
    ) {
        let fs = self.config.sampfreq as f64;
        let vx = velocity(x, fs);
        let vy = y.map(|y| velocity(y, fs));

        let tx = self.threshold(&vx);
        let ty = vy.as_deref().map(|v| self.threshold(v));

        for i in 0..x.len() {
            let mut radius = (vx[i] / tx).powi(2);
            if let (Some(vy), Some(ty)) = (&vy, ty) {
                radius += (vy[i] / ty).powi(2);
            }
            let radius = radius.sqrt();
            let missing = !x[i].is_finite() || y.is_some_and(|y| !y[i].is_finite());
            probability[i] = if radius.is_finite() && !missing {
                1.0 / (1.0 + (-self.weights.slope * (radius - 1.0)).exp())
            } else {
                0.0
            };
            labels[i] = u8::from(probability[i] > self.weights.cutoff);
        }

        // Clearing first lets merging bridge short dropouts inside a saccade
        clear_missing(labels, x, y);
        merge_close(labels, self.config.min_distance_samples());
        remove_short(labels, self.config.min_duration_samples());
    }

    fn threshold(&self, v: &[f64]) -> f64 {
        (self.weights.lambda * robust_sd(v)).max(self.weights.min_threshold)
    }
}

impl SaccadeClassifier for VelocityClassifier {
    fn predict(&self, x: &Matrix<f64>, y: Option<&Matrix<f64>>) -> Result<Prediction> {
        if let Some(y) = y {
            x.ensure_same_shape(y, "vertical position")?;
        }

        let (rows, cols) = x.shape();
        let mut labels = Matrix::filled(rows, cols, 0u8);
        let mut probability = Matrix::filled(rows, cols, 0.0f64);

        for i in 0..rows {
            let xr = x.row(i)?;
            let yr = match y {
                Some(y) => Some(y.row(i)?),
                None => None,
            };
            self.predict_row(xr, yr, labels.row_mut(i)?, probability.row_mut(i)?);
            debug!("Trial {}: {} saccades", i, saccade_runs(labels.row(i)?).len());
        }

        Ok(Prediction {
            labels,
            probability,
        })
    }

    fn name(&self) -> &str {
        &self.weights.name
    }
}

/// 5-point moving-window velocity in position units per second.
pub fn velocity(x: &[f64], fs: f64) -> Vec<f64> {
    let n = x.len();
    let mut v = vec![0.0; n];
    if n < 2 {
        return v;
    }
    for i in 0..n {
        v[i] = if i >= 2 && i + 2 < n {
            (x[i + 2] + x[i + 1] - x[i - 1] - x[i - 2]) * fs / 6.0
        } else if i >= 1 && i + 1 < n {
            (x[i + 1] - x[i - 1]) * fs / 2.0
        } else if i == 0 {
            (x[1] - x[0]) * fs
        } else {
            (x[n - 1] - x[n - 2]) * fs
        };
    }
    v
}

/// Median-based spread: `sqrt(median(v^2) - median(v)^2)` over finite samples.
pub fn robust_sd(v: &[f64]) -> f64 {
    let finite: Vec<f64> = v.iter().copied().filter(|x| x.is_finite()).collect();
    if finite.is_empty() {
        return 0.0;
    }
    let squares: Vec<f64> = finite.iter().map(|x| x * x).collect();
    let m = median(finite);
    (median(squares) - m * m).max(0.0).sqrt()
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
