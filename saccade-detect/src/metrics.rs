use saccade_core::{Matrix, Result};
use serde::Serialize;

/// Sample-level agreement between ground truth and predicted labels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub true_positive: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_negative: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

pub fn evaluate(truth: &Matrix<u8>, predicted: &Matrix<u8>) -> Result<Metrics> {
    truth.ensure_same_shape(predicted, "evaluation")?;

    let (mut tp, mut fp, mut fn_, mut tn) = (0usize, 0usize, 0usize, 0usize);
    for (&t, &p) in truth.as_slice().iter().zip(predicted.as_slice()) {
        match (t != 0, p != 0) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => tn += 1,
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(Metrics {
        true_positive: tp,
        false_positive: fp,
        false_negative: fn_,
        true_negative: tn,
        precision,
        recall,
        f1,
    })
}
