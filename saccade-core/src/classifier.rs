use crate::error::Result;
use crate::matrix::Matrix;

/// Classifier output, shaped like the input position matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub labels: Matrix<u8>,
    pub probability: Matrix<f64>,
}

impl Prediction {
    pub fn shape(&self) -> (usize, usize) {
        self.labels.shape()
    }
}

/// Maps horizontal (and optionally vertical) eye position to saccade labels
pub trait SaccadeClassifier: std::fmt::Debug {
    fn predict(&self, x: &Matrix<f64>, y: Option<&Matrix<f64>>) -> Result<Prediction>;

    fn name(&self) -> &str;
}
