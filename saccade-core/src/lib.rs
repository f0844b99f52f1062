pub mod classifier;
pub mod error;
pub mod matrix;
pub mod overlay;

pub use classifier::{Prediction, SaccadeClassifier};
pub use error::{Result, SaccadeError};
pub use matrix::Matrix;
pub use overlay::{
    Overlay, SaccadeRun, baseline_shift, build_overlay, mask_from_values, saccade_runs,
};
