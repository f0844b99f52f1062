pub mod config;
pub mod metrics;
pub mod model;
pub mod postprocess;
pub mod weights;

pub use config::DetectorConfig;
pub use metrics::{Metrics, evaluate};
pub use model::VelocityClassifier;
pub use weights::{Weights, WeightsStore};
