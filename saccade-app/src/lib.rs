pub mod app;
pub mod cli;
pub mod config;

pub use app::{App, RunSummary, labels_figure, prediction_figure};
pub use cli::{Cli, Commands};
pub use config::PipelineConfig;
