use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "saccade")]
#[command(about = "Detect saccades in eye-tracking traces and plot them", long_about = None)]
#[command(version)]
pub struct Cli {
    /// JSON configuration file; defaults are used when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Classify the configured dataset and plot one trial (default)
    Run,

    /// Plot ground-truth labels for consecutive trials
    Labels {
        #[arg(long, default_value_t = 5)]
        start: usize,

        #[arg(long, default_value_t = 5)]
        count: usize,
    },

    /// Write a synthetic X/Y/Labels dataset
    Synth {
        #[arg(short, long, default_value = "data/synthetic")]
        out: PathBuf,

        #[arg(long, default_value_t = 20)]
        trials: usize,

        #[arg(long, default_value_t = 1000)]
        samples: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}
