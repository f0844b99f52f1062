use anyhow::Result;
use clap::Parser;
use saccade_app::{App, Cli, Commands, PipelineConfig};
use saccade_data::SyntheticConfig;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let summary = App::new(config)?.run()?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Labels { start, count } => {
            let output = App::new(config)?.labels(start, count)?;
            println!("{}", output.display());
        }
        Commands::Synth {
            out,
            trials,
            samples,
            seed,
        } => {
            let synthetic = SyntheticConfig {
                trials,
                samples,
                seed,
                sampfreq: config.detector.sampfreq,
                ..SyntheticConfig::default()
            };
            App::synthesize(&synthetic, &out)?;
        }
    }

    Ok(())
}
