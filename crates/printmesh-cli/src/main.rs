//! printmesh CLI binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use printmesh_cli::{load_config, Cli, Commands, ConfigView, OutputFormat, Scenario};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();
    let config = load_config(cli.config.as_deref()).context("loading market config")?;

    match cli.command {
        Commands::Simulate { scenario } => {
            let report = Scenario::from_file(&scenario)?
                .run(config)
                .with_context(|| format!("running {}", scenario.display()))?;
            format.write(&mut stdout, &report)?;
        }
        Commands::Config => {
            format.write(&mut stdout, &ConfigView(config))?;
        }
    }
    Ok(())
}
