//! Procure CLI - Command-line interface for procurement notice extraction.

use clap::Parser;
use procure_cli::commands;
use procure_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> procure_cli::Result<()> {
    let cli = Cli::parse();

    // Logs on stderr, results on stdout
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config_path = cli.config.as_deref();
    let config = Config::load(config_path)?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Extract(args) => {
            commands::execute_extract(args, &config, &formatter).await?;
        }
        Command::Load(args) => {
            commands::execute_load(args, &config, &formatter).await?;
        }
        Command::Config(args) => {
            commands::execute_config(args, &config, config_path, &formatter).await?;
        }
    }

    Ok(())
}
