//! trialparse CLI - Command-line interface for the eligibility pipeline.

use clap::Parser;
use trialparse_cli::commands;
use trialparse_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> trialparse_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    // Logs go to stderr so JSON output stays clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.settings.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Parse(args) => commands::execute_parse(args, &config, &formatter).await?,
        Command::Decode(args) => commands::execute_decode(args, &formatter)?,
    }

    Ok(())
}
