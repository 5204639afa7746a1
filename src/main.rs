//! Vibra CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vibra::cli::{commands, log_filter, Cli, Commands};
use vibra::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first: it supplies the default log level
    let config_path = cli
        .config
        .as_ref()
        .map(|p| Settings::expand_path(p))
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // Initialize logging; stderr keeps stdout clean for MCP and --json output
    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            log_filter(cli.verbose, &settings.general.log_level)
        })))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path).await?;
        }

        Commands::Columns => {
            commands::run_columns(&settings).await?;
        }

        Commands::All { date, json } => {
            commands::run_all(date, *json, &settings).await?;
        }

        Commands::Max { date, json } => {
            commands::run_max(date, *json, &settings).await?;
        }

        Commands::Outliers { date, threshold, json } => {
            commands::run_outliers(date, *threshold, *json, &settings).await?;
        }

        Commands::Analyze { values } => {
            commands::run_analyze(values)?;
        }

        Commands::Agent { task, model } => {
            commands::run_agent(task, model.clone(), &settings).await?;
        }

        Commands::Chat { message, model } => {
            commands::run_chat(message, model.clone(), &settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, &settings).await?;
        }

        Commands::Mcp => {
            commands::run_mcp(&settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings, &config_path)?;
        }
    }

    Ok(())
}
