//! WikiVox CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wikivox::cli::{commands, Cli, Commands, ConfigAction};
use wikivox::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("wikivox={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    // A broken config file must not block writing a fresh one.
    if let Commands::Config {
        action: action @ ConfigAction::Init { .. },
    } = &cli.command
    {
        return commands::run_config(action, &Settings::default(), cli.config.as_deref());
    }

    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    match &cli.command {
        Commands::Extract(args) => {
            commands::run_extract(args, settings).await?;
        }

        Commands::Search { term, limit } => {
            commands::run_search(term, *limit, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}
