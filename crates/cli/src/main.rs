//! Glucocast CLI, the main entry point.
//!
//! Commands:
//! - `forecast` Forecast the next hour from readings or a user's history
//! - `record`   Store a reading for a user
//! - `health`   Run the model health check
//! - `status`   Show configuration and model status
//! - `doctor`   Diagnose setup problems
//! - `onboard`  Create the config directory and default config
//! - `config`   Validate, show, or locate the configuration
//!
//! Forecast and health output is JSON on stdout; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::forecast::ForecastArgs;
use commands::record::RecordArgs;

#[derive(Parser)]
#[command(
    name = "glucocast",
    about = "Glucocast: 60-minute blood glucose forecasting",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Use this config file instead of ~/.glucocast/config.toml
    #[arg(short, long, global = true, env = "GLUCOCAST_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast the next 60 minutes of glucose
    Forecast(ForecastArgs),

    /// Store a glucose reading for a user
    Record(RecordArgs),

    /// Run the model health check and print the report
    Health {
        /// Check this user's model instead of the default
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Show configuration and model status
    Status,

    /// Diagnose setup problems
    Doctor,

    /// Initialize the config directory and default config
    Onboard,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Parse and validate the config file
    Validate,
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Forecast(args) => commands::forecast::run(config_path, args).await?,
        Commands::Record(args) => commands::record::run(config_path, args).await?,
        Commands::Health { user } => commands::health::run(config_path, user).await?,
        Commands::Status => commands::status::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Config { action } => match action {
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
        },
    }

    Ok(())
}
