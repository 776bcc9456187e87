use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stratus_core::Settings;

mod commands;

#[derive(Parser)]
#[command(name = "stratus")]
#[command(about = "Dependency-ordered stack deployment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    /// Settings file (JSON); falls back to $STRATUS_SETTINGS
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// AWS region passed to every provider call
    #[arg(long, global = true)]
    region: Option<String>,

    /// AWS named profile passed to every provider call
    #[arg(long, global = true)]
    profile: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create every stack, each after its dependencies
    Deploy {
        /// Path to the stack configuration file
        #[arg(short, long, default_value = "stack_config.ini")]
        config: PathBuf,
    },

    /// Delete every stack, each after the stacks that depend on it
    Remove {
        /// Path to the stack configuration file
        #[arg(short, long, default_value = "stack_config.ini")]
        config: PathBuf,

        /// Delete without confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Show creation and deletion order without calling the provider
    Plan {
        /// Path to the stack configuration file
        #[arg(short, long, default_value = "stack_config.ini")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.settings.as_deref()).context("Failed to load settings")?;
    if cli.region.is_some() {
        settings.region = cli.region;
    }
    if cli.profile.is_some() {
        settings.profile = cli.profile;
    }

    stratus_core::init_observability(&settings.log_level, cli.debug)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Deploy { config } => {
            commands::deploy(&config, &settings).await?;
        }

        Commands::Remove { config, force } => {
            commands::remove(&config, &settings, force).await?;
        }

        Commands::Plan { config } => {
            commands::plan(&config)?;
        }
    }

    Ok(())
}
