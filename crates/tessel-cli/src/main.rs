//! Tessel CLI
//!
//! Developer tool for discovering operators and running feature pipelines.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod catalog;
mod commands;
mod input;

/// Tessel - feature-engineering graphs
#[derive(Parser)]
#[command(name = "tessel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project directory or tessel.yaml path
    #[arg(short, long, default_value = "tessel.yaml", env = "TESSEL_CONFIG")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new Tessel project
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Project name (defaults to directory name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Validate configuration, operators and pipelines without running
    Validate,

    /// Inspect the operator catalog
    Operators {
        #[command(subcommand)]
        command: OperatorCommands,
    },

    /// Apply pipelines to their input data
    Run {
        /// Run a specific pipeline only
        #[arg(short, long)]
        pipeline: Option<String>,
    },
}

#[derive(Subcommand)]
enum OperatorCommands {
    /// List registered operators
    List,

    /// Show operator details
    Show {
        /// Operator name
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    match cli.log_format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    match cli.command {
        Commands::Init { path, name } => {
            commands::init::run(&path, name.as_deref())?;
        }
        Commands::Validate => {
            commands::validate::run(&cli.config)?;
        }
        Commands::Operators { command } => match command {
            OperatorCommands::List => {
                commands::operators::list(&cli.config)?;
            }
            OperatorCommands::Show { name } => {
                commands::operators::show(&cli.config, &name)?;
            }
        },
        Commands::Run { pipeline } => {
            commands::run::run(&cli.config, pipeline.as_deref())?;
        }
    }

    Ok(())
}
