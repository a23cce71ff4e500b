use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

#[derive(Parser)]
#[command(name = "portfolio-report")]
#[command(about = "Daily portfolio analytics report", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch data, render charts and write the HTML report
    Report {
        /// Path to the portfolio configuration (JSON)
        #[arg(short, long, env = "PORTFOLIO_CONFIG")]
        config: Option<PathBuf>,

        /// Output directory, overrides the configured one
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Fetch data and print the market cap, sector and movers tables
    Tables {
        /// Path to the portfolio configuration (JSON)
        #[arg(short, long, env = "PORTFOLIO_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Write the default configuration file
    InitConfig {
        /// Destination path (default: portfolio.json)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

pub fn run() {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Report { config, output_dir } => {
            commands::report::run(config, output_dir);
        }
        Commands::Tables { config } => {
            commands::tables::run(config);
        }
        Commands::InitConfig { path, force } => {
            commands::init_config::run(path, force);
        }
    }
}
