//! Vizual CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "vizual")]
#[command(about = "Incremental code structure graph with a live debugger overlay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Graph root folder (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the graph server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "7890")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[command(flatten)]
        limits: commands::GraphOptions,
    },
    /// Expand the whole graph once and print a summary
    Index {
        #[command(flatten)]
        limits: commands::GraphOptions,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("vizual={log_level}")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve { port, host, limits } => {
            tracing::info!("Vizual v{}", env!("CARGO_PKG_VERSION"));
            commands::serve(cli.root, host, port, limits).await
        }
        Commands::Index { limits } => commands::index(cli.root, limits).await,
        Commands::Version => {
            println!("Vizual v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
