use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "recgather")]
#[command(about = "recgather CLI - record query fragment aggregation", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed a JSON file of reply fragments through the aggregation pipeline
    Replay {
        /// JSON array of raw fragments
        #[arg(long)]
        input: PathBuf,

        /// Print progress events as fragments are merged
        #[arg(long)]
        progress: bool,
    },
    /// Print the effective configuration
    Config,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Replay { input, progress } => {
            commands::replay::run(cli.config.as_deref(), &input, progress).await?
        }
        Commands::Config => commands::config::show(cli.config.as_deref())?,
    }

    Ok(())
}
