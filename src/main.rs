use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use tracerec_cli::cli::{cmd_serve, init_logging, load_config, ServeArgs};

#[derive(Parser)]
#[command(name = "tracerec")]
#[command(about = "Execution-trace recorder for browser automation")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overrides config)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Force debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the framed protocol on stdin/stdout
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = load_config(cli.config.as_ref()).await?;
    let config = loaded.config;
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let log_guard = init_logging(level, cli.debug, config.log_file.as_deref())?;

    match cli.command {
        Commands::Serve(args) => {
            cmd_serve(args, config).await?;
            // Browsers that ignored the shutdown must not keep the process alive.
            drop(log_guard);
            std::process::exit(0);
        }
    }
}
