// CLI for launching transfer-fee Token-2022 mints
//
// Reads a TOML launch config, then quotes fees, prints the creation plan,
// runs the full launch or harvests withheld fees of an existing mint.

mod commands;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fee-token")]
#[command(about = "Transfer-fee Token-2022 launcher", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to launch configuration file
    #[arg(short, long, default_value = "fee-token.toml", global = true)]
    config: String,

    /// Log level for the fee_token target (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote the transfer fee for an amount
    Quote(commands::quote::QuoteCmd),

    /// Print the mint creation plan without touching the cluster
    Plan,

    /// Create, mint, transfer, harvest and hand off
    Launch,

    /// Harvest withheld fees of an existing mint into the fee vault
    Harvest {
        /// Mint address
        #[arg(long)]
        mint: String,
    },

    /// Write an example configuration file
    InitConfig {
        #[arg(long, default_value = "fee-token.toml")]
        path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Quote(cmd) => commands::quote::execute(cmd, &cli.config),
        Commands::Plan => commands::plan::execute(&cli.config),
        Commands::Launch => commands::launch::execute(&cli.config),
        Commands::Harvest { mint } => commands::launch::harvest(&cli.config, &mint),
        Commands::InitConfig { path } => commands::init_config(&path),
    }
}

fn init_logging(level: &str) -> Result<()> {
    let level: tracing::Level = level
        .parse()
        .map_err(|_| anyhow!("Invalid log level: {}", level))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("fee_token={}", level.as_str().to_lowercase()).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
    Ok(())
}
