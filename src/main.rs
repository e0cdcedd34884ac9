use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use crypto_tracker::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for crypto_tracker::AppCommand {
    fn from(cmd: Commands) -> crypto_tracker::AppCommand {
        match cmd {
            Commands::Serve => crypto_tracker::AppCommand::Serve,
            Commands::Show { currency, limit } => {
                crypto_tracker::AppCommand::Show { currency, limit }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Serve cached market data over HTTP and keep it refreshed
    Serve,
    /// Print market data for one currency
    Show {
        /// Currency code, e.g. usd, eur or kzt
        #[arg(default_value = "usd")]
        currency: String,

        /// Show only the first N assets
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => crypto_tracker::cli::setup::setup(),
        Some(cmd) => crypto_tracker::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
