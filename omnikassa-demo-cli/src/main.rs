//! OmniKassa Demo CLI
//!
//! Command-line interface for announcing orders, pulling order statuses and
//! checking signatures against the OmniKassa 2.0 gateway.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod ui;

use commands::canonical::PayloadKind;

#[derive(Parser)]
#[command(name = "omnikassa-demo")]
#[command(about = "OmniKassa Demo CLI - announce orders and verify gateway messages", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON config file (defaults to OMNIKASSA_* environment variables)
    #[arg(long, global = true, env = "OMNIKASSA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Announce an order and print the payment redirect URL
    Announce {
        /// Merchant order reference
        #[arg(long)]
        order_id: String,

        /// Amount in minor units (cents)
        #[arg(long)]
        amount: i64,

        /// ISO 4217 currency code
        #[arg(long, default_value = "EUR")]
        currency: String,

        /// URL the consumer returns to after paying
        #[arg(long)]
        return_url: String,

        /// Order description shown to the consumer
        #[arg(long)]
        description: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Pull all order results for a webhook notification
    StatusPull {
        /// File containing the notification JSON
        notification: PathBuf,

        /// Print results as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Check a notification's signature and freshness offline
    VerifyNotification {
        /// File containing the notification JSON
        notification: PathBuf,
    },

    /// Sign a canonical string with the configured key
    Sign {
        /// Canonical string to sign
        canonical: String,
    },

    /// Print the canonical string of a gateway payload
    Canonical {
        /// Payload type
        #[arg(value_enum)]
        kind: PayloadKind,

        /// File containing the payload JSON
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "omnikassa_demo_cli=debug,omnikassa_lib=debug"
    } else {
        "omnikassa_demo_cli=info,omnikassa_lib=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();

    let outcome = match cli.command {
        Commands::Announce {
            order_id,
            amount,
            currency,
            return_url,
            description,
            yes,
        } => {
            let request = commands::announce::AnnounceArgs {
                order_id,
                amount,
                currency,
                return_url,
                description,
                assume_yes: yes,
            };
            commands::announce::run(config, request, cli.verbose).await
        }
        Commands::StatusPull { notification, json } => {
            commands::status_pull::run(config, &notification, json, cli.verbose).await
        }
        Commands::VerifyNotification { notification } => {
            commands::verify_notification::run(config, &notification, cli.verbose)
        }
        Commands::Sign { canonical } => commands::sign::run(config, &canonical),
        Commands::Canonical { kind, file } => commands::canonical::run(kind, &file),
    };

    if let Err(e) = outcome {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}
