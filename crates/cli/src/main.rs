//! Waymark CLI - delivery tracking from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! wm migrate
//!
//! # Create an account (signs in)
//! wm register -u alice -e alice@example.com -p 'correct horse'
//!
//! # Record and review deliveries
//! wm deliveries create --customer Alice --warehouse "221B Baker Street, London" \
//!     --date 2024-01-01 --address "10 Downing Street, London"
//! wm deliveries list
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `register` / `login` / `logout` / `whoami` - Session management
//! - `deliveries list` / `deliveries create` - Delivery records
//!
//! Client settings come from `WAYMARK_*` environment variables; see
//! [`waymark_client::ClientConfig`].

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use waymark_client::DeliveryForm;

mod commands;

#[derive(Parser)]
#[command(name = "wm")]
#[command(author, version, about = "Waymark delivery tracking CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "WAYMARK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "WAYMARK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    /// Show who the saved session belongs to
    Whoami,
    /// Manage deliveries
    Deliveries {
        #[command(subcommand)]
        action: DeliveryAction,
    },
}

#[derive(Subcommand)]
enum DeliveryAction {
    /// List your deliveries with map links
    List,
    /// Geocode both addresses and record a delivery
    Create {
        /// Customer name
        #[arg(long)]
        customer: String,

        /// Warehouse address
        #[arg(long)]
        warehouse: String,

        /// Delivery date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Delivery address
        #[arg(long)]
        address: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("waymark_cli=info,waymark_client=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Register {
            username,
            email,
            password,
        } => {
            let mut ctl = commands::controller().await?;
            commands::account::register(&mut ctl, username, email, password).await?;
        }
        Commands::Login { email, password } => {
            let mut ctl = commands::controller().await?;
            commands::account::login(&mut ctl, email, password).await?;
        }
        Commands::Logout => commands::account::logout(&mut commands::controller().await?).await?,
        Commands::Whoami => commands::account::whoami(&mut commands::controller().await?).await?,
        Commands::Deliveries { action } => {
            let mut ctl = commands::controller().await?;
            match action {
                DeliveryAction::List => commands::deliveries::list(&mut ctl).await?,
                DeliveryAction::Create {
                    customer,
                    warehouse,
                    date,
                    address,
                } => {
                    let form = DeliveryForm {
                        customer_name: customer,
                        warehouse_address: warehouse,
                        delivery_date: date,
                        delivery_address: address,
                    };
                    commands::deliveries::create(&mut ctl, form).await?;
                }
            }
        }
    }
    Ok(())
}
