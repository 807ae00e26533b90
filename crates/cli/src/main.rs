//! NearU CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! nearu-cli migrate
//!
//! # Register a shop owner
//! nearu-cli owner register -u "Joe Mart" -e joe@x.com -p secret1 -a "12 Main St" -s Grocery
//!
//! # Show a shop owner
//! nearu-cli owner show NEARU-GRO-7K2QF
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `owner register` - Register a shop owner
//! - `owner show` - Print a shop owner's profile

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use nearu_server::services::owners::RegisterOwnerInput;

mod commands;

#[derive(Parser)]
#[command(name = "nearu-cli")]
#[command(author, version, about = "NearU CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage shop owners
    Owner {
        #[command(subcommand)]
        action: OwnerAction,
    },
}

#[derive(Subcommand)]
enum OwnerAction {
    /// Register a new shop owner
    Register {
        /// Shop display name
        #[arg(short, long)]
        username: String,

        /// Owner email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Shop address
        #[arg(short, long)]
        address: String,

        /// Shop type (Grocery, Electronics, Clothing, Food, Pharmacy, Stationery,
        /// Hardware, Other)
        #[arg(short, long)]
        shop_type: String,
    },
    /// Show a shop owner by login ID
    Show {
        /// Login ID, e.g. `NEARU-GRO-7K2QF`
        unique_id: String,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

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
        Commands::Owner { action } => match action {
            OwnerAction::Register {
                username,
                email,
                password,
                address,
                shop_type,
            } => {
                let unique_id = commands::owner::register(RegisterOwnerInput {
                    username: Some(username),
                    email: Some(email),
                    password: Some(password),
                    address: Some(address),
                    shop_type: Some(shop_type),
                })
                .await?;

                #[allow(clippy::print_stdout)]
                {
                    println!("Registered. Login ID: {unique_id}");
                    println!("Share it with the owner; it is needed to log in.");
                }
            }
            OwnerAction::Show { unique_id } => {
                let profile = commands::owner::show(&unique_id).await?;

                #[allow(clippy::print_stdout)]
                {
                    println!("{profile}");
                }
            }
        },
    }
    Ok(())
}
