//! Cart Drawer CLI - Drive the cart drawer against a live store.
//!
//! # Usage
//!
//! ```bash
//! # Show the current cart as the drawer would render it
//! cart-cli show
//!
//! # Add two units of a variant with a line item property
//! cart-cli add --variant 39 --quantity 2 --property Engraving=MV
//!
//! # Step a line's quantity, or remove it
//! cart-cli increase 39:abc
//! cart-cli decrease 39:abc
//! cart-cli remove 39:abc
//! ```
//!
//! # Environment Variables
//!
//! Read via `DrawerConfig::from_env` (`.env` is loaded if present):
//! `CART_BASE_URL`, `CART_TOKEN`, `CART_CONTINUE_SHOPPING_URL`,
//! `CART_SYNC_POLICY`. `--base-url` and `--policy` take precedence.

#![cfg_attr(not(test), forbid(unsafe_code))]

use cart_drawer::SyncPolicy;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cart-cli")]
#[command(author, version, about = "Cart drawer CLI tools")]
struct Cli {
    /// Storefront origin (overrides `CART_BASE_URL`)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Ordering of overlapping operations (overrides `CART_SYNC_POLICY`)
    #[arg(long, global = true)]
    policy: Option<SyncPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the cart and print the rendered drawer
    Show,
    /// Add a variant to the cart
    Add {
        /// Variant id
        #[arg(short, long)]
        variant: u64,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Line item property as `name=value` (repeatable)
        #[arg(short, long = "property", value_parser = commands::cart::parse_property)]
        properties: Vec<(String, String)>,

        /// Subscription selling plan id
        #[arg(long)]
        selling_plan: Option<String>,

        /// Send a JSON `{id, quantity}` body instead of a product form
        #[arg(long, conflicts_with_all = ["properties", "selling_plan"])]
        json: bool,
    },
    /// Increase a line's quantity by one
    Increase {
        /// Line item key
        key: String,
    },
    /// Decrease a line's quantity by one, removing it at zero
    Decrease {
        /// Line item key
        key: String,
    },
    /// Remove a line
    Remove {
        /// Line item key
        key: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cart_drawer=info,cart_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = commands::cart::load_config(cli.base_url.as_deref(), cli.policy)?;
    let session = commands::cart::Session::connect(&config)?;

    match cli.command {
        Commands::Show => session.show().await?,
        Commands::Add {
            variant,
            quantity,
            properties,
            selling_plan,
            json,
        } => {
            let payload =
                commands::cart::add_payload(variant, quantity, &properties, selling_plan, json);
            session.add(&payload).await?;
        }
        Commands::Increase { key } => session.step(&key, 1).await?,
        Commands::Decrease { key } => session.step(&key, -1).await?,
        Commands::Remove { key } => session.remove(&key).await?,
    }
    Ok(())
}
