//! Huerta storefront CLI.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! huerta products list
//! huerta products show 3
//!
//! # Build a cart
//! huerta cart add 3
//! huerta cart set 3 2
//! huerta cart show
//!
//! # Identity
//! huerta account login 7
//! huerta account whoami
//!
//! # Reconcile stock and submit the order
//! huerta checkout
//! ```
//!
//! # Commands
//!
//! - `products` - Browse the catalog (network, with offline fallback)
//! - `cart` - Inspect and mutate the locally persisted cart
//! - `account` - Sign in, sign out, show the current user
//! - `checkout` - Reconcile stock and submit the cart as an order

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "huerta")]
#[command(author, version, about = "Huerta storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Inspect and mutate the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the signed-in account
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Reconcile stock and submit the cart as an order
    Checkout,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List the published catalog
    List {
        /// Fall back to the locally cached catalog if the backend is unreachable
        #[arg(long)]
        offline_ok: bool,
    },
    /// Show one product in detail
    Show {
        /// Product id
        id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one unit of a product, or increment its existing line
    Add {
        /// Product id
        id: String,
    },
    /// Increment a line by one, bounded by the last seen stock
    Inc {
        /// Product id
        id: String,
    },
    /// Decrement a line by one (a quantity of 1 removes the line)
    Dec {
        /// Product id
        id: String,
    },
    /// Set a line's quantity (0 removes the line)
    Set {
        /// Product id
        id: String,
        /// New quantity
        quantity: u32,
    },
    /// Remove a line entirely
    Remove {
        /// Product id
        id: String,
    },
    /// Show the cart
    Show,
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AccountAction {
    /// Sign in by backend user id
    Login {
        /// Backend user id
        user_id: i64,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set.
    // Logs go to stderr; stdout carries command output only.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "huerta=info,huerta_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
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
    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::List { offline_ok } => commands::products::list(offline_ok).await?,
            ProductsAction::Show { id } => commands::products::show(&id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Add { id } => commands::cart::add(&id).await?,
            CartAction::Inc { id } => commands::cart::inc(&id)?,
            CartAction::Dec { id } => commands::cart::dec(&id)?,
            CartAction::Set { id, quantity } => commands::cart::set(&id, quantity)?,
            CartAction::Remove { id } => commands::cart::remove(&id)?,
            CartAction::Show => commands::cart::show()?,
            CartAction::Clear => commands::cart::clear()?,
        },
        Commands::Account { action } => match action {
            AccountAction::Login { user_id } => commands::account::login(user_id).await?,
            AccountAction::Logout => commands::account::logout()?,
            AccountAction::Whoami => commands::account::whoami()?,
        },
        Commands::Checkout => commands::checkout::run().await?,
    }
    Ok(())
}
