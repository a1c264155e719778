//! Tienda CLI - Storefront and admin operations from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog, or one category of it
//! tienda products
//! tienda products --category 3
//!
//! # Log in and fill the cart
//! tienda login -e ana@tienda.co -p clave123
//! tienda cart add 12 --quantity 2
//!
//! # Place the order, undoing everything if a line fails
//! tienda checkout --rollback
//!
//! # Admin: ship orders and export the list
//! tienda admin ship 41 42
//! tienda admin export --dir ./exports
//! ```
//!
//! # Commands
//!
//! - `products` - List the catalog
//! - `login` / `logout` - Manage the local session
//! - `cart` - Inspect and change the saved cart
//! - `checkout` - Turn the cart into an order
//! - `orders` - Page through orders
//! - `payments` - Payment methods and saved payment details
//! - `admin` - Order status, tracking, refunds, export, client list
//! - `verify-email` - Email verification service
//!
//! # Logging
//!
//! - `RUST_LOG` - Filter directives (default: `tienda=info`)
//! - `TIENDA_LOG_FORMAT` - `json` for JSON lines, human-readable otherwise

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "tienda")]
#[command(author, version, about = "Tienda Suplementos CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        /// Bypass the list cache
        #[arg(long)]
        refresh: bool,

        /// Only products in this category id
        #[arg(long)]
        category: Option<i64>,
    },
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    /// Manage the saved cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart contents
    Checkout {
        /// Delete the order and its lines if any line fails
        #[arg(long)]
        rollback: bool,
    },
    /// Page through orders
    Orders {
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = 20)]
        size: usize,

        /// Status filter (`pending`, `shipped`, `delivered`, `refunded`)
        #[arg(long)]
        status: Option<String>,

        /// Search over order id, user id and date
        #[arg(long)]
        search: Option<String>,
    },
    /// Payment methods and saved details
    Payments {
        #[command(subcommand)]
        action: PaymentAction,
    },
    /// Administrator operations
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Email verification service
    VerifyEmail {
        #[command(subcommand)]
        action: VerifyAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product
    Add {
        product_id: i64,

        #[arg(short, long, default_value_t = 1)]
        quantity: i32,
    },
    /// Set the quantity of a line (0 removes it)
    Set { product_id: i64, quantity: i32 },
    /// Remove a line
    Remove { product_id: i64 },
    /// Empty the cart
    Clear,
    /// Re-read stock for every line
    Refresh,
}

#[derive(Subcommand)]
enum PaymentAction {
    /// List payment methods
    List,
    /// List the logged-in user's saved payment details
    Details,
    /// Delete a saved payment detail
    Delete { detail_id: i64 },
    /// Show a store setting with its accepted payments
    Settings { setting_id: i64 },
    /// Accept a payment method in a store setting
    Accept { setting_id: i64, payment_id: i64 },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List orders with per-status counts
    Orders {
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = 20)]
        size: usize,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        search: Option<String>,
    },
    /// Mark orders as shipped
    Ship { order_ids: Vec<i64> },
    /// Set the status of one or more orders
    Status {
        /// Target status (`pending`, `shipped`, `delivered`, `refunded`)
        status: String,
        order_ids: Vec<i64>,
    },
    /// Assign a tracking number
    Track { order_id: i64, tracking_number: String },
    /// Refund an order and restock its lines
    Refund { order_id: i64 },
    /// Export orders to CSV
    Export {
        #[arg(long, default_value = "exports")]
        dir: PathBuf,
    },
    /// List customers
    Clients {
        #[arg(long, default_value = "")]
        search: String,

        /// `recent`, `alpha`, `orders` or `newest`
        #[arg(long, default_value = "recent")]
        sort: String,
    },
}

#[derive(Subcommand)]
enum VerifyAction {
    /// Start verification of an address
    Start {
        email: String,

        /// URL the service calls back when done
        #[arg(long)]
        callback_url: String,
    },
    /// Check a verification
    Status { verification_id: String },
    /// Describe the service
    Info,
}

/// Install the subscriber. `RUST_LOG` overrides the default filter and
/// `TIENDA_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "tienda=info".into());
    let json = std::env::var("TIENDA_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = commands::Context::from_env()?;
    match cli.command {
        Commands::Products { refresh, category } => {
            commands::catalog::list(&ctx, refresh, category).await?;
        }
        Commands::Login { email, password } => {
            commands::account::login(&ctx, &email, &password).await?;
        }
        Commands::Logout => commands::account::logout(&ctx).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx).await,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&ctx, product_id, quantity).await?,
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(&ctx, product_id, quantity).await?,
            CartAction::Remove { product_id } => commands::cart::remove(&ctx, product_id).await?,
            CartAction::Clear => commands::cart::clear(&ctx).await?,
            CartAction::Refresh => commands::cart::refresh(&ctx).await?,
        },
        Commands::Checkout { rollback } => commands::cart::checkout(&ctx, rollback).await?,
        Commands::Orders {
            page,
            size,
            status,
            search,
        } => commands::orders::list(&ctx, page, size, status.as_deref(), search).await?,
        Commands::Payments { action } => match action {
            PaymentAction::List => commands::payments::list(&ctx).await?,
            PaymentAction::Details => commands::payments::details(&ctx).await?,
            PaymentAction::Delete { detail_id } => {
                commands::payments::delete(&ctx, detail_id).await?;
            }
            PaymentAction::Settings { setting_id } => {
                commands::payments::settings(&ctx, setting_id).await?;
            }
            PaymentAction::Accept {
                setting_id,
                payment_id,
            } => commands::payments::accept(&ctx, setting_id, payment_id).await?,
        },
        Commands::Admin { action } => {
            commands::admin::require_admin(&ctx).await?;
            match action {
                AdminAction::Orders {
                    page,
                    size,
                    status,
                    search,
                } => {
                    commands::admin::orders(&ctx, page, size, status.as_deref(), search).await?;
                }
                AdminAction::Ship { order_ids } => {
                    commands::admin::set_status(&ctx, "shipped", &order_ids).await?;
                }
                AdminAction::Status { status, order_ids } => {
                    commands::admin::set_status(&ctx, &status, &order_ids).await?;
                }
                AdminAction::Track {
                    order_id,
                    tracking_number,
                } => commands::admin::track(&ctx, order_id, &tracking_number).await?,
                AdminAction::Refund { order_id } => commands::admin::refund(&ctx, order_id).await?,
                AdminAction::Export { dir } => commands::admin::export(&ctx, &dir).await?,
                AdminAction::Clients { search, sort } => {
                    commands::admin::clients(&ctx, &search, &sort).await?;
                }
            }
        }
        Commands::VerifyEmail { action } => match action {
            VerifyAction::Start {
                email,
                callback_url,
            } => commands::account::verify_start(&ctx, &email, &callback_url).await?,
            VerifyAction::Status { verification_id } => {
                commands::account::verify_status(&ctx, &verification_id).await?;
            }
            VerifyAction::Info => commands::account::verify_info(&ctx).await?,
        },
    }
    Ok(())
}
