//! Souk CLI - Terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password may also come from SOUK_PASSWORD)
//! souk login -e ada@example.com -p hunter2
//!
//! # Browse and fill the cart
//! souk products --search mug
//! souk cart add 65f1c2 --qty 2
//! souk wishlist toggle 65f1d9
//!
//! # Check out
//! souk checkout address --full-name "Ada Lovelace" --address "12 St James's Square" \
//!     --city London --postal-code "SW1Y 4JH" --country UK
//! souk checkout payment paypal
//! souk checkout review
//! souk checkout place
//! ```
//!
//! Configuration is read from the environment (see `souk_client::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use souk_client::{ClientConfig, Storefront};
use souk_core::{PaymentMethod, ProductId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "souk")]
#[command(author, version, about = "Souk terminal storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "SOUK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "SOUK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget local state
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List catalog products
    Products {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        page: Option<u32>,
    },
    /// Show one catalog product
    Product { id: String },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Review and place an order
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
    /// Show or change UI preferences
    Prefs {
        #[command(subcommand)]
        action: Option<PrefsAction>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product (sets the line's quantity)
    Add {
        id: String,

        #[arg(short, long, default_value_t = 1)]
        qty: u32,
    },
    /// Change a line's quantity, clamped to available stock
    Set { id: String, qty: u32 },
    /// Remove a line
    Remove { id: String },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show wishlist entries
    Show,
    /// Add or remove a product
    Toggle { id: String },
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Save the shipping address
    Address(commands::checkout::AddressArgs),
    /// Save the payment method (`paypal`, `card`, `cod`)
    Payment { method: PaymentMethod },
    /// Show the order review
    Review,
    /// Place the order
    Place,
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Set the theme (`light`, `dark`)
    Theme { theme: souk_client::preferences::Theme },
    /// Set the locale
    Locale { locale: String },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Sentry must be initialized before the tracing subscriber
    let config = ClientConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "souk=info,souk_client=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            let _ = writeln!(std::io::stderr(), "error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), CliError> {
    let storefront = Storefront::new(config)?;
    storefront.start().await;

    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Login { email, password } => {
            commands::account::login(&storefront, &mut out, &email, password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            commands::account::register(&storefront, &mut out, &name, &email, password).await?;
        }
        Commands::Logout => commands::account::logout(&storefront, &mut out).await?,
        Commands::Whoami => commands::account::whoami(&storefront, &mut out)?,
        Commands::Products {
            search,
            category,
            page,
        } => {
            commands::catalog::list(&storefront, &mut out, search, category, page).await?;
        }
        Commands::Product { id } => {
            commands::catalog::show(&storefront, &mut out, &ProductId::new(id)).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&storefront, &mut out).await?,
            CartAction::Add { id, qty } => {
                commands::cart::add(&storefront, &mut out, &ProductId::new(id), qty).await?;
            }
            CartAction::Set { id, qty } => {
                commands::cart::set(&storefront, &mut out, &ProductId::new(id), qty).await?;
            }
            CartAction::Remove { id } => {
                commands::cart::remove(&storefront, &mut out, &ProductId::new(id)).await?;
            }
            CartAction::Clear => commands::cart::clear(&storefront, &mut out).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(&storefront, &mut out).await?,
            WishlistAction::Toggle { id } => {
                commands::wishlist::toggle(&storefront, &mut out, &ProductId::new(id)).await?;
            }
        },
        Commands::Checkout { action } => match action {
            CheckoutAction::Address(args) => {
                commands::checkout::address(&storefront, &mut out, args).await?;
            }
            CheckoutAction::Payment { method } => {
                commands::checkout::payment(&storefront, &mut out, method).await?;
            }
            CheckoutAction::Review => commands::checkout::review(&storefront, &mut out).await?,
            CheckoutAction::Place => commands::checkout::place(&storefront, &mut out).await?,
        },
        Commands::Prefs { action } => match action {
            None => commands::prefs::show(&storefront, &mut out)?,
            Some(PrefsAction::Theme { theme }) => {
                commands::prefs::theme(&storefront, &mut out, theme)?;
            }
            Some(PrefsAction::Locale { locale }) => {
                commands::prefs::locale(&storefront, &mut out, &locale)?;
            }
        },
    }

    Ok(())
}
