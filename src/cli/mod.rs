use std::{
    io::{self, Write},
    sync::Arc,
};

use clap::{Parser, Subcommand};
use storefront::{
    catalog::Catalog,
    clock::SystemClock,
    config::{LoggingConfig, StorefrontConfig},
    events::{Notification, NotificationKind, StorefrontObserver, TracingObserver},
    session::Storefront,
    store::FileStore,
};

mod cart;
mod catalog;
mod favorites;
mod orders;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Luxury watch storefront", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    storefront: StorefrontConfig,

    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Browse the collection
    Catalog(catalog::CatalogCommand),

    /// Manage the cart
    Cart(cart::CartCommand),

    /// Manage favorites
    Favorites(favorites::FavoritesCommand),

    /// Place an order for everything in the cart
    Checkout,

    /// Browse and act on past orders
    Orders(orders::OrdersCommand),

    /// Show account totals
    Account,

    /// Apply order status updates that are due
    Tick,
}

impl Cli {
    pub(crate) fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let config = self.storefront;

        match self.command {
            Commands::Catalog(command) => catalog::run(command, &config),
            Commands::Cart(command) => cart::run(command, &config).await,
            Commands::Favorites(command) => favorites::run(command, &config),
            Commands::Checkout => orders::checkout(&config),
            Commands::Orders(command) => orders::run(command, &config),
            Commands::Account => account(&config),
            Commands::Tick => orders::tick(&config),
        }
    }
}

/// Shows notifications on stderr and mirrors them to the log.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ConsoleObserver;

impl StorefrontObserver for ConsoleObserver {
    fn on_notification(&self, notification: &Notification) {
        TracingObserver.on_notification(notification);

        let marker = match notification.kind {
            NotificationKind::Info => "i",
            NotificationKind::Success => "✓",
            NotificationKind::Error => "✗",
        };

        _ = writeln!(io::stderr(), "{marker} {}", notification.message);
    }
}

pub(crate) fn open_session(config: &StorefrontConfig) -> Result<Storefront, String> {
    let store = FileStore::open(&config.data_dir).map_err(|error| {
        format!(
            "failed to open data directory {}: {error}",
            config.data_dir.display()
        )
    })?;

    Ok(Storefront::open(
        Arc::new(store),
        Arc::new(SystemClock),
        Arc::new(ConsoleObserver),
        config.session_settings(),
    ))
}

pub(crate) fn load_catalog(config: &StorefrontConfig) -> Result<Catalog, String> {
    config
        .load_catalog()
        .map_err(|error| format!("failed to load catalog: {error}"))
}

pub(crate) fn write_failed(error: io::Error) -> String {
    format!("failed to write output: {error}")
}

fn account(config: &StorefrontConfig) -> Result<(), String> {
    let session = open_session(config)?;
    let summary = session.account_summary();
    let mut out = io::stdout().lock();

    writeln!(out, "orders: {}", summary.orders).map_err(write_failed)?;
    writeln!(out, "total_spent: {}", summary.total_spent).map_err(write_failed)?;
    writeln!(out, "favorites: {}", summary.favorites).map_err(write_failed)?;
    writeln!(out, "cart_items: {}", summary.cart_items).map_err(write_failed)?;

    Ok(())
}
