//! Storefront configuration

use std::path::PathBuf;

use clap::{ArgAction, Args};
use rusty_money::iso::{self, Currency};

use crate::{
    catalog::{Catalog, CatalogError},
    orders::StatusSchedule,
    session::SessionSettings,
};

/// Currencies totals can be reported in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CurrencyCode {
    /// US dollar
    #[default]
    Usd,

    /// Pound sterling
    Gbp,

    /// Euro
    Eur,
}

impl CurrencyCode {
    /// The ISO currency.
    pub fn currency(self) -> &'static Currency {
        match self {
            Self::Usd => iso::USD,
            Self::Gbp => iso::GBP,
            Self::Eur => iso::EUR,
        }
    }
}

/// Storage and session settings.
#[derive(Debug, Clone, Args)]
pub struct StorefrontConfig {
    /// Directory holding the persisted cart, orders and favorites
    #[arg(long, env = "STOREFRONT_DATA_DIR", default_value = ".storefront")]
    pub data_dir: PathBuf,

    /// Product table to use instead of the bundled collection
    #[arg(long, env = "STOREFRONT_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Currency totals are reported in
    #[arg(long, env = "STOREFRONT_CURRENCY", value_enum, default_value_t = CurrencyCode::Usd)]
    pub currency: CurrencyCode,

    /// Seed demo orders when no order history exists
    #[arg(
        long,
        env = "STOREFRONT_SEED_DEMO_ORDERS",
        action = ArgAction::Set,
        default_value_t = true
    )]
    pub seed_demo_orders: bool,

    /// Base URL of the server cart API; the local cart is used when unset
    #[arg(long, env = "STOREFRONT_REMOTE_CART_URL")]
    pub remote_cart_url: Option<String>,

    /// CSRF token sent to the server cart API
    #[arg(long, env = "STOREFRONT_CSRF_TOKEN", hide_env_values = true)]
    pub csrf_token: Option<String>,
}

impl StorefrontConfig {
    /// The configured product table, or the bundled one.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the table cannot be read or parsed.
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog {
            Some(path) => Catalog::from_path(path),
            None => Catalog::builtin(),
        }
    }

    /// Session settings for these options.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            currency: self.currency.currency(),
            seed_demo_orders: self.seed_demo_orders,
            schedule: StatusSchedule::default(),
            rng_seed: None,
        }
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        storefront: StorefrontConfig,

        #[command(flatten)]
        logging: LoggingConfig,
    }

    #[test]
    fn flags_override_defaults() -> TestResult {
        let parsed = Harness::try_parse_from([
            "storefront",
            "--data-dir",
            "/tmp/shop",
            "--currency",
            "gbp",
            "--seed-demo-orders",
            "false",
            "--log-format",
            "json",
        ])?;

        let settings = parsed.storefront.session_settings();

        assert_eq!(parsed.storefront.data_dir, PathBuf::from("/tmp/shop"));
        assert_eq!(settings.currency, iso::GBP);
        assert!(!settings.seed_demo_orders);
        assert!(matches!(parsed.logging.log_format, LogFormat::Json));

        Ok(())
    }

    #[test]
    fn unknown_currency_is_rejected() {
        assert!(Harness::try_parse_from(["storefront", "--currency", "jpy"]).is_err());
    }
}
