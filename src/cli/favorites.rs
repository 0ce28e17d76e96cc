use std::io::{self, Write};

use clap::{Args, Subcommand};
use storefront::config::StorefrontConfig;
use tabled::{builder::Builder, settings::Style};

use super::{load_catalog, open_session, write_failed};

#[derive(Debug, Args)]
pub(crate) struct FavoritesCommand {
    #[command(subcommand)]
    command: FavoritesSubcommand,
}

#[derive(Debug, Subcommand)]
enum FavoritesSubcommand {
    /// Like or unlike a watch
    Toggle(ToggleArgs),

    /// List liked watches
    List,
}

#[derive(Debug, Args)]
struct ToggleArgs {
    /// Product id
    product_id: String,
}

pub(crate) fn run(command: FavoritesCommand, config: &StorefrontConfig) -> Result<(), String> {
    let mut session = open_session(config)?;
    let mut out = io::stdout().lock();

    match command.command {
        FavoritesSubcommand::Toggle(args) => {
            let catalog = load_catalog(config)?;
            let product = catalog
                .get(&args.product_id)
                .ok_or_else(|| format!("no product with id {}", args.product_id))?;

            session.favorites_mut().toggle(product.to_favorite());

            let state = if session.favorites().contains(&product.id) {
                "added to"
            } else {
                "removed from"
            };

            writeln!(out, "{} {state} favorites", product.name).map_err(write_failed)
        }
        FavoritesSubcommand::List => {
            let favorites = session.favorites().list();

            if favorites.is_empty() {
                return writeln!(out, "no favorites yet").map_err(write_failed);
            }

            let currency = session.currency();
            let mut builder = Builder::default();
            builder.push_record(["Id", "Brand", "Model", "Price", "Added"]);

            for favorite in favorites {
                builder.push_record([
                    favorite.id.clone(),
                    favorite.brand.clone(),
                    favorite.name.clone(),
                    favorite.price.to_money(currency).to_string(),
                    favorite.added_at.strftime("%Y-%m-%d").to_string(),
                ]);
            }

            let mut table = builder.build();
            table.with(Style::modern_rounded());

            writeln!(out, "{table}").map_err(write_failed)
        }
    }
}
