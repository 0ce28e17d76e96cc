use std::io::{self, Write};

use clap::{Args, Subcommand};
use storefront::{
    catalog::{CatalogFilter, PriceBand, Product},
    config::StorefrontConfig,
};
use tabled::{builder::Builder, settings::Style};

use super::{load_catalog, write_failed};

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// List every watch
    List,

    /// Show one watch with its specifications
    Show(ShowArgs),

    /// List watches matching filters
    Filter(FilterArgs),
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Product id
    id: String,
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Text to look for in name, brand or description
    #[arg(long)]
    search: Option<String>,

    /// Exact brand name
    #[arg(long)]
    brand: Option<String>,

    /// Price band: 0-10000, 10000-25000, 25000-50000 or 50000+
    #[arg(long)]
    price: Option<PriceBand>,
}

pub(crate) fn run(command: CatalogCommand, config: &StorefrontConfig) -> Result<(), String> {
    let catalog = load_catalog(config)?;
    let currency = config.currency.currency();

    let products: Vec<&Product> = match command.command {
        CatalogSubcommand::List => catalog.products().iter().collect(),
        CatalogSubcommand::Filter(args) => catalog.filter(&CatalogFilter {
            search: args.search,
            brand: args.brand,
            price: args.price,
        }),
        CatalogSubcommand::Show(args) => {
            let product = catalog
                .get(&args.id)
                .ok_or_else(|| format!("no product with id {}", args.id))?;

            return show(product, config);
        }
    };

    let mut out = io::stdout().lock();

    if products.is_empty() {
        writeln!(out, "no watches match").map_err(write_failed)?;
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["Id", "Brand", "Model", "Price"]);

    for product in products {
        builder.push_record([
            product.id.clone(),
            product.brand.clone(),
            product.name.clone(),
            product.price.to_money(currency).to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());

    writeln!(out, "{table}").map_err(write_failed)
}

fn show(product: &Product, config: &StorefrontConfig) -> Result<(), String> {
    let mut out = io::stdout().lock();

    writeln!(out, "{} {}", product.brand, product.name).map_err(write_failed)?;
    writeln!(
        out,
        "{} · {}",
        product.price.to_money(config.currency.currency()),
        product.stock
    )
    .map_err(write_failed)?;
    writeln!(out, "\n{}\n", product.description).map_err(write_failed)?;

    let mut builder = Builder::default();

    for spec in &product.specifications {
        builder.push_record([spec.label.clone(), spec.value.clone()]);
    }

    let mut table = builder.build();
    table.with(Style::blank());

    writeln!(out, "{table}").map_err(write_failed)
}
