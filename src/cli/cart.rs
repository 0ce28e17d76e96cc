use std::{
    io::{self, Write},
    sync::Arc,
};

use clap::{Args, Subcommand};
use storefront::{
    catalog::{Customization, DiamondCarat, DiamondType, GoldCarat},
    config::StorefrontConfig,
    receipt,
    remote::{AddToCartRequest, HttpRemoteCart, RemoteCart, ServerCartManager},
};
use tabled::{builder::Builder, settings::Style};

use super::{ConsoleObserver, load_catalog, open_session, write_failed};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Show the cart
    Show,

    /// Add a watch from the catalog
    Add(AddArgs),

    /// Remove a line
    Remove(LineArgs),

    /// Set a line's quantity; zero or less removes it
    Set(SetArgs),

    /// Empty the cart
    Clear,
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Product id
    product_id: String,

    /// Units to add
    #[arg(long, default_value_t = 1)]
    qty: u32,

    /// Gold purity (14k, 18k, 22k, 24k)
    #[arg(long, default_value_t = GoldCarat::default())]
    gold_carat: GoldCarat,

    /// Diamond setting (none, artificial, real)
    #[arg(long, default_value_t = DiamondType::default())]
    diamond_type: DiamondType,

    /// Diamond weight for real diamonds (0.25 to 2.0)
    #[arg(long, default_value_t = DiamondCarat::default())]
    diamond_carat: DiamondCarat,
}

impl AddArgs {
    fn customization(&self) -> Customization {
        Customization {
            gold_carat: self.gold_carat,
            diamond_type: self.diamond_type,
            diamond_carat: self.diamond_carat,
        }
    }
}

#[derive(Debug, Args)]
struct LineArgs {
    /// Line id: the product id locally, the server line id with a remote cart
    id: String,
}

#[derive(Debug, Args)]
struct SetArgs {
    /// Line id: the product id locally, the server line id with a remote cart
    id: String,

    /// New quantity
    #[arg(allow_negative_numbers = true)]
    qty: i64,
}

pub(crate) async fn run(command: CartCommand, config: &StorefrontConfig) -> Result<(), String> {
    match &config.remote_cart_url {
        Some(url) => run_remote(command, config, url).await,
        None => run_local(command, config),
    }
}

fn run_local(command: CartCommand, config: &StorefrontConfig) -> Result<(), String> {
    let mut session = open_session(config)?;

    match command.command {
        CartSubcommand::Show => {}
        CartSubcommand::Add(args) => {
            let catalog = load_catalog(config)?;
            let product = catalog
                .get(&args.product_id)
                .ok_or_else(|| format!("no product with id {}", args.product_id))?;

            session
                .cart_mut()
                .add_item(product.to_cart_item(args.qty, &args.customization()))
                .map_err(|error| format!("failed to add to cart: {error}"))?;
        }
        CartSubcommand::Remove(args) => {
            if !session.cart_mut().remove_item(&args.id) {
                return Err(format!("{} is not in the cart", args.id));
            }
        }
        CartSubcommand::Set(args) => {
            if !session.cart_mut().update_quantity(&args.id, args.qty) {
                return Err(format!("{} is not in the cart", args.id));
            }
        }
        CartSubcommand::Clear => session.cart_mut().clear(),
    }

    receipt::write_cart(io::stdout().lock(), session.cart().lines(), session.currency())
        .map_err(|error| error.to_string())
}

async fn run_remote(command: CartCommand, config: &StorefrontConfig, url: &str) -> Result<(), String> {
    let mut client = HttpRemoteCart::new(url);

    if let Some(token) = &config.csrf_token {
        client = client.with_csrf_token(token.clone());
    }

    let mut cart = ServerCartManager::new(client, Arc::new(ConsoleObserver));

    let outcome = match command.command {
        CartSubcommand::Show => Ok(()),
        CartSubcommand::Add(args) => {
            let catalog = load_catalog(config)?;
            let product = catalog
                .get(&args.product_id)
                .ok_or_else(|| format!("no product with id {}", args.product_id))?;

            cart.add(AddToCartRequest::customized(
                product,
                args.qty,
                &args.customization(),
            ))
            .await
        }
        CartSubcommand::Remove(args) => cart.remove(server_line_id(&args.id)?).await,
        CartSubcommand::Set(args) => {
            cart.update_quantity(server_line_id(&args.id)?, args.qty)
                .await
        }
        CartSubcommand::Clear => cart.clear().await,
    };

    outcome.map_err(|error| format!("server cart request failed: {error}"))?;

    let snapshot = cart.refresh().await;

    write_remote_cart(snapshot, config)
}

fn server_line_id(raw: &str) -> Result<u64, String> {
    raw.parse()
        .map_err(|error| format!("server cart line ids are numeric, got {raw}: {error}"))
}

fn write_remote_cart(cart: &RemoteCart, config: &StorefrontConfig) -> Result<(), String> {
    let currency = config.currency.currency();
    let mut out = io::stdout().lock();

    if cart.is_empty() {
        return writeln!(out, "Your cart is empty.").map_err(write_failed);
    }

    let mut builder = Builder::default();
    builder.push_record(["Line", "Item", "Brand", "Qty", "Line Total"]);

    for item in &cart.items {
        builder.push_record([
            item.id.to_string(),
            item.product.name.clone(),
            item.product.brand.clone(),
            item.quantity.to_string(),
            item.total_price.to_money(currency).to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());

    writeln!(out, "{table}").map_err(write_failed)?;
    writeln!(
        out,
        " {} item(s), total {}",
        cart.total_items,
        cart.total_price.to_money(currency)
    )
    .map_err(write_failed)
}
