use std::io::{self, Write};

use clap::{Args, Subcommand};
use storefront::{
    config::StorefrontConfig,
    events::Page,
    receipt::{self, OrderReceipt},
};
use tabled::{builder::Builder, settings::Style};

use super::{open_session, write_failed};

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// List orders, newest first
    List,

    /// Show one order with its status history
    Show(OrderArgs),

    /// Put an order's items back in the cart
    Reorder(OrderArgs),

    /// Delete the whole order history
    Clear,
}

#[derive(Debug, Args)]
struct OrderArgs {
    /// Order id, e.g. ORD-001
    id: String,
}

pub(crate) fn run(command: OrdersCommand, config: &StorefrontConfig) -> Result<(), String> {
    let mut session = open_session(config)?;
    let currency = session.currency();
    let mut out = io::stdout().lock();

    match command.command {
        OrdersSubcommand::List => {
            let orders = session.orders().all();

            if orders.is_empty() {
                return writeln!(out, "no orders yet").map_err(write_failed);
            }

            let mut builder = Builder::default();
            builder.push_record(["Order", "Date", "Items", "Total", "Status"]);

            for order in orders {
                builder.push_record([
                    order.id.clone(),
                    order.order_date.strftime("%Y-%m-%d").to_string(),
                    order.item_count().to_string(),
                    order.total.to_money(currency).to_string(),
                    order.status.label().to_string(),
                ]);
            }

            let mut table = builder.build();
            table.with(Style::modern_rounded());

            writeln!(out, "{table}").map_err(write_failed)
        }
        OrdersSubcommand::Show(args) => {
            let order = session
                .orders()
                .get(&args.id)
                .ok_or_else(|| format!("no order with id {}", args.id))?;

            OrderReceipt::new(order, currency)
                .write_to(out)
                .map_err(|error| error.to_string())
        }
        OrdersSubcommand::Reorder(args) => {
            session
                .reorder(&args.id)
                .map_err(|error| format!("failed to reorder: {error}"))?;

            receipt::write_cart(out, session.cart().lines(), currency)
                .map_err(|error| error.to_string())
        }
        OrdersSubcommand::Clear => {
            session.orders_mut().clear_all();

            writeln!(out, "order history cleared").map_err(write_failed)
        }
    }
}

pub(crate) fn checkout(config: &StorefrontConfig) -> Result<(), String> {
    let mut session = open_session(config)?;

    let order = session
        .checkout()
        .map_err(|error| format!("checkout failed: {error}"))?;

    OrderReceipt::new(&order, session.currency())
        .write_to(io::stdout().lock())
        .map_err(|error| error.to_string())
}

/// Catches up on status transitions that fell due while no process was running.
pub(crate) fn tick(config: &StorefrontConfig) -> Result<(), String> {
    let mut session = open_session(config)?;

    session.set_page(Page::Orders);

    let queued = session.orders_mut().resume_status_updates();
    let applied = session.tick();

    let mut out = io::stdout().lock();

    writeln!(out, "applied {applied} of {queued} pending status update(s)").map_err(write_failed)?;

    if let Some(due) = session.orders().next_transition_due() {
        writeln!(out, "next update due {}", due.strftime("%Y-%m-%d %H:%M UTC"))
            .map_err(write_failed)?;
    }

    Ok(())
}
