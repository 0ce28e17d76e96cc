//! Receipt
//!
//! Console rendering of cart lines and placed orders.

use std::io;

use jiff::Timestamp;
use rusty_money::iso::Currency;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{cart::CartLine, orders::Order, pricing};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// IO error
    #[error("IO error")]
    IO(#[from] io::Error),
}

/// Printable view of a placed order.
#[derive(Debug, Clone, Copy)]
pub struct OrderReceipt<'a> {
    order: &'a Order,
    currency: &'static Currency,
}

impl<'a> OrderReceipt<'a> {
    /// Create a receipt for `order`, pricing in `currency`.
    pub fn new(order: &'a Order, currency: &'static Currency) -> Self {
        Self { order, currency }
    }

    /// Writes the line table, order details and status history.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let order = self.order;

        writeln!(out, "\nOrder {}", order.id)?;

        write_lines_table(&mut out, &order.items, self.currency)?;

        let mut details = Builder::default();

        details.push_record(["Status".to_string(), order.status.label().to_string()]);
        details.push_record([
            "Total".to_string(),
            order.total.to_money(self.currency).to_string(),
        ]);
        details.push_record(["Ordered".to_string(), format_date(order.order_date)]);
        details.push_record([
            "Expected delivery".to_string(),
            format_date(order.expected_delivery),
        ]);

        if let Some(delivered) = order.delivered_date {
            details.push_record(["Delivered".to_string(), format_date(delivered)]);
        }

        details.push_record(["Tracking".to_string(), order.tracking_number.clone()]);

        let mut details = details.build();
        details.with(Style::blank());
        details.modify(Columns::first(), Color::BOLD);

        writeln!(out, "{details}")?;

        let mut history = Builder::default();
        history.push_record(["Date", "Status", "Details"]);

        for entry in &order.status_history {
            history.push_record([
                format_date(entry.at),
                entry.status.label().to_string(),
                entry.description.clone(),
            ]);
        }

        let mut history = history.build();
        history.with(Style::modern_rounded());
        history.modify(Rows::first(), Color::BOLD);

        writeln!(out, "\n{history}")?;

        Ok(())
    }
}

/// Writes cart lines with a total row.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_cart(
    mut out: impl io::Write,
    lines: &[CartLine],
    currency: &'static Currency,
) -> Result<(), ReceiptError> {
    if lines.is_empty() {
        writeln!(out, "Your cart is empty.")?;

        return Ok(());
    }

    write_lines_table(&mut out, lines, currency)?;

    writeln!(
        out,
        " {} item(s), total {}",
        pricing::item_count(lines),
        pricing::lines_total(lines).to_money(currency)
    )?;

    Ok(())
}

fn write_lines_table(
    out: &mut impl io::Write,
    lines: &[CartLine],
    currency: &'static Currency,
) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();

    builder.push_record(["", "Item", "Brand", "Qty", "Unit Price", "Line Total"]);

    for (idx, line) in lines.iter().enumerate() {
        builder.push_record([
            format!("#{}", idx + 1),
            line.name.clone(),
            line.brand.clone().unwrap_or_default(),
            line.qty.to_string(),
            line.price.to_money(currency).to_string(),
            line.line_total().to_money(currency).to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..6), Alignment::right());

    writeln!(out, "\n{table}")?;

    Ok(())
}

fn format_date(at: Timestamp) -> String {
    at.strftime("%Y-%m-%d %H:%M UTC").to_string()
}
