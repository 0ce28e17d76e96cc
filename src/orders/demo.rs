//! Demo orders
//!
//! Seeded into an empty order history so the order pages have something to
//! show. Every date is relative to the moment of seeding.

use jiff::Timestamp;

use crate::{
    cart::CartLine,
    catalog::WATCH_IMAGE,
    clock::shift_days,
    orders::{
        Order,
        status::{OrderStatus, StatusEntry},
    },
    prices::Price,
};

struct DemoOrder {
    id: &'static str,
    product_id: &'static str,
    name: &'static str,
    brand: &'static str,
    price: i64,
    ordered_days_ago: i64,
    expected_in_days: i64,
    tracking_number: &'static str,
    history_days_ago: &'static [i64],
}

const DEMO_ORDERS: [DemoOrder; 3] = [
    DemoOrder {
        id: "ORD-001",
        product_id: "audemars-piguet-royal-oak-gold",
        name: "Royal Oak Gold",
        brand: "Audemars Piguet",
        price: 45_000,
        ordered_days_ago: 15,
        expected_in_days: -10,
        tracking_number: "TLX123456789",
        history_days_ago: &[15, 14, 12, 10],
    },
    DemoOrder {
        id: "ORD-002",
        product_id: "rolex-submariner",
        name: "Submariner",
        brand: "Rolex",
        price: 12_500,
        ordered_days_ago: 5,
        expected_in_days: 3,
        tracking_number: "TLX987654321",
        history_days_ago: &[5, 4, 2],
    },
    DemoOrder {
        id: "ORD-003",
        product_id: "omega-seamaster",
        name: "Seamaster",
        brand: "Omega",
        price: 6_500,
        ordered_days_ago: 2,
        expected_in_days: 7,
        tracking_number: "TLX567890123",
        history_days_ago: &[2, 1],
    },
];

impl DemoOrder {
    fn build(&self, now: Timestamp) -> Order {
        let price = Price::from_major(self.price);

        let status_history: Vec<StatusEntry> = OrderStatus::ALL
            .iter()
            .zip(self.history_days_ago)
            .map(|(&status, &days_ago)| StatusEntry::standard(status, shift_days(now, -days_ago)))
            .collect();

        let status = status_history
            .last()
            .map_or(OrderStatus::Confirmed, |entry| entry.status);

        let delivered_date = status_history
            .iter()
            .find(|entry| entry.status == OrderStatus::Delivered)
            .map(|entry| entry.at);

        Order {
            id: self.id.to_string(),
            items: vec![CartLine {
                id: self.product_id.to_string(),
                name: self.name.to_string(),
                price,
                qty: 1,
                image: WATCH_IMAGE.to_string(),
                brand: Some(self.brand.to_string()),
            }],
            total: price,
            order_date: shift_days(now, -self.ordered_days_ago),
            status,
            expected_delivery: shift_days(now, self.expected_in_days),
            delivered_date,
            tracking_number: self.tracking_number.to_string(),
            status_history,
        }
    }
}

/// The three demo orders, newest first.
pub fn demo_orders(now: Timestamp) -> Vec<Order> {
    DEMO_ORDERS.iter().map(|demo| demo.build(now)).collect()
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn seeds_three_orders_in_varied_states() -> TestResult {
        let now: Timestamp = "2025-06-20T12:00:00Z".parse()?;

        let orders = demo_orders(now);

        let summary: Vec<(&str, OrderStatus, usize)> = orders
            .iter()
            .map(|order| (order.id.as_str(), order.status, order.status_history.len()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("ORD-001", OrderStatus::Delivered, 4),
                ("ORD-002", OrderStatus::InTransit, 3),
                ("ORD-003", OrderStatus::Processing, 2),
            ]
        );

        Ok(())
    }

    #[test]
    fn delivered_demo_order_is_stamped() -> TestResult {
        let now: Timestamp = "2025-06-20T12:00:00Z".parse()?;
        let orders = demo_orders(now);

        let delivered = orders.first().ok_or("no demo orders")?;

        assert_eq!(delivered.delivered_date, Some("2025-06-10T12:00:00Z".parse::<Timestamp>()?));
        assert_eq!(delivered.expected_delivery, "2025-06-10T12:00:00Z".parse::<Timestamp>()?);
        assert_eq!(delivered.total, Price::from_major(45_000));
        assert!(orders.iter().skip(1).all(|order| order.delivered_date.is_none()));

        Ok(())
    }
}
