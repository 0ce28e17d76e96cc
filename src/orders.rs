//! Orders
//!
//! Placed orders, newest first, with a simulated delivery lifecycle. Status
//! changes are queued on a [`TimerQueue`] and applied by [`OrderManager::tick`]
//! against the injected [`Clock`].

use std::sync::Arc;

use jiff::Timestamp;
use rand::{SeedableRng, rngs::StdRng};
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    cart::CartLine,
    clock::{Clock, shift},
    events::{Notification, Page, StorefrontObserver},
    prices::Price,
    pricing::{item_count, lines_total},
    schedule::TimerQueue,
    store::{KeyValueStore, Loaded, ORDERS_KEY, decode_entries, forget, load_json, persist},
};

pub mod demo;
pub mod status;
pub mod tracking;

pub use demo::demo_orders;
pub use status::{OrderStatus, StatusEntry, StatusSchedule, UnknownStatus};

/// Number of orders shown in "recent orders" previews.
pub const RECENT_ORDERS: usize = 3;

/// Errors related to order creation and status transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// No order has the given id.
    #[error("order {0} not found")]
    NotFound(String),

    /// An order needs at least one line.
    #[error("cannot create an order without items")]
    EmptyOrder,

    /// Statuses only move forward through the lifecycle.
    #[error("order {id} cannot move from {from} to {to}")]
    NotForward {
        /// Order id
        id: String,

        /// Current status
        from: OrderStatus,

        /// Requested status
        to: OrderStatus,
    },
}

/// A placed order.
///
/// `items` and `total` are a snapshot taken at creation and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// `ORD-` followed by a zero-padded sequence number
    pub id: String,

    /// Lines as they were in the cart
    pub items: Vec<CartLine>,

    /// Sum of price × quantity over `items`
    pub total: Price,

    /// When the order was placed
    pub order_date: Timestamp,

    /// Current status
    pub status: OrderStatus,

    /// Delivery estimate
    pub expected_delivery: Timestamp,

    /// When the order was delivered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_date: Option<Timestamp>,

    /// Carrier tracking number
    pub tracking_number: String,

    /// Every status reached, oldest first
    #[serde(default)]
    pub status_history: Vec<StatusEntry>,
}

impl Order {
    /// Total units across the order's lines.
    pub fn item_count(&self) -> u64 {
        item_count(&self.items)
    }

    /// The most recent history entry.
    pub fn latest_entry(&self) -> Option<&StatusEntry> {
        self.status_history.last()
    }
}

/// A queued status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransition {
    /// Order to update
    pub order_id: String,

    /// Status to apply
    pub status: OrderStatus,
}

/// Where [`OrderManager::load`] got its orders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdersLoaded {
    /// Restored from the store
    Stored(usize),

    /// Restored from the store after dropping entries that did not decode
    Repaired {
        /// Orders kept
        kept: usize,

        /// Entries dropped
        dropped: usize,
    },

    /// Nothing was stored; demo orders were written
    Seeded,

    /// Nothing usable was stored and seeding is disabled or not applicable
    Empty,

    /// The store could not be read; the in-memory orders were kept
    Unavailable,
}

/// Owns the order history and its pending status transitions.
#[derive(Debug)]
pub struct OrderManager {
    orders: Vec<Order>,
    timers: TimerQueue<PendingTransition>,
    schedule: StatusSchedule,
    page: Page,
    seed_demo_orders: bool,
    rng: StdRng,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn StorefrontObserver>,
}

impl OrderManager {
    /// Create an empty order manager. Call [`OrderManager::load`] to restore persisted orders.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn StorefrontObserver>,
    ) -> Self {
        Self {
            orders: Vec::new(),
            timers: TimerQueue::new(),
            schedule: StatusSchedule::default(),
            page: Page::default(),
            seed_demo_orders: true,
            rng: StdRng::from_entropy(),
            store,
            clock,
            observer,
        }
    }

    /// Use a specific random source for tracking numbers and delivery estimates.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Use a different status simulation schedule.
    #[must_use]
    pub fn with_schedule(mut self, schedule: StatusSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Whether [`OrderManager::load`] seeds demo orders into an empty history.
    #[must_use]
    pub fn with_demo_seed(mut self, seed: bool) -> Self {
        self.seed_demo_orders = seed;
        self
    }

    /// Replaces the in-memory orders with the persisted ones.
    ///
    /// Pending transitions are discarded. Stored entries that do not decode
    /// are dropped and the remaining history is written back. Demo orders are
    /// seeded only when nothing is stored at all, unless seeding is disabled.
    /// A store that cannot be read leaves the in-memory orders untouched.
    pub fn load(&mut self) -> OrdersLoaded {
        let outcome = match load_json::<Vec<Value>>(self.store.as_ref(), ORDERS_KEY) {
            Loaded::Value(entries) => {
                let (orders, dropped) = decode_entries::<Order>(ORDERS_KEY, entries);
                self.orders = orders;

                if dropped == 0 {
                    OrdersLoaded::Stored(self.orders.len())
                } else {
                    warn!(kept = self.orders.len(), dropped, "rewriting cleaned order history");
                    self.save();

                    OrdersLoaded::Repaired {
                        kept: self.orders.len(),
                        dropped,
                    }
                }
            }
            Loaded::Missing if self.seed_demo_orders => {
                self.orders = demo::demo_orders(self.clock.now());
                self.save();
                info!(count = self.orders.len(), "seeded demo orders");
                OrdersLoaded::Seeded
            }
            Loaded::Missing | Loaded::Corrupt => {
                self.orders = Vec::new();
                OrdersLoaded::Empty
            }
            Loaded::Unavailable => return OrdersLoaded::Unavailable,
        };

        self.timers = TimerQueue::new();
        self.observer.on_orders_changed(&self.orders);

        outcome
    }

    /// Places an order from a snapshot of cart lines and schedules its status simulation.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::EmptyOrder`] if `lines` is empty.
    pub fn create_order(&mut self, lines: &[CartLine]) -> Result<Order, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let now = self.clock.now();

        let order = Order {
            id: self.next_order_id(),
            items: lines.to_vec(),
            total: lines_total(lines),
            order_date: now,
            status: OrderStatus::Confirmed,
            expected_delivery: tracking::expected_delivery(&mut self.rng, now),
            delivered_date: None,
            tracking_number: tracking::tracking_number(&mut self.rng),
            status_history: vec![StatusEntry::standard(OrderStatus::Confirmed, now)],
        };

        self.orders.insert(0, order.clone());

        info!(id = %order.id, total = %order.total, items = order.items.len(), "order created");
        self.commit();
        self.schedule_status_updates(&order.id);

        Ok(order)
    }

    /// Queues every scheduled status for `order_id`, relative to now.
    pub fn schedule_status_updates(&mut self, order_id: &str) {
        let now = self.clock.now();

        for &(status, delay) in self.schedule.steps() {
            self.timers.schedule(
                shift(now, delay),
                PendingTransition {
                    order_id: order_id.to_string(),
                    status,
                },
            );
        }

        debug!(order_id, pending = self.timers.len(), "status updates scheduled");
    }

    /// Re-queues the remaining transitions of every undelivered order, relative to its order date.
    ///
    /// Pending transitions live only as long as the manager, so a new process
    /// calls this to continue the simulation. Returns the number queued.
    pub fn resume_status_updates(&mut self) -> usize {
        let mut queued = 0;

        for order in &self.orders {
            if order.status.is_terminal() {
                continue;
            }

            for &(status, delay) in self.schedule.steps() {
                if status > order.status {
                    self.timers.schedule(
                        shift(order.order_date, delay),
                        PendingTransition {
                            order_id: order.id.clone(),
                            status,
                        },
                    );
                    queued += 1;
                }
            }
        }

        debug!(queued, "status updates resumed");

        queued
    }

    /// Moves an order to `status`, appending to its history.
    ///
    /// `description` defaults to "Order status updated to <status>". When the
    /// current page is order-facing a status notification is emitted.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::NotFound`] for unknown ids and
    /// [`OrderError::NotForward`] when `status` is not later than the current
    /// one. The order is unchanged in both cases.
    pub fn update_status(
        &mut self,
        order_id: &str,
        status: OrderStatus,
        description: Option<&str>,
        delivered_date: Option<Timestamp>,
    ) -> Result<(), OrderError> {
        let now = self.clock.now();

        let order = self
            .orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

        if status <= order.status {
            warn!(order_id, from = %order.status, to = %status, "rejected status transition");

            return Err(OrderError::NotForward {
                id: order_id.to_string(),
                from: order.status,
                to: status,
            });
        }

        order.status = status;

        if let Some(delivered_date) = delivered_date {
            order.delivered_date = Some(delivered_date);
        }

        order.status_history.push(StatusEntry {
            status,
            at: now,
            description: description.map_or_else(
                || format!("Order status updated to {status}"),
                str::to_string,
            ),
        });

        info!(order_id, %status, "order status updated");
        self.commit();

        if self.page.is_order_facing() {
            self.observer.on_notification(&Notification::info(format!(
                "Order {order_id} status updated to: {status}"
            )));
        }

        Ok(())
    }

    /// Applies every queued transition that is due, in due order.
    ///
    /// Delivered transitions stamp the delivery date. Transitions for orders
    /// that no longer exist, or that have already moved past the queued
    /// status, are dropped. Returns the number applied.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now();
        let mut applied = 0;

        for pending in self.timers.drain_due(now) {
            let delivered_date = (pending.status == OrderStatus::Delivered).then_some(now);

            match self.update_status(
                &pending.order_id,
                pending.status,
                Some(pending.status.description()),
                delivered_date,
            ) {
                Ok(()) => applied += 1,
                Err(error) => debug!(%error, "dropping queued transition"),
            }
        }

        applied
    }

    /// Up to `n` of the newest orders.
    pub fn recent(&self, n: usize) -> &[Order] {
        self.orders.get(..n.min(self.orders.len())).unwrap_or(&[])
    }

    /// Look up an order by id.
    pub fn get(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == order_id)
    }

    /// Every order, newest first.
    pub fn all(&self) -> &[Order] {
        &self.orders
    }

    /// Number of orders.
    pub fn count(&self) -> usize {
        self.orders.len()
    }

    /// Sum of every order's total.
    pub fn total_spent(&self, currency: &'static Currency) -> Money<'static, Currency> {
        self.orders
            .iter()
            .map(|order| order.total)
            .sum::<Price>()
            .to_money(currency)
    }

    /// Deletes every order and the persisted entry.
    pub fn clear_all(&mut self) {
        self.orders.clear();
        forget(self.store.as_ref(), ORDERS_KEY);

        info!("all orders cleared");
        self.observer.on_orders_changed(&self.orders);
    }

    /// Records which page is showing, which decides whether status notifications are emitted.
    pub fn set_page(&mut self, page: Page) {
        self.page = page;
    }

    /// The page last recorded with [`OrderManager::set_page`].
    pub fn page(&self) -> Page {
        self.page
    }

    /// Number of queued transitions.
    pub fn pending_transitions(&self) -> usize {
        self.timers.len()
    }

    /// When the next queued transition becomes due.
    pub fn next_transition_due(&self) -> Option<Timestamp> {
        self.timers.next_due()
    }

    fn next_order_id(&self) -> String {
        let mut sequence = self.orders.len() + 1;

        loop {
            let id = format!("ORD-{sequence:03}");

            if self.get(&id).is_none() {
                return id;
            }

            sequence += 1;
        }
    }

    fn save(&self) -> bool {
        persist(self.store.as_ref(), ORDERS_KEY, &self.orders)
    }

    fn commit(&self) {
        self.save();
        self.observer.on_orders_changed(&self.orders);
    }
}
