//! Storefront Session
//!
//! The context object that owns the cart, orders and favorites of one
//! visitor, all sharing one store, one clock and one observer.

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    cart::{CartError, CartLoadReport, CartManager, NewCartItem},
    clock::Clock,
    events::{Notification, Page, StorefrontObserver},
    favorites::FavoritesManager,
    orders::{Order, OrderError, OrderManager, OrdersLoaded, StatusSchedule},
    store::KeyValueStore,
};

/// Errors from session-level flows.
#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError {
    /// Checkout needs at least one cart line.
    #[error("Your cart is empty! Go to catalog to add items first.")]
    EmptyCart,

    /// Reorder of an order that does not exist.
    #[error("order {0} not found")]
    UnknownOrder(String),

    /// Order creation failed.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Re-adding an item to the cart failed.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Session construction options.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Currency totals are reported in
    pub currency: &'static Currency,

    /// Seed demo orders into an empty order history
    pub seed_demo_orders: bool,

    /// Status simulation delays
    pub schedule: StatusSchedule,

    /// Seed for tracking numbers and delivery estimates; entropy when unset
    pub rng_seed: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            currency: iso::USD,
            seed_demo_orders: true,
            schedule: StatusSchedule::default(),
            rng_seed: None,
        }
    }
}

/// What [`Storefront::open`] restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRestore {
    /// Cart load outcome
    pub cart: CartLoadReport,

    /// Order load outcome
    pub orders: OrdersLoaded,

    /// Favorites restored
    pub favorites: usize,
}

/// Figures shown on the account page.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSummary {
    /// Orders placed
    pub orders: usize,

    /// Sum of every order's total
    pub total_spent: Money<'static, Currency>,

    /// Favorites saved
    pub favorites: usize,

    /// Units in the cart
    pub cart_items: u64,
}

/// One visitor's storefront state.
#[derive(Debug)]
pub struct Storefront {
    cart: CartManager,
    orders: OrderManager,
    favorites: FavoritesManager,
    observer: Arc<dyn StorefrontObserver>,
    currency: &'static Currency,
    restored: SessionRestore,
}

impl Storefront {
    /// Builds the managers and restores everything persisted in `store`.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn StorefrontObserver>,
        settings: SessionSettings,
    ) -> Self {
        let mut cart = CartManager::new(Arc::clone(&store), Arc::clone(&observer), settings.currency);

        let rng = settings
            .rng_seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        let mut orders =
            OrderManager::new(Arc::clone(&store), Arc::clone(&clock), Arc::clone(&observer))
                .with_rng(rng)
                .with_schedule(settings.schedule)
                .with_demo_seed(settings.seed_demo_orders);

        let mut favorites = FavoritesManager::new(store, clock, Arc::clone(&observer));

        let restored = SessionRestore {
            cart: cart.load(),
            orders: orders.load(),
            favorites: favorites.load(),
        };

        info!(
            cart_lines = restored.cart.kept,
            orders = orders.count(),
            favorites = restored.favorites,
            "session opened"
        );

        Self {
            cart,
            orders,
            favorites,
            observer,
            currency: settings.currency,
            restored,
        }
    }

    /// What was restored when the session opened.
    pub fn restored(&self) -> SessionRestore {
        self.restored
    }

    /// Turns the cart into an order and empties the cart.
    ///
    /// The order confirmation page becomes current, so later status changes
    /// are announced.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] when there is nothing to order.
    pub fn checkout(&mut self) -> Result<Order, CheckoutError> {
        if self.cart.is_empty() {
            warn!("checkout attempted with an empty cart");
            self.observer
                .on_notification(&Notification::error(CheckoutError::EmptyCart.to_string()));

            return Err(CheckoutError::EmptyCart);
        }

        let order = self.orders.create_order(self.cart.lines())?;

        self.cart.clear();
        self.orders.set_page(Page::OrderConfirmation);

        Ok(order)
    }

    /// Adds every line of a past order back into the cart.
    ///
    /// Returns the number of lines added.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownOrder`] for unknown ids, or
    /// [`CheckoutError::Cart`] if a stored line no longer validates.
    pub fn reorder(&mut self, order_id: &str) -> Result<usize, CheckoutError> {
        let items = self
            .orders
            .get(order_id)
            .map(|order| order.items.clone())
            .ok_or_else(|| CheckoutError::UnknownOrder(order_id.to_string()))?;

        for item in &items {
            let mut new_item = NewCartItem::new(item.id.clone(), item.price.to_major_f64())
                .name(item.name.clone())
                .image(item.image.clone())
                .qty(i64::from(item.qty));

            new_item.brand.clone_from(&item.brand);

            self.cart.add_item(new_item)?;
        }

        self.observer.on_notification(&Notification::success(format!(
            "{} item(s) added to cart!",
            items.len()
        )));
        self.orders.set_page(Page::Cart);

        Ok(items.len())
    }

    /// Figures for the account page.
    pub fn account_summary(&self) -> AccountSummary {
        AccountSummary {
            orders: self.orders.count(),
            total_spent: self.orders.total_spent(self.currency),
            favorites: self.favorites.count(),
            cart_items: self.cart.item_count(),
        }
    }

    /// Applies due order status transitions. Returns the number applied.
    pub fn tick(&mut self) -> usize {
        self.orders.tick()
    }

    /// Records which page is showing.
    pub fn set_page(&mut self, page: Page) {
        self.orders.set_page(page);
    }

    /// Currency totals are reported in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// The cart.
    pub fn cart(&self) -> &CartManager {
        &self.cart
    }

    /// The cart, mutably.
    pub fn cart_mut(&mut self) -> &mut CartManager {
        &mut self.cart
    }

    /// The order history.
    pub fn orders(&self) -> &OrderManager {
        &self.orders
    }

    /// The order history, mutably.
    pub fn orders_mut(&mut self) -> &mut OrderManager {
        &mut self.orders
    }

    /// The favorites set.
    pub fn favorites(&self) -> &FavoritesManager {
        &self.favorites
    }

    /// The favorites set, mutably.
    pub fn favorites_mut(&mut self) -> &mut FavoritesManager {
        &mut self.favorites
    }
}
