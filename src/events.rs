//! Change Notifications
//!
//! Managers report every state change through a [`StorefrontObserver`]. A
//! presentation layer re-renders from these callbacks; the storefront itself
//! never renders anything.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use tracing::{error, info};

use crate::{cart::CartLine, favorites::Favorite, orders::Order};

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Neutral information
    Info,

    /// A requested action succeeded
    Success,

    /// A requested action failed
    Error,
}

/// A transient, user-facing message (a toast in the web storefront).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity
    pub kind: NotificationKind,

    /// Message text
    pub message: String,
}

impl Notification {
    /// Creates an informational notification.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }

    /// Creates a success notification.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    /// Creates an error notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// The page currently shown by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    /// Landing page
    #[default]
    Home,

    /// Collection listing
    Collection,

    /// Single product
    Product,

    /// Cart
    Cart,

    /// Order history
    Orders,

    /// Post-checkout confirmation
    OrderConfirmation,

    /// Account overview
    Account,

    /// Favorites list
    Favorites,
}

impl Page {
    /// Whether order status notifications are shown on this page.
    pub fn is_order_facing(self) -> bool {
        matches!(self, Self::Orders | Self::OrderConfirmation)
    }
}

/// Receives state change callbacks from the managers.
///
/// Every method has a no-op default so implementors only override what they
/// render.
pub trait StorefrontObserver: Send + Sync + fmt::Debug {
    /// The cart contents changed.
    fn on_cart_changed(&self, _lines: &[CartLine]) {}

    /// An order was created, transitioned or the list was cleared.
    fn on_orders_changed(&self, _orders: &[Order]) {}

    /// The favorites set changed.
    fn on_favorites_changed(&self, _favorites: &[Favorite]) {}

    /// A transient notification should be shown.
    fn on_notification(&self, _notification: &Notification) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StorefrontObserver for NoopObserver {}

/// Observer that writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl StorefrontObserver for TracingObserver {
    fn on_notification(&self, notification: &Notification) {
        match notification.kind {
            NotificationKind::Error => error!(message = %notification.message, "notification"),
            NotificationKind::Info | NotificationKind::Success => {
                info!(message = %notification.message, "notification");
            }
        }
    }
}

/// A recorded observer callback.
#[derive(Debug, Clone, PartialEq)]
pub enum StorefrontEvent {
    /// Cart snapshot after the change
    CartChanged(Vec<CartLine>),

    /// Order ids after the change, newest first
    OrdersChanged(Vec<String>),

    /// Favorite ids after the change
    FavoritesChanged(Vec<String>),

    /// Notification shown
    Notified(Notification),
}

/// Observer that records every callback, for tests and replay.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<StorefrontEvent>>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn events(&self) -> Vec<StorefrontEvent> {
        self.lock().clone()
    }

    /// Returns the recorded notifications in order.
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                StorefrontEvent::Notified(notification) => Some(notification.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StorefrontEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: StorefrontEvent) {
        self.lock().push(event);
    }
}

impl StorefrontObserver for RecordingObserver {
    fn on_cart_changed(&self, lines: &[CartLine]) {
        self.record(StorefrontEvent::CartChanged(lines.to_vec()));
    }

    fn on_orders_changed(&self, orders: &[Order]) {
        self.record(StorefrontEvent::OrdersChanged(
            orders.iter().map(|order| order.id.clone()).collect(),
        ));
    }

    fn on_favorites_changed(&self, favorites: &[Favorite]) {
        self.record(StorefrontEvent::FavoritesChanged(
            favorites.iter().map(|favorite| favorite.id.clone()).collect(),
        ));
    }

    fn on_notification(&self, notification: &Notification) {
        self.record(StorefrontEvent::Notified(notification.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_order_pages_are_order_facing() {
        assert!(Page::Orders.is_order_facing());
        assert!(Page::OrderConfirmation.is_order_facing());
        assert!(!Page::Home.is_order_facing());
        assert!(!Page::Cart.is_order_facing());
    }

    #[test]
    fn recording_observer_shares_log_between_clones() {
        let observer = RecordingObserver::new();
        let handle = observer.clone();

        handle.on_notification(&Notification::success("Saved"));
        handle.on_cart_changed(&[]);

        assert_eq!(observer.events().len(), 2);
        assert_eq!(observer.notifications(), vec![Notification::success("Saved")]);

        observer.clear();

        assert!(handle.events().is_empty());
    }

    #[test]
    fn noop_observer_accepts_everything() {
        let observer = NoopObserver;

        observer.on_cart_changed(&[]);
        observer.on_orders_changed(&[]);
        observer.on_favorites_changed(&[]);
        observer.on_notification(&Notification::error("ignored"));
    }
}
