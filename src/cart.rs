//! Cart

use std::sync::Arc;

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    events::StorefrontObserver,
    pricing::{item_count, lines_total},
    store::{CART_KEY, KeyValueStore, Loaded, load_json, persist},
};

pub mod line;

pub use line::{CartLine, FALLBACK_IMAGE, LineError, NewCartItem, UNKNOWN_PRODUCT};

/// Errors related to cart mutations.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// The offered item failed validation.
    #[error("invalid cart item: {0}")]
    InvalidItem(#[from] LineError),
}

/// What [`CartManager::load`] found in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartLoadReport {
    /// Lines kept
    pub kept: usize,

    /// Entries dropped as invalid
    pub dropped: usize,

    /// Entries folded into an earlier line with the same id
    pub merged: usize,

    /// Whether the stored value could not be decoded at all
    pub reset: bool,

    /// Whether the store could not be read; the in-memory cart was kept
    pub unavailable: bool,
}

impl CartLoadReport {
    /// Whether the cleaned cart had to be written back.
    pub fn rewritten(&self) -> bool {
        self.reset || self.dropped > 0 || self.merged > 0
    }
}

/// The active cart.
///
/// Lines keep insertion order and are unique by id. Every mutation is
/// persisted under [`CART_KEY`] and reported to the observer.
#[derive(Debug)]
pub struct CartManager {
    lines: Vec<CartLine>,
    store: Arc<dyn KeyValueStore>,
    observer: Arc<dyn StorefrontObserver>,
    currency: &'static Currency,
}

impl CartManager {
    /// Create an empty cart. Call [`CartManager::load`] to restore persisted lines.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        observer: Arc<dyn StorefrontObserver>,
        currency: &'static Currency,
    ) -> Self {
        Self {
            lines: Vec::new(),
            store,
            observer,
            currency,
        }
    }

    /// Replaces the in-memory cart with the persisted one.
    ///
    /// Invalid entries are dropped and duplicate ids merged; when either
    /// happens, or the stored value is unreadable, the cleaned cart is
    /// persisted straight back. A store that cannot be read leaves both the
    /// in-memory cart and the stored value untouched.
    pub fn load(&mut self) -> CartLoadReport {
        let mut report = CartLoadReport::default();

        let entries = match load_json::<Vec<Value>>(self.store.as_ref(), CART_KEY) {
            Loaded::Missing => Vec::new(),
            Loaded::Value(entries) => entries,
            Loaded::Corrupt => {
                report.reset = true;
                Vec::new()
            }
            Loaded::Unavailable => {
                report.unavailable = true;
                report.kept = self.lines.len();
                return report;
            }
        };

        let mut lines: Vec<CartLine> = Vec::with_capacity(entries.len());
        let mut positions: FxHashMap<String, usize> = FxHashMap::default();

        for entry in &entries {
            let line = match CartLine::from_stored(entry) {
                Ok(line) => line,
                Err(error) => {
                    warn!(%error, "dropping invalid stored cart line");
                    report.dropped += 1;
                    continue;
                }
            };

            match positions.get(&line.id).and_then(|&idx| lines.get_mut(idx)) {
                Some(existing) => {
                    existing.qty = existing.qty.saturating_add(line.qty);
                    report.merged += 1;
                }
                None => {
                    positions.insert(line.id.clone(), lines.len());
                    lines.push(line);
                }
            }
        }

        report.kept = lines.len();
        self.lines = lines;

        if report.rewritten() {
            warn!(
                dropped = report.dropped,
                merged = report.merged,
                reset = report.reset,
                "rewriting cleaned cart"
            );
            self.save();
        }

        self.observer.on_cart_changed(&self.lines);

        report
    }

    /// Adds an item, incrementing the quantity of an existing line with the same id.
    ///
    /// Returns the line as it stands after the addition.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidItem`] if the id is blank or the price is
    /// not a finite positive number.
    pub fn add_item(&mut self, item: NewCartItem) -> Result<CartLine, CartError> {
        let incoming = item.into_line()?;

        let line = match self.lines.iter_mut().find(|line| line.id == incoming.id) {
            Some(existing) => {
                existing.qty = existing.qty.saturating_add(incoming.qty);

                if existing.brand.is_none() {
                    existing.brand = incoming.brand;
                }

                existing.clone()
            }
            None => {
                self.lines.push(incoming.clone());
                incoming
            }
        };

        debug!(id = %line.id, qty = line.qty, "cart line added");
        self.commit();

        Ok(line)
    }

    /// Removes the line with the given id.
    ///
    /// Returns whether a line was removed. Unknown ids leave the cart untouched.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.lines.len();

        self.lines.retain(|line| line.id != id);

        if self.lines.len() == before {
            return false;
        }

        debug!(id, "cart line removed");
        self.commit();

        true
    }

    /// Sets the quantity of a line. Zero or negative quantities remove it.
    ///
    /// Returns whether the cart changed.
    pub fn update_quantity(&mut self, id: &str, qty: i64) -> bool {
        if qty <= 0 {
            return self.remove_item(id);
        }

        let Some(line) = self.lines.iter_mut().find(|line| line.id == id) else {
            return false;
        };

        line.qty = u32::try_from(qty).unwrap_or(u32::MAX);

        debug!(id, qty = line.qty, "cart quantity updated");
        self.commit();

        true
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();

        debug!("cart cleared");
        self.commit();
    }

    /// Sum of price × quantity over every line.
    pub fn total(&self) -> Money<'static, Currency> {
        lines_total(&self.lines).to_money(self.currency)
    }

    /// Sum of quantities over every line.
    pub fn item_count(&self) -> u64 {
        item_count(&self.lines)
    }

    /// Look up a line by product id.
    pub fn get(&self, id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// An owned copy of the lines, suitable for an order snapshot.
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Currency totals are reported in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    fn save(&self) -> bool {
        persist(self.store.as_ref(), CART_KEY, &self.lines)
    }

    fn commit(&self) {
        self.save();
        self.observer.on_cart_changed(&self.lines);
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;
    use crate::{
        events::{RecordingObserver, StorefrontEvent},
        prices::Price,
        store::{MemoryStore, UnreadableStore},
    };

    fn cart_with(store: &MemoryStore) -> (CartManager, RecordingObserver) {
        let observer = RecordingObserver::new();
        let cart = CartManager::new(
            Arc::new(store.clone()),
            Arc::new(observer.clone()),
            iso::USD,
        );

        (cart, observer)
    }

    fn stored_lines(store: &MemoryStore) -> Result<Vec<CartLine>, Box<dyn std::error::Error>> {
        let raw = store.get(CART_KEY)?.ok_or("cart not persisted")?;

        Ok(serde_json::from_str(&raw)?)
    }

    #[test]
    fn repeated_add_sums_quantities_into_one_line() -> TestResult {
        let store = MemoryStore::new();
        let (mut cart, _) = cart_with(&store);

        cart.add_item(NewCartItem::new("rolex-submariner", 12_500.0).qty(1))?;
        let line = cart.add_item(NewCartItem::new("rolex-submariner", 12_500.0).qty(2))?;

        assert_eq!(line.qty, 3);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(stored_lines(&store)?, cart.snapshot());

        Ok(())
    }

    #[test]
    fn totals_and_quantity_updates() -> TestResult {
        let store = MemoryStore::new();
        let (mut cart, _) = cart_with(&store);

        cart.add_item(NewCartItem::new("a", 100.0).name("A").qty(2))?;
        cart.add_item(NewCartItem::new("b", 50.0).name("B").qty(1))?;

        assert_eq!(cart.total(), Money::from_minor(25_000, iso::USD));
        assert_eq!(cart.item_count(), 3);

        assert!(cart.update_quantity("a", 0));

        let ids: Vec<&str> = cart.lines().iter().map(|line| line.id.as_str()).collect();

        assert_eq!(ids, vec!["b"]);
        assert_eq!(cart.total(), Money::from_minor(5_000, iso::USD));

        Ok(())
    }

    #[test]
    fn update_quantity_on_unknown_id_is_noop() -> TestResult {
        let store = MemoryStore::new();
        let (mut cart, observer) = cart_with(&store);

        cart.add_item(NewCartItem::new("a", 10.0))?;
        observer.clear();

        assert!(!cart.update_quantity("missing", 4));
        assert!(!cart.update_quantity("missing", -1));
        assert!(observer.events().is_empty());

        assert!(cart.update_quantity("a", 4));
        assert_eq!(cart.get("a").map(|line| line.qty), Some(4));

        Ok(())
    }

    #[test]
    fn remove_item_excludes_line_from_totals() -> TestResult {
        let store = MemoryStore::new();
        let (mut cart, _) = cart_with(&store);

        cart.add_item(NewCartItem::new("a", 100.0).qty(2))?;
        cart.add_item(NewCartItem::new("b", 50.0))?;

        assert!(cart.remove_item("a"));
        assert!(!cart.remove_item("a"));
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total(), Money::from_minor(5_000, iso::USD));

        Ok(())
    }

    #[test]
    fn invalid_items_are_rejected_without_side_effects() {
        let store = MemoryStore::new();
        let (mut cart, observer) = cart_with(&store);

        let result = cart.add_item(NewCartItem::new("", 10.0));

        assert_eq!(result, Err(CartError::InvalidItem(LineError::MissingId)));
        assert!(cart.is_empty());
        assert!(observer.events().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn mutations_notify_observer() -> TestResult {
        let store = MemoryStore::new();
        let (mut cart, observer) = cart_with(&store);

        cart.add_item(NewCartItem::new("a", 10.0))?;
        cart.clear();

        let events = observer.events();

        assert_eq!(events.len(), 2);
        assert!(matches!(events.last(), Some(StorefrontEvent::CartChanged(lines)) if lines.is_empty()));

        Ok(())
    }

    #[test]
    fn load_drops_invalid_lines_and_rewrites() -> TestResult {
        let store = MemoryStore::new();
        store.set(
            CART_KEY,
            &json!([
                {"id": "a", "name": "A", "price": 100, "qty": 2, "image": "a.jpg"},
                {"id": "b", "name": "B", "price": "oops", "qty": 1},
                {"id": "c", "name": "C", "price": 50, "qty": 0},
                null,
            ])
            .to_string(),
        )?;
        let (mut cart, _) = cart_with(&store);

        let report = cart.load();

        assert_eq!(report.kept, 1);
        assert_eq!(report.dropped, 3);
        assert!(report.rewritten());
        assert_eq!(cart.total(), Money::from_minor(20_000, iso::USD));
        assert_eq!(stored_lines(&store)?, cart.snapshot());

        Ok(())
    }

    #[test]
    fn load_merges_duplicate_ids() -> TestResult {
        let store = MemoryStore::new();
        store.set(
            CART_KEY,
            &json!([
                {"id": "a", "name": "A", "price": 100, "qty": 1},
                {"id": "a", "name": "A", "price": 100, "qty": 2},
            ])
            .to_string(),
        )?;
        let (mut cart, _) = cart_with(&store);

        let report = cart.load();

        assert_eq!(report.merged, 1);
        assert_eq!(cart.get("a").map(|line| line.qty), Some(3));
        assert_eq!(stored_lines(&store)?.len(), 1);

        Ok(())
    }

    #[test]
    fn load_of_valid_cart_does_not_rewrite() -> TestResult {
        let store = MemoryStore::new();
        let raw = r#"[{"id":"a","name":"A","price":12.5,"qty":2,"image":"a.jpg"}]"#;
        store.set(CART_KEY, raw)?;
        let (mut cart, _) = cart_with(&store);

        let report = cart.load();

        assert!(!report.rewritten());
        assert_eq!(store.get(CART_KEY)?.as_deref(), Some(raw));
        assert_eq!(cart.get("a").map(|line| line.price), Some(Price::from_minor(1_250)));

        Ok(())
    }

    #[test]
    fn load_resets_unparseable_cart() -> TestResult {
        let store = MemoryStore::new();
        store.set(CART_KEY, "{definitely not a cart")?;
        let (mut cart, _) = cart_with(&store);

        let report = cart.load();

        assert!(report.reset);
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert_eq!(store.get(CART_KEY)?.as_deref(), Some("[]"));

        Ok(())
    }

    #[test]
    fn load_from_unreadable_store_keeps_cart_and_stored_value() -> TestResult {
        let store = Arc::new(UnreadableStore::default());
        let mut cart = CartManager::new(store.clone(), Arc::new(RecordingObserver::new()), iso::USD);
        cart.add_item(NewCartItem::new("b", 50.0))?;

        let report = cart.load();

        assert!(report.unavailable);
        assert!(!report.rewritten());
        assert_eq!(cart.get("b").map(|line| line.qty), Some(1));

        let stored = store.inner.get(CART_KEY)?.ok_or("cart missing")?;

        assert_ne!(stored, "[]");
        assert!(stored.contains(r#""id":"b""#));

        Ok(())
    }

    #[test]
    fn stored_ids_are_trimmed_and_merge_with_added_items() -> TestResult {
        let store = MemoryStore::new();
        store.set(
            CART_KEY,
            &json!([{"id": " a ", "name": "A", "price": 100, "qty": 1}]).to_string(),
        )?;
        let (mut cart, _) = cart_with(&store);

        cart.load();
        cart.add_item(NewCartItem::new("a", 100.0))?;

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get("a").map(|line| line.qty), Some(2));

        Ok(())
    }

    #[test]
    fn persistence_failures_keep_memory_state() -> TestResult {
        let store = MemoryStore::with_quota(8);
        let (mut cart, _) = cart_with(&store);

        cart.add_item(NewCartItem::new("patek-philippe-nautilus", 75_000.0))?;

        assert_eq!(cart.len(), 1);
        assert!(store.get(CART_KEY)?.is_none());

        Ok(())
    }
}
