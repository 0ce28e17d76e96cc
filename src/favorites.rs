//! Favorites

use std::sync::Arc;

use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    clock::Clock,
    events::StorefrontObserver,
    prices::Price,
    store::{FAVORITES_KEY, KeyValueStore, Loaded, decode_entries, load_json, persist},
};

/// A liked product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    /// Product identifier, unique within the set
    pub id: String,

    /// Display name
    pub name: String,

    /// Unit price, zero when unknown
    #[serde(default, deserialize_with = "price_or_zero")]
    pub price: Price,

    /// Image path or URL
    #[serde(default)]
    pub image: String,

    /// Brand
    #[serde(default)]
    pub brand: String,

    /// When the product was liked
    pub added_at: Timestamp,
}

fn price_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Price, D::Error> {
    let raw = Value::deserialize(deserializer)?;

    Ok(Price::from_json(&raw)
        .ok()
        .filter(|price| price.is_positive())
        .unwrap_or(Price::ZERO))
}

/// A product offered to the favorites set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewFavorite {
    /// Product identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Unit price in major units; anything non-finite or negative is stored as zero
    #[serde(default)]
    pub price: f64,

    /// Image path or URL
    #[serde(default)]
    pub image: String,

    /// Brand
    #[serde(default)]
    pub brand: String,
}

/// The favorites set, in the order products were liked.
#[derive(Debug)]
pub struct FavoritesManager {
    favorites: Vec<Favorite>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn StorefrontObserver>,
}

impl FavoritesManager {
    /// Create an empty set. Call [`FavoritesManager::load`] to restore persisted favorites.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn StorefrontObserver>,
    ) -> Self {
        Self {
            favorites: Vec::new(),
            store,
            clock,
            observer,
        }
    }

    /// Replaces the in-memory set with the persisted one.
    ///
    /// Entries that do not decode and repeated ids are dropped, and the
    /// cleaned set is written back. Unreadable data yields an empty set; a
    /// store that cannot be read leaves the in-memory set untouched.
    ///
    /// Returns the number of favorites held afterwards.
    pub fn load(&mut self) -> usize {
        let entries = match load_json::<Vec<Value>>(self.store.as_ref(), FAVORITES_KEY) {
            Loaded::Value(entries) => entries,
            Loaded::Missing | Loaded::Corrupt => Vec::new(),
            Loaded::Unavailable => return self.favorites.len(),
        };

        let stored = entries.len();
        let (mut favorites, _) = decode_entries::<Favorite>(FAVORITES_KEY, entries);
        let mut seen = Vec::with_capacity(favorites.len());

        favorites.retain(|favorite| {
            if seen.contains(&favorite.id) {
                false
            } else {
                seen.push(favorite.id.clone());
                true
            }
        });

        self.favorites = favorites;

        if self.favorites.len() < stored {
            warn!(
                kept = self.favorites.len(),
                dropped = stored - self.favorites.len(),
                "rewriting cleaned favorites"
            );
            persist(self.store.as_ref(), FAVORITES_KEY, &self.favorites);
        }

        self.observer.on_favorites_changed(&self.favorites);

        self.favorites.len()
    }

    /// Adds a product. Returns `false` if it is already a favorite or has a blank id.
    pub fn add(&mut self, item: NewFavorite) -> bool {
        if item.id.trim().is_empty() || self.contains(&item.id) {
            return false;
        }

        let price = Price::from_f64(item.price)
            .ok()
            .filter(|price| price.is_positive())
            .unwrap_or(Price::ZERO);

        debug!(id = %item.id, "favorite added");

        self.favorites.push(Favorite {
            id: item.id,
            name: item.name,
            price,
            image: item.image,
            brand: item.brand,
            added_at: self.clock.now(),
        });

        self.commit();

        true
    }

    /// Removes a product. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.favorites.len();

        self.favorites.retain(|favorite| favorite.id != id);

        if self.favorites.len() == before {
            return false;
        }

        debug!(id, "favorite removed");
        self.commit();

        true
    }

    /// Removes the product if it is a favorite, otherwise adds it.
    ///
    /// Returns the result of whichever branch ran.
    pub fn toggle(&mut self, item: NewFavorite) -> bool {
        if self.contains(&item.id) {
            self.remove(&item.id)
        } else {
            self.add(item)
        }
    }

    /// Whether the product is a favorite.
    pub fn contains(&self, id: &str) -> bool {
        self.favorites.iter().any(|favorite| favorite.id == id)
    }

    /// Favorites in the order they were added.
    pub fn list(&self) -> &[Favorite] {
        &self.favorites
    }

    /// Number of favorites.
    pub fn count(&self) -> usize {
        self.favorites.len()
    }

    /// Removes every favorite.
    pub fn clear(&mut self) {
        self.favorites.clear();

        debug!("favorites cleared");
        self.commit();
    }

    fn commit(&self) {
        persist(self.store.as_ref(), FAVORITES_KEY, &self.favorites);
        self.observer.on_favorites_changed(&self.favorites);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;
    use crate::{
        clock::ManualClock,
        events::NoopObserver,
        store::{MemoryStore, UnreadableStore},
    };

    fn watch(id: &str) -> NewFavorite {
        NewFavorite {
            id: id.to_string(),
            name: "Nautilus".to_string(),
            price: 75_000.0,
            image: "./assets/watch-1-L_BZsghZ.jpg".to_string(),
            brand: "Patek Philippe".to_string(),
        }
    }

    fn manager(store: &MemoryStore) -> Result<FavoritesManager, Box<dyn std::error::Error>> {
        let clock = ManualClock::new("2025-03-01T09:00:00Z".parse()?);

        Ok(FavoritesManager::new(
            Arc::new(store.clone()),
            Arc::new(clock),
            Arc::new(NoopObserver),
        ))
    }

    #[test]
    fn add_is_idempotent_by_id() -> TestResult {
        let store = MemoryStore::new();
        let mut favorites = manager(&store)?;

        assert!(favorites.add(watch("patek-philippe-nautilus")));
        assert!(!favorites.add(watch("patek-philippe-nautilus")));
        assert_eq!(favorites.count(), 1);

        let favorite = favorites.list().first().ok_or("missing favorite")?;

        assert_eq!(favorite.price, Price::from_major(75_000));
        assert_eq!(favorite.added_at, "2025-03-01T09:00:00Z".parse::<Timestamp>()?);

        Ok(())
    }

    #[test]
    fn double_toggle_restores_membership() -> TestResult {
        let store = MemoryStore::new();
        let mut favorites = manager(&store)?;

        assert!(!favorites.contains("rolex-daytona"));
        assert!(favorites.toggle(watch("rolex-daytona")));
        assert!(favorites.contains("rolex-daytona"));
        assert!(favorites.toggle(watch("rolex-daytona")));
        assert!(!favorites.contains("rolex-daytona"));

        Ok(())
    }

    #[test]
    fn remove_reports_whether_anything_changed() -> TestResult {
        let store = MemoryStore::new();
        let mut favorites = manager(&store)?;

        favorites.add(watch("omega-speedmaster"));

        assert!(!favorites.remove("rolex-daytona"));
        assert!(favorites.remove("omega-speedmaster"));
        assert_eq!(favorites.count(), 0);

        Ok(())
    }

    #[test]
    fn invalid_prices_become_zero() -> TestResult {
        let store = MemoryStore::new();
        let mut favorites = manager(&store)?;

        favorites.add(NewFavorite {
            price: f64::NAN,
            ..watch("mystery")
        });

        assert_eq!(
            favorites.list().first().map(|favorite| favorite.price),
            Some(Price::ZERO)
        );

        Ok(())
    }

    #[test]
    fn persisted_favorites_survive_reload() -> TestResult {
        let store = MemoryStore::new();
        let mut favorites = manager(&store)?;

        favorites.add(watch("a"));
        favorites.add(watch("b"));

        let mut reloaded = manager(&store)?;

        assert_eq!(reloaded.load(), 2);
        assert_eq!(reloaded.list(), favorites.list());

        reloaded.clear();

        assert_eq!(store.get(FAVORITES_KEY)?.as_deref(), Some("[]"));

        Ok(())
    }

    #[test]
    fn unreadable_favorites_load_empty() -> TestResult {
        let store = MemoryStore::new();
        store.set(FAVORITES_KEY, "not json")?;

        let mut favorites = manager(&store)?;

        assert_eq!(favorites.load(), 0);
        assert!(favorites.list().is_empty());

        Ok(())
    }

    #[test]
    fn one_bad_entry_does_not_empty_the_set() -> TestResult {
        let store = MemoryStore::new();
        store.set(
            FAVORITES_KEY,
            &json!([
                {"id": "a", "name": "Nautilus", "price": 75000, "addedAt": "2025-03-01T09:00:00Z"},
                {"id": "b", "price": 1000, "addedAt": "2025-03-01T09:00:00Z"},
                {"id": "c", "name": "Daytona", "price": null, "addedAt": "2025-03-01T09:00:00Z"},
                {"id": "a", "name": "Nautilus", "price": 75000, "addedAt": "2025-03-02T09:00:00Z"},
            ])
            .to_string(),
        )?;

        let mut favorites = manager(&store)?;

        assert_eq!(favorites.load(), 2);
        assert!(favorites.contains("a"));
        assert!(!favorites.contains("b"));
        assert_eq!(
            favorites.list().get(1).map(|favorite| favorite.price),
            Some(Price::ZERO)
        );

        favorites.add(watch("d"));

        let mut reloaded = manager(&store)?;

        assert_eq!(reloaded.load(), 3);
        assert!(reloaded.contains("a"));
        assert!(reloaded.contains("c"));

        Ok(())
    }

    #[test]
    fn unreadable_store_keeps_the_set() -> TestResult {
        let clock = ManualClock::new("2025-03-01T09:00:00Z".parse()?);
        let mut favorites = FavoritesManager::new(
            Arc::new(UnreadableStore::default()),
            Arc::new(clock),
            Arc::new(NoopObserver),
        );

        favorites.add(watch("a"));

        assert_eq!(favorites.load(), 1);
        assert!(favorites.contains("a"));

        Ok(())
    }
}
