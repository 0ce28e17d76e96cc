//! Storefront prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{CartError, CartLine, CartLoadReport, CartManager, LineError, NewCartItem},
    catalog::{
        Catalog, CatalogError, CatalogFilter, Customization, DiamondCarat, DiamondType, GoldCarat,
        PriceBand, Product,
    },
    clock::{Clock, ManualClock, SystemClock},
    events::{
        NoopObserver, Notification, NotificationKind, Page, RecordingObserver, StorefrontEvent,
        StorefrontObserver, TracingObserver,
    },
    favorites::{Favorite, FavoritesManager, NewFavorite},
    orders::{Order, OrderError, OrderManager, OrderStatus, OrdersLoaded, StatusEntry, StatusSchedule},
    prices::{Price, PriceError},
    receipt::{OrderReceipt, ReceiptError},
    remote::{
        AddToCartRequest, HttpRemoteCart, RemoteCart, RemoteCartApi, RemoteCartError,
        ServerCartManager,
    },
    session::{AccountSummary, CheckoutError, SessionSettings, Storefront},
    store::{FileStore, KeyValueStore, MemoryStore, StoreError},
};
