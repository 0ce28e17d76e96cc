//! Server Cart
//!
//! The server-backed cart variant: the cart lives behind a JSON API and the
//! client only caches the last fetched copy. Mutations go to the server and
//! the cache is refreshed from its answer.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    catalog::{Customization, Product},
    events::{Notification, StorefrontObserver},
    prices::Price,
};

pub mod http;

pub use http::HttpRemoteCart;

/// Image shown for server cart items without one.
pub const SERVER_FALLBACK_IMAGE: &str = "/static/hero-watch-D40AmJ87.jpg";

const NETWORK_ERROR: &str = "Network error. Please try again.";

/// Errors talking to the cart API.
#[derive(Debug, Error)]
pub enum RemoteCartError {
    /// Transport failure
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// No session on the server
    #[error("not signed in")]
    Unauthorized,

    /// The server answered `success: false`
    #[error("request rejected: {}", .error.as_deref().unwrap_or("no reason given"))]
    Rejected {
        /// Reason supplied by the server, if any
        error: Option<String>,
    },

    /// A non-success status without a readable body
    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),
}

/// Product summary embedded in a server cart item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProduct {
    /// Display name
    pub name: String,

    /// Brand
    #[serde(default)]
    pub brand: String,

    /// Image URL
    #[serde(default)]
    pub image: Option<String>,
}

impl RemoteProduct {
    /// The product image, or the storefront fallback.
    pub fn image_or_fallback(&self) -> &str {
        self.image
            .as_deref()
            .filter(|image| !image.is_empty())
            .unwrap_or(SERVER_FALLBACK_IMAGE)
    }
}

/// One line of the server cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCartItem {
    /// Server-side line id
    pub id: u64,

    /// Units
    pub quantity: u32,

    /// Line total including customization
    pub total_price: Price,

    /// Product summary
    pub product: RemoteProduct,
}

/// The server's view of the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteCart {
    /// Lines
    pub items: Vec<RemoteCartItem>,

    /// Units across all lines
    pub total_items: u64,

    /// Cart total
    pub total_price: Price,

    /// Distinct lines
    pub item_count: u64,
}

impl RemoteCart {
    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Finds a line by its server id.
    pub fn item(&self, id: u64) -> Option<&RemoteCartItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

/// Body of `POST /api/add-to-cart/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddToCartRequest {
    /// Catalog product id
    pub product_id: String,

    /// Units to add
    pub quantity: u32,

    /// Chosen options by form field name, `null` for a standard watch
    pub customization: Option<BTreeMap<String, String>>,

    /// Surcharge for the chosen options
    pub customization_price: Price,
}

impl AddToCartRequest {
    /// A request for a standard product.
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity: quantity.max(1),
            customization: None,
            customization_price: Price::ZERO,
        }
    }

    /// A request for a product with the given customization.
    pub fn customized(product: &Product, quantity: u32, customization: &Customization) -> Self {
        let mut request = Self::new(product.id.clone(), quantity);

        if !customization.is_standard() {
            request.customization = Some(customization.selections());
            request.customization_price = customization.surcharge();
        }

        request
    }
}

/// Answer to `POST /api/add-to-cart/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddToCartResponse {
    /// Whether the server applied the request
    pub success: bool,

    /// Units now in the cart
    pub cart_item_count: u64,

    /// Cart total after the add
    pub cart_total: Price,

    /// Confirmation text
    pub message: Option<String>,

    /// Failure reason
    pub error: Option<String>,
}

/// Answer to the other cart commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiResponse {
    /// Whether the server applied the request
    pub success: bool,

    /// Failure reason
    pub error: Option<String>,
}

/// The server cart API.
#[automock]
#[async_trait]
pub trait RemoteCartApi: Send + Sync {
    /// `GET /api/get-cart/`
    async fn fetch_cart(&self) -> Result<RemoteCart, RemoteCartError>;

    /// `POST /api/add-to-cart/`
    async fn add_item(
        &self,
        request: AddToCartRequest,
    ) -> Result<AddToCartResponse, RemoteCartError>;

    /// `POST /api/update-cart-item/`
    async fn update_quantity(&self, item_id: u64, quantity: u32) -> Result<(), RemoteCartError>;

    /// `POST /api/remove-from-cart/`
    async fn remove_item(&self, item_id: u64) -> Result<(), RemoteCartError>;

    /// `POST /api/clear-cart/`
    async fn clear(&self) -> Result<(), RemoteCartError>;
}

/// Client-side cache of the server cart.
///
/// Every mutation reports its outcome as a notification. A failed mutation
/// leaves the cache untouched.
#[derive(Debug)]
pub struct ServerCartManager<A> {
    api: A,
    cart: RemoteCart,
    observer: Arc<dyn StorefrontObserver>,
}

impl<A: RemoteCartApi> ServerCartManager<A> {
    /// Wraps an API client with an empty cache.
    pub fn new(api: A, observer: Arc<dyn StorefrontObserver>) -> Self {
        Self {
            api,
            cart: RemoteCart::default(),
            observer,
        }
    }

    /// The last fetched cart.
    pub fn cart(&self) -> &RemoteCart {
        &self.cart
    }

    /// Re-fetches the cart. Any failure, including a missing session, leaves an empty cart.
    pub async fn refresh(&mut self) -> &RemoteCart {
        self.cart = match self.api.fetch_cart().await {
            Ok(cart) => cart,
            Err(RemoteCartError::Unauthorized) => {
                debug!("no server session, showing empty cart");
                RemoteCart::default()
            }
            Err(error) => {
                warn!(%error, "failed to fetch server cart");
                RemoteCart::default()
            }
        };

        &self.cart
    }

    /// Adds a product and refreshes the cache.
    ///
    /// # Errors
    ///
    /// Returns the API error after emitting an error notification.
    pub async fn add(&mut self, request: AddToCartRequest) -> Result<(), RemoteCartError> {
        let product_id = request.product_id.clone();

        match self.api.add_item(request).await {
            Ok(response) => {
                debug!(%product_id, items = response.cart_item_count, "added to server cart");

                self.refresh().await;
                self.notify(Notification::success(
                    response
                        .message
                        .unwrap_or_else(|| "Added to cart successfully!".to_string()),
                ));

                Ok(())
            }
            Err(error) => Err(self.failed(error, "Failed to add to cart")),
        }
    }

    /// Sets a line's quantity. Quantities below one remove the line.
    ///
    /// # Errors
    ///
    /// Returns the API error after emitting an error notification.
    pub async fn update_quantity(&mut self, item_id: u64, quantity: i64) -> Result<(), RemoteCartError> {
        let Some(quantity) = u32::try_from(quantity).ok().filter(|qty| *qty > 0) else {
            return self.remove(item_id).await;
        };

        match self.api.update_quantity(item_id, quantity).await {
            Ok(()) => {
                self.refresh().await;
                self.notify(Notification::success("Cart updated successfully!"));

                Ok(())
            }
            Err(error) => Err(self.failed(error, "Failed to update cart")),
        }
    }

    /// Removes a line.
    ///
    /// # Errors
    ///
    /// Returns the API error after emitting an error notification.
    pub async fn remove(&mut self, item_id: u64) -> Result<(), RemoteCartError> {
        match self.api.remove_item(item_id).await {
            Ok(()) => {
                self.refresh().await;
                self.notify(Notification::success("Item removed from cart"));

                Ok(())
            }
            Err(error) => Err(self.failed(error, "Failed to remove item")),
        }
    }

    /// Empties the cart.
    ///
    /// # Errors
    ///
    /// Returns the API error after emitting an error notification.
    pub async fn clear(&mut self) -> Result<(), RemoteCartError> {
        match self.api.clear().await {
            Ok(()) => {
                self.cart = RemoteCart::default();
                self.notify(Notification::success("Cart cleared successfully!"));

                Ok(())
            }
            Err(error) => Err(self.failed(error, "Failed to clear cart")),
        }
    }

    fn failed(&self, error: RemoteCartError, fallback: &str) -> RemoteCartError {
        warn!(%error, "server cart request failed");

        let message = match &error {
            RemoteCartError::Rejected { error: reason } => {
                reason.clone().unwrap_or_else(|| fallback.to_string())
            }
            _ => NETWORK_ERROR.to_string(),
        };

        self.notify(Notification::error(message));

        error
    }

    fn notify(&self, notification: Notification) {
        self.observer.on_notification(&notification);
    }
}
