//! HTTP cart API client.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;

use crate::remote::{
    AddToCartRequest, AddToCartResponse, ApiResponse, RemoteCart, RemoteCartApi, RemoteCartError,
};

const CSRF_HEADER: &str = "X-CSRFToken";

/// [`RemoteCartApi`] over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpRemoteCart {
    http: Client,
    base_url: String,
    csrf_token: Option<String>,
}

impl HttpRemoteCart {
    /// Create a client for the storefront at `base_url`, e.g. `"http://localhost:8000"`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            csrf_token: None,
        }
    }

    /// Sends `token` as the CSRF header on every request.
    #[must_use]
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{endpoint}/", self.base_url.trim_end_matches('/'))
    }

    fn with_csrf(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.csrf_token {
            Some(token) => request.header(CSRF_HEADER, token),
            None => request,
        }
    }

    async fn command<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<(), RemoteCartError> {
        let response = self
            .with_csrf(self.http.post(self.url(endpoint)))
            .json(body)
            .send()
            .await?;

        let parsed: ApiResponse = decode(response).await?;

        if parsed.success {
            Ok(())
        } else {
            Err(RemoteCartError::Rejected {
                error: parsed.error,
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct CartEnvelope {
    #[serde(default)]
    success: bool,

    #[serde(default)]
    cart: RemoteCart,

    #[serde(default)]
    error: Option<String>,
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteCartError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(RemoteCartError::Unauthorized);
    }

    let body = response.bytes().await?;

    match serde_json::from_slice(&body) {
        Ok(parsed) => Ok(parsed),
        Err(_) if !status.is_success() => Err(RemoteCartError::UnexpectedStatus(status.as_u16())),
        Err(error) => Err(RemoteCartError::Decode(error)),
    }
}

#[async_trait]
impl RemoteCartApi for HttpRemoteCart {
    async fn fetch_cart(&self) -> Result<RemoteCart, RemoteCartError> {
        let response = self
            .with_csrf(self.http.get(self.url("get-cart")))
            .send()
            .await?;

        let envelope: CartEnvelope = decode(response).await?;

        if envelope.success {
            Ok(envelope.cart)
        } else {
            Err(RemoteCartError::Rejected {
                error: envelope.error,
            })
        }
    }

    async fn add_item(
        &self,
        request: AddToCartRequest,
    ) -> Result<AddToCartResponse, RemoteCartError> {
        let response = self
            .with_csrf(self.http.post(self.url("add-to-cart")))
            .json(&request)
            .send()
            .await?;

        let parsed: AddToCartResponse = decode(response).await?;

        if parsed.success {
            Ok(parsed)
        } else {
            Err(RemoteCartError::Rejected {
                error: parsed.error,
            })
        }
    }

    async fn update_quantity(&self, item_id: u64, quantity: u32) -> Result<(), RemoteCartError> {
        self.command(
            "update-cart-item",
            &json!({ "item_id": item_id, "quantity": quantity }),
        )
        .await
    }

    async fn remove_item(&self, item_id: u64) -> Result<(), RemoteCartError> {
        self.command("remove-from-cart", &json!({ "item_id": item_id }))
            .await
    }

    async fn clear(&self) -> Result<(), RemoteCartError> {
        self.command("clear-cart", &json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::prices::Price;

    #[test]
    fn endpoint_urls_tolerate_trailing_slash() {
        let client = HttpRemoteCart::new("http://localhost:8000/");

        assert_eq!(
            client.url("get-cart"),
            "http://localhost:8000/api/get-cart/"
        );
        assert_eq!(
            HttpRemoteCart::new("https://shop.example").url("clear-cart"),
            "https://shop.example/api/clear-cart/"
        );
    }

    #[test]
    fn cart_envelope_accepts_decimal_strings() -> TestResult {
        let envelope: CartEnvelope = serde_json::from_str(
            r#"{
                "success": true,
                "cart": {
                    "items": [{
                        "id": 4,
                        "quantity": 2,
                        "total_price": "25000.00",
                        "product": {"name": "Submariner", "brand": "Rolex", "image": null}
                    }],
                    "total_items": 2,
                    "total_price": "25000.00",
                    "item_count": 1
                }
            }"#,
        )?;

        assert!(envelope.success);
        assert_eq!(envelope.cart.total_price, Price::from_major(25_000));
        assert_eq!(envelope.cart.item(4).map(|item| item.quantity), Some(2));

        Ok(())
    }

    #[test]
    fn failed_envelope_keeps_reason() -> TestResult {
        let envelope: CartEnvelope =
            serde_json::from_str(r#"{"success": false, "error": "Session expired"}"#)?;

        assert!(!envelope.success);
        assert!(envelope.cart.is_empty());
        assert_eq!(envelope.error.as_deref(), Some("Session expired"));

        Ok(())
    }
}
