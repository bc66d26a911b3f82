//! Order service API client.
//!
//! The order service owns orders, the menu and the payment gateway's server
//! side. Authenticated endpoints take the customer's token in a `token`
//! header; every response is a `{success, message, ...}` envelope, decoded
//! by [`envelope`].

pub mod envelope;
pub mod types;

use std::sync::Arc;

use quickbite_core::OrderDraft;
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

pub use envelope::BackendResult;
pub use types::{
    Acknowledgement, FoodItem, OnlineOrder, OrderSummary, OrderedItem, VerifyPaymentRequest,
};

use crate::config::OrderServiceConfig;
use types::DataList;

/// Header carrying the customer's auth token.
const TOKEN_HEADER: &str = "token";

/// Errors that can occur when talking to the order service.
#[derive(Debug, Error)]
pub enum OrderServiceError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status and no usable envelope.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The customer token cannot be sent as a header value.
    #[error("customer token is not a valid header value")]
    InvalidToken,
}

impl OrderServiceError {
    /// Returns `true` if the request gave up waiting for the service.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// Order service API client.
#[derive(Clone)]
pub struct OrderClient {
    inner: Arc<OrderClientInner>,
}

struct OrderClientInner {
    client: reqwest::Client,
    config: OrderServiceConfig,
}

impl OrderClient {
    /// Create a new order service client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &OrderServiceConfig) -> Result<Self, OrderServiceError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("quickbite-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(OrderClientInner {
                client,
                config: config.clone(),
            }),
        })
    }

    /// Place a cash-on-delivery order.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded.
    #[instrument(skip_all, fields(amount = %draft.amount()))]
    pub async fn place_cod(
        &self,
        token: &SecretString,
        draft: &OrderDraft,
    ) -> Result<BackendResult<Acknowledgement>, OrderServiceError> {
        let request = self
            .authed_post("/api/order/placecod", token)?
            .json(draft)
            .timeout(self.inner.config.timeout);

        self.send(request).await
    }

    /// Place an order to be paid online. The service creates a gateway order
    /// for it and returns what the widget needs to collect the payment.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded.
    #[instrument(skip_all, fields(amount = %draft.amount()))]
    pub async fn place_online(
        &self,
        token: &SecretString,
        draft: &OrderDraft,
    ) -> Result<BackendResult<OnlineOrder>, OrderServiceError> {
        let request = self
            .authed_post("/api/order/place", token)?
            .json(draft)
            .timeout(self.inner.config.timeout);

        self.send(request).await
    }

    /// Ask the service to verify a payment the widget reported as successful.
    ///
    /// No timeout: the payment has already been taken, so this waits for an
    /// answer rather than reporting a failure the customer cannot act on.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded.
    #[instrument(skip_all, fields(order_id = %body.order_id, gateway_order_id = %body.razorpay_order_id))]
    pub async fn verify_payment(
        &self,
        token: &SecretString,
        body: &VerifyPaymentRequest,
    ) -> Result<BackendResult<Acknowledgement>, OrderServiceError> {
        let request = self.authed_post("/api/order/verify", token)?.json(body);

        self.send(request).await
    }

    /// List the customer's past orders, newest first as the service returns them.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded.
    #[instrument(skip_all)]
    pub async fn user_orders(
        &self,
        token: &SecretString,
    ) -> Result<BackendResult<Vec<OrderSummary>>, OrderServiceError> {
        let request = self
            .authed_post("/api/order/userorders", token)?
            .json(&serde_json::json!({}))
            .timeout(self.inner.config.timeout);

        let result: BackendResult<DataList<OrderSummary>> = self.send(request).await?;
        Ok(result.map(|list| list.data))
    }

    /// Fetch the menu.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded.
    #[instrument(skip(self))]
    pub async fn food_list(&self) -> Result<BackendResult<Vec<FoodItem>>, OrderServiceError> {
        let request = self
            .inner
            .client
            .get(self.inner.config.endpoint("/api/food/list"))
            .timeout(self.inner.config.timeout);

        let result: BackendResult<DataList<FoodItem>> = self.send(request).await?;
        Ok(result.map(|list| list.data))
    }

    fn authed_post(
        &self,
        path: &str,
        token: &SecretString,
    ) -> Result<reqwest::RequestBuilder, OrderServiceError> {
        let mut value = HeaderValue::from_str(token.expose_secret())
            .map_err(|_| OrderServiceError::InvalidToken)?;
        value.set_sensitive(true);

        Ok(self
            .inner
            .client
            .post(self.inner.config.endpoint(path))
            .header(TOKEN_HEADER, value))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<BackendResult<T>, OrderServiceError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // A non-2xx with a `success: false` envelope is still a rejection
            // the customer should see; anything else is an API failure.
            if let Ok(BackendResult::Rejected(message)) =
                envelope::decode::<serde_json::Value>(&body)
            {
                tracing::warn!(status = status.as_u16(), "Order service rejected request");
                return Ok(BackendResult::Rejected(message));
            }
            return Err(OrderServiceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        envelope::decode(&body).map_err(|e| OrderServiceError::Parse(e.to_string()))
    }
}

impl std::fmt::Debug for OrderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderClient")
            .field("api_url", &self.inner.config.api_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client() -> OrderClient {
        OrderClient::new(&OrderServiceConfig {
            api_url: "http://localhost:4000".parse().unwrap(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_rejects_token_with_newline() {
        let token = SecretString::from("abc\ndef");
        let result = client().authed_post("/api/order/place", &token);
        assert!(matches!(result, Err(OrderServiceError::InvalidToken)));
    }

    #[test]
    fn test_debug_hides_client_internals() {
        let debug = format!("{:?}", client());
        assert!(debug.contains("localhost:4000"));
    }
}
