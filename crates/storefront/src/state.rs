//! Application state shared across handlers.

use std::sync::Arc;

use crate::checkout::{CheckoutFlow, GatewayScript, PaymentGateway, SubmissionGuard};
use crate::config::StorefrontConfig;
use crate::services::{MenuService, OrderClient, OrderServiceError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("order service client: {0}")]
    OrderClient(#[from] OrderServiceError),
    #[error("gateway script client: {0}")]
    GatewayScript(#[from] reqwest::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like service clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    orders: OrderClient,
    menu: MenuService,
    checkout: CheckoutFlow,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let orders = OrderClient::new(&config.orders)?;
        let menu = MenuService::new(orders.clone());
        let script = GatewayScript::new(config.gateway.script_url.clone(), config.orders.timeout)?;
        let checkout = CheckoutFlow::new(
            orders.clone(),
            PaymentGateway::new(config.gateway.clone(), config.pricing.clone()),
            script,
            SubmissionGuard::new(),
            config.pricing.clone(),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                orders,
                menu,
                checkout,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the order service client.
    #[must_use]
    pub fn orders(&self) -> &OrderClient {
        &self.inner.orders
    }

    /// Get a reference to the cached menu.
    #[must_use]
    pub fn menu(&self) -> &MenuService {
        &self.inner.menu
    }

    /// Get a reference to the checkout flow.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutFlow {
        &self.inner.checkout
    }
}
