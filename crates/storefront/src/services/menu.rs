//! Cached view of the order service's menu.
//!
//! The cart only stores what the visitor picked; names and prices come from
//! the menu. The menu is fetched once and cached for 5 minutes.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use quickbite_core::FoodId;
use thiserror::Error;
use tracing::instrument;

use crate::services::orders::{BackendResult, FoodItem, OrderClient, OrderServiceError};

/// Cache key of the whole menu; the service has no per-item endpoint.
const MENU_KEY: &str = "menu";

/// Errors loading the menu.
#[derive(Debug, Error, Clone)]
pub enum MenuError {
    /// The order service could not be reached or answered garbage.
    #[error("order service error: {0}")]
    Service(Arc<OrderServiceError>),

    /// The order service refused to list the menu.
    #[error("menu unavailable: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),
}

/// Menu lookups backed by a short-lived cache.
#[derive(Clone)]
pub struct MenuService {
    inner: Arc<MenuServiceInner>,
}

struct MenuServiceInner {
    orders: OrderClient,
    cache: Cache<&'static str, Arc<Vec<FoodItem>>>,
}

impl MenuService {
    /// Create a menu service on top of an order client.
    #[must_use]
    pub fn new(orders: OrderClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(MenuServiceInner { orders, cache }),
        }
    }

    /// The full menu.
    ///
    /// Concurrent callers on a cold cache share one fetch. Failures are not
    /// cached.
    ///
    /// # Errors
    ///
    /// Returns error if the menu cannot be fetched.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Arc<Vec<FoodItem>>, MenuError> {
        let orders = self.inner.orders.clone();

        self.inner
            .cache
            .try_get_with(MENU_KEY, async move {
                match orders.food_list().await {
                    Ok(BackendResult::Ok(items)) => {
                        tracing::debug!(count = items.len(), "Fetched menu");
                        Ok(Arc::new(items))
                    }
                    Ok(BackendResult::Rejected(message)) => Err(MenuError::Rejected(message)),
                    Err(e) => Err(MenuError::Service(Arc::new(e))),
                }
            })
            .await
            .map_err(|e: Arc<MenuError>| (*e).clone())
    }

    /// Look up one item by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the menu cannot be fetched.
    pub async fn find(&self, id: &FoodId) -> Result<Option<FoodItem>, MenuError> {
        let menu = self.list().await?;
        Ok(menu.iter().find(|item| &item.id == id).cloned())
    }

    /// Drop the cached menu.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate(MENU_KEY).await;
    }
}

impl std::fmt::Debug for MenuService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuService")
            .field("cached_entries", &self.inner.cache.entry_count())
            .finish_non_exhaustive()
    }
}
