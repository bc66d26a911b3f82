//! Route-level errors and Sentry helpers.
//!
//! Only failures that leave a page unrenderable end up here. Checkout
//! failures are recoverable and become notices instead; see
//! [`crate::checkout::CheckoutError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::{MenuError, OrderServiceError};

/// Errors a storefront page handler can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    /// The order service failed while loading page data.
    #[error("Order service error: {0}")]
    OrderService(#[from] OrderServiceError),

    /// Menu could not be loaded.
    #[error("Menu error: {0}")]
    Menu(#[from] MenuError),

    /// The session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Anything else on our side.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code and the text shown to the visitor. Upstream and internal
    /// details stay in the logs.
    fn public_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::OrderService(_) | Self::Menu(_) => (
                StatusCode::BAD_GATEWAY,
                "Our kitchen is not answering right now. Please try again shortly.",
            ),
            Self::Session(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let event_id = sentry::capture_error(&self);
        tracing::error!(error = %self, sentry_event_id = %event_id, "Page failed");

        self.public_parts().into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Record a checkout or cart milestone as a Sentry breadcrumb.
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Gateway order created", Some(&[("gateway_order_id", "order_N1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let data = data
        .unwrap_or_default()
        .iter()
        .map(|(key, value)| ((*key).to_owned(), serde_json::Value::from(*value)))
        .collect();

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        data,
        ..Default::default()
    });
}
