//! Session-related types.
//!
//! Everything the storefront remembers about a visitor between requests lives
//! in the session: the cart, a pending online payment, and the next notice to
//! show.

use quickbite_core::Cart;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::checkout::PaymentAttempt;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    /// A success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// An error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Returns `true` for error notices (used by templates for styling).
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Session keys.
pub mod keys {
    /// Key for the visitor's cart.
    pub const CART: &str = "cart";

    /// Key for the online payment waiting on the gateway widget.
    pub const PAYMENT_ATTEMPT: &str = "payment_attempt";

    /// Key for the notice to show on the next page.
    pub const NOTICE: &str = "notice";
}

/// Load the cart from the session, or an empty cart.
pub async fn load_cart(session: &Session) -> Cart {
    match session.get::<Cart>(keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read cart from session: {e}");
            Cart::new()
        }
    }
}

/// Save the cart to the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, cart).await
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_cart(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<Cart>(keys::CART).await?;
    Ok(())
}

/// Queue a notice for the next rendered page, replacing any earlier one.
pub async fn push_notice(session: &Session, notice: Notice) {
    if let Err(e) = session.insert(keys::NOTICE, &notice).await {
        tracing::warn!("Failed to store notice in session: {e}");
    }
}

/// Take the queued notice, if any. A notice is shown only once.
pub async fn take_notice(session: &Session) -> Option<Notice> {
    session.remove::<Notice>(keys::NOTICE).await.ok().flatten()
}

/// Remember the payment attempt the gateway widget is about to collect.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_payment_attempt(
    session: &Session,
    attempt: &PaymentAttempt,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::PAYMENT_ATTEMPT, attempt).await
}

/// Take the payment attempt out of the session.
///
/// The attempt is removed in the same step, so later requests find nothing.
/// Requests already in flight hold their own copy; `complete_payment`
/// claims the gateway order to settle those.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn take_payment_attempt(
    session: &Session,
) -> Result<Option<PaymentAttempt>, tower_sessions::session::Error> {
    session.remove::<PaymentAttempt>(keys::PAYMENT_ATTEMPT).await
}

/// Read the payment attempt without consuming it.
pub async fn peek_payment_attempt(session: &Session) -> Option<PaymentAttempt> {
    session
        .get::<PaymentAttempt>(keys::PAYMENT_ATTEMPT)
        .await
        .ok()
        .flatten()
}
