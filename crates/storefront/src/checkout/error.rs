//! Checkout failures and the notices they turn into.

use thiserror::Error;

use crate::checkout::form::ValidationError;
use crate::services::OrderServiceError;

/// Notice shown when the customer is not signed in.
pub const SIGN_IN_FIRST: &str = "to place an order sign in first";

/// Everything that can stop a checkout attempt.
///
/// None of these is fatal: each is turned into a notice by
/// [`CheckoutError::user_message`] and the customer can try again.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The delivery form is incomplete or malformed.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No customer token cookie.
    #[error("customer is not signed in")]
    Unauthenticated,

    /// Nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// The order service's answer cannot be used to open the payment widget,
    /// or no gateway key is configured.
    #[error("payment gateway misconfigured: {0}")]
    GatewayConfig(String),

    /// The gateway widget script could not be fetched.
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// The order service could not be reached.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The order service answered with something other than an envelope.
    #[error("order service error: {0}")]
    Service(#[source] OrderServiceError),

    /// The order service declined the order. Holds the notice to show.
    #[error("order rejected: {0}")]
    BackendRejection(String),

    /// The order service did not confirm the payment.
    #[error("payment verification failed: {0}")]
    VerificationFailure(String),

    /// The customer closed the payment widget.
    #[error("payment cancelled by customer")]
    UserCancelled,

    /// The gateway reported the payment as failed.
    #[error("payment failed: {0}")]
    PaymentFailed(String),

    /// The same checkout form was submitted twice.
    #[error("duplicate submission")]
    DuplicateSubmission,

    /// A widget completion arrived with no payment waiting for it.
    #[error("no pending payment")]
    NoPendingPayment,

    /// The session store failed.
    #[error("session error: {0}")]
    Session(String),
}

impl From<OrderServiceError> for CheckoutError {
    fn from(err: OrderServiceError) -> Self {
        match err {
            OrderServiceError::Http(e) => Self::Network(e),
            other => Self::Service(other),
        }
    }
}

impl From<tower_sessions::session::Error> for CheckoutError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Session(err.to_string())
    }
}

impl CheckoutError {
    /// Text of the notice shown to the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Unauthenticated => SIGN_IN_FIRST.to_string(),
            Self::EmptyCart => "Your cart is empty".to_string(),
            Self::GatewayConfig(_) => "Payment gateway configuration error".to_string(),
            Self::GatewayUnavailable(_) => "Failed to load payment gateway".to_string(),
            Self::Network(e) if e.is_timeout() => {
                "The order service took too long to respond. Please try again.".to_string()
            }
            Self::Network(_) | Self::Service(_) | Self::Session(_) => {
                "Something went wrong".to_string()
            }
            Self::BackendRejection(message) => message.clone(),
            Self::VerificationFailure(_) => "Payment verification failed".to_string(),
            Self::UserCancelled => "Payment cancelled".to_string(),
            Self::PaymentFailed(reason) => format!("Payment failed: {reason}"),
            Self::DuplicateSubmission => "This order has already been submitted".to_string(),
            Self::NoPendingPayment => {
                "No payment is in progress. Please place your order again.".to_string()
            }
        }
    }

    /// Whether this failure points at a fault on our side or a dependency's,
    /// and should be captured to Sentry.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::GatewayConfig(_)
                | Self::GatewayUnavailable(_)
                | Self::Network(_)
                | Self::Service(_)
                | Self::Session(_)
        )
    }

    /// Log the failure, capturing it to Sentry when reportable.
    pub fn report(&self) {
        if self.is_reportable() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Checkout error"
            );
        } else {
            tracing::info!(error = %self, "Checkout attempt stopped");
        }
    }
}
