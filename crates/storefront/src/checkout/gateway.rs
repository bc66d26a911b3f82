//! Payment gateway adapter.
//!
//! Turns the order service's answer to an online order into a
//! [`PendingPayment`] plus the options the gateway widget is opened with,
//! serves the widget script from our own origin, and tracks an attempt's
//! progress through [`GatewayState`].
//!
//! # Lifecycle
//!
//! ```text
//! Idle --ScriptRequested--> ScriptLoading --ScriptLoaded--> WidgetOpen
//!                                 |                           |   |  \
//!                            ScriptFailed          WidgetSucceeded |  WidgetDismissed
//!                                 v                           v   |   WidgetFailed
//!                          Resolved(Error)               Verifying |        v
//!                                                 Verified /   \ VerificationFailed
//!                                                         v     v
//!                                          Resolved(Success)  Resolved(Error)
//! ```

use std::fmt;
use std::time::Duration;

use axum::body::Bytes;
use quickbite_core::{
    CurrencyCode, DeliveryAddress, GatewayOrderId, GatewayPaymentId, Money, OrderId,
    PendingPayment,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::instrument;
use url::Url;

use crate::checkout::CheckoutError;
use crate::config::{GatewayConfig, PricingConfig};
use crate::services::orders::OnlineOrder;

/// Description shown in the widget.
const PAYMENT_DESCRIPTION: &str = "Order Payment";

/// Gateway API origin the widget talks to from inside its frame.
pub const GATEWAY_API_ORIGIN: &str = "https://api.razorpay.com";

// =============================================================================
// State machine
// =============================================================================

/// How a payment attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Success,
    Error(String),
    Cancelled,
}

/// Where a payment attempt is.
///
/// Stored on the [`PaymentAttempt`] in the session, so a completion is
/// checked against the state the attempt was actually left in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GatewayState {
    #[default]
    Idle,
    ScriptLoading,
    WidgetOpen,
    Verifying,
    Resolved(Resolution),
}

/// Something that happened to a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    ScriptRequested,
    ScriptLoaded,
    ScriptFailed(String),
    WidgetSucceeded,
    WidgetDismissed,
    WidgetFailed(String),
    Verified,
    VerificationFailed(String),
}

/// An event that makes no sense in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid gateway transition: {event:?} in state {state:?}")]
pub struct InvalidTransition {
    pub state: GatewayState,
    pub event: GatewayEvent,
}

impl GatewayState {
    /// Apply an event.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] if the event is not allowed in this
    /// state. Resolved states accept no events.
    pub fn advance(self, event: GatewayEvent) -> Result<Self, InvalidTransition> {
        use GatewayEvent as E;

        let next = match (&self, &event) {
            (Self::Idle, E::ScriptRequested) => Self::ScriptLoading,
            (Self::ScriptLoading, E::ScriptLoaded) => Self::WidgetOpen,
            (Self::ScriptLoading, E::ScriptFailed(reason)) => {
                Self::Resolved(Resolution::Error(reason.clone()))
            }
            (Self::WidgetOpen, E::WidgetSucceeded) => Self::Verifying,
            (Self::WidgetOpen, E::WidgetDismissed | E::WidgetFailed(_)) => {
                Self::Resolved(Resolution::Cancelled)
            }
            (Self::Verifying, E::Verified) => Self::Resolved(Resolution::Success),
            (Self::Verifying, E::VerificationFailed(reason)) => {
                Self::Resolved(Resolution::Error(reason.clone()))
            }
            _ => return Err(InvalidTransition { state: self, event }),
        };

        tracing::debug!(from = ?self, to = ?next, "Gateway state change");
        Ok(next)
    }
}

// =============================================================================
// Widget completion
// =============================================================================

/// What the widget hands back after a successful payment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentReceipt {
    pub razorpay_payment_id: GatewayPaymentId,
    pub razorpay_order_id: GatewayOrderId,
    pub razorpay_signature: String,
}

/// How the widget finished. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetOutcome {
    Success(PaymentReceipt),
    Cancelled,
    Failed(String),
}

impl WidgetOutcome {
    /// Outcome of a cancel callback: a failure if the gateway gave a reason,
    /// otherwise a plain dismissal.
    #[must_use]
    pub fn from_cancel_reason(reason: Option<&str>) -> Self {
        match reason.map(str::trim).filter(|r| !r.is_empty()) {
            Some(reason) => Self::Failed(reason.to_string()),
            None => Self::Cancelled,
        }
    }

    /// The event this outcome feeds into [`GatewayState::advance`].
    #[must_use]
    pub fn event(&self) -> GatewayEvent {
        match self {
            Self::Success(_) => GatewayEvent::WidgetSucceeded,
            Self::Cancelled => GatewayEvent::WidgetDismissed,
            Self::Failed(reason) => GatewayEvent::WidgetFailed(reason.clone()),
        }
    }
}

// =============================================================================
// Widget options
// =============================================================================

/// Options the widget is constructed with, serialized as the widget expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetOptions {
    pub key: String,
    /// Amount in minor units.
    pub amount: u64,
    pub currency: CurrencyCode,
    pub name: String,
    pub description: String,
    pub order_id: GatewayOrderId,
    pub prefill: Prefill,
    pub notes: Notes,
    pub theme: Theme,
}

/// Payer details pre-filled in the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

/// Free-form notes attached to the gateway payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notes {
    pub order_id: OrderId,
}

/// Widget colours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub color: String,
}

/// An online payment in progress: what to verify against, what to open
/// the widget with, and how far it got. Lives in the session until the
/// widget reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub pending: PendingPayment,
    pub options: WidgetOptions,
    /// `WidgetOpen` for every attempt handed to the payment page.
    pub state: GatewayState,
}

// =============================================================================
// Script
// =============================================================================

/// The gateway's widget script, fetched once per process.
///
/// Callers share a single fetch: concurrent [`GatewayScript::ensure_loaded`]
/// calls wait on the same initialization. A failed fetch is not remembered,
/// so the next caller tries again.
pub struct GatewayScript {
    url: Url,
    client: reqwest::Client,
    body: OnceCell<Bytes>,
}

impl GatewayScript {
    /// Create a loader for the script at `url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url,
            client,
            body: OnceCell::new(),
        })
    }

    /// The script, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::GatewayUnavailable`] if the script cannot be
    /// fetched.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn ensure_loaded(&self) -> Result<Bytes, CheckoutError> {
        self.body
            .get_or_try_init(|| async {
                tracing::info!("Fetching payment gateway script");
                let response = self
                    .client
                    .get(self.url.clone())
                    .send()
                    .await
                    .map_err(|e| CheckoutError::GatewayUnavailable(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(CheckoutError::GatewayUnavailable(format!(
                        "script request returned {status}"
                    )));
                }

                let body = response
                    .bytes()
                    .await
                    .map_err(|e| CheckoutError::GatewayUnavailable(e.to_string()))?;
                if body.is_empty() {
                    return Err(CheckoutError::GatewayUnavailable(
                        "script is empty".to_string(),
                    ));
                }

                Ok(body)
            })
            .await
            .cloned()
    }

    /// Returns `true` once the script has been fetched.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.body.initialized()
    }

}

impl fmt::Debug for GatewayScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayScript")
            .field("url", &self.url.as_str())
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// Builds payment attempts from order service responses.
#[derive(Debug, Clone)]
pub struct PaymentGateway {
    config: GatewayConfig,
    pricing: PricingConfig,
}

impl PaymentGateway {
    #[must_use]
    pub const fn new(config: GatewayConfig, pricing: PricingConfig) -> Self {
        Self { config, pricing }
    }

    /// Check an online order response and extract the pending payment.
    ///
    /// The response must name the gateway order, our order, the amount and
    /// the currency. The widget key comes from the response, falling back to
    /// configuration. `expected` is the draft total, used only to flag a
    /// mismatch in the logs: the gateway charges what the service created.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::GatewayConfig`] naming the first missing or
    /// unusable field.
    pub fn pending_payment(
        &self,
        order: &OnlineOrder,
        expected: Decimal,
    ) -> Result<PendingPayment, CheckoutError> {
        let missing = |what: &str| CheckoutError::GatewayConfig(format!("response has no {what}"));

        let gateway_order_id = order
            .gateway_order_id()
            .ok_or_else(|| missing("gateway order id"))?;
        let order_id = order.order_id().ok_or_else(|| missing("order id"))?;
        let amount_minor = order
            .amount_minor()
            .ok_or_else(|| missing("amount"))?
            .ok_or_else(|| CheckoutError::GatewayConfig("amount is not a whole number".to_string()))?;
        let code = order.currency_code().ok_or_else(|| missing("currency"))?;
        let currency = CurrencyCode::from_code(code)
            .ok_or_else(|| CheckoutError::GatewayConfig(format!("unsupported currency '{code}'")))?;
        let key_id = order
            .razorpay_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .or_else(|| self.config.key_id.clone())
            .ok_or_else(|| CheckoutError::GatewayConfig("no gateway key configured".to_string()))?;

        if currency != self.pricing.currency {
            tracing::warn!(
                store_currency = %self.pricing.currency,
                gateway_currency = %currency,
                "Gateway order currency differs from store currency"
            );
        }
        let expected_minor = Money::new(expected, self.pricing.currency).minor_units();
        if expected_minor != Some(amount_minor) {
            tracing::warn!(
                expected = ?expected_minor,
                gateway_amount = amount_minor,
                "Gateway order amount differs from cart total"
            );
        }

        Ok(PendingPayment {
            order_id,
            gateway_order_id,
            key_id,
            amount_minor,
            currency,
        })
    }

    /// Widget options for a pending payment, pre-filled with the payer's
    /// details.
    #[must_use]
    pub fn widget_options(
        &self,
        pending: &PendingPayment,
        address: &DeliveryAddress,
    ) -> WidgetOptions {
        WidgetOptions {
            key: pending.key_id.clone(),
            amount: pending.amount_minor,
            currency: pending.currency,
            name: self.config.merchant_name.clone(),
            description: PAYMENT_DESCRIPTION.to_string(),
            order_id: pending.gateway_order_id.clone(),
            prefill: Prefill {
                name: address.full_name(),
                email: address.email.as_str().to_owned(),
                contact: address.phone.clone(),
            },
            notes: Notes {
                order_id: pending.order_id.clone(),
            },
            theme: Theme {
                color: self.config.theme_color.clone(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use quickbite_core::AddressField;
    use serde_json::json;

    use super::*;

    fn gateway(key_id: Option<&str>) -> PaymentGateway {
        PaymentGateway::new(
            GatewayConfig {
                key_id: key_id.map(String::from),
                script_url: "https://checkout.razorpay.com/v1/checkout.js".parse().unwrap(),
                merchant_name: "QuickBite".to_string(),
                theme_color: "#3399cc".to_string(),
            },
            PricingConfig {
                currency: CurrencyCode::INR,
                delivery_fee: Decimal::from(50),
            },
        )
    }

    fn online(value: serde_json::Value) -> OnlineOrder {
        serde_json::from_value(value).unwrap()
    }

    fn address() -> DeliveryAddress {
        DeliveryAddress::validated(|field| match field {
            AddressField::FirstName => "Ravi",
            AddressField::LastName => "Kumar",
            AddressField::Email => "ravi@quickbite.in",
            AddressField::Phone => "9876543210",
            _ => "x",
        })
        .unwrap()
    }

    #[test]
    fn test_happy_path_transitions() {
        let state = GatewayState::Idle
            .advance(GatewayEvent::ScriptRequested)
            .unwrap()
            .advance(GatewayEvent::ScriptLoaded)
            .unwrap()
            .advance(GatewayEvent::WidgetSucceeded)
            .unwrap()
            .advance(GatewayEvent::Verified)
            .unwrap();
        assert_eq!(state, GatewayState::Resolved(Resolution::Success));
    }

    #[test]
    fn test_script_failure_resolves_with_error() {
        let state = GatewayState::ScriptLoading
            .advance(GatewayEvent::ScriptFailed("timeout".to_string()))
            .unwrap();
        assert_eq!(
            state,
            GatewayState::Resolved(Resolution::Error("timeout".to_string()))
        );
    }

    #[test]
    fn test_dismissal_skips_verification() {
        let state = GatewayState::WidgetOpen
            .advance(GatewayEvent::WidgetDismissed)
            .unwrap();
        assert_eq!(state, GatewayState::Resolved(Resolution::Cancelled));
        assert!(state.advance(GatewayEvent::Verified).is_err());
    }

    #[test]
    fn test_cannot_verify_before_widget() {
        let err = GatewayState::Idle
            .advance(GatewayEvent::WidgetSucceeded)
            .unwrap_err();
        assert_eq!(err.state, GatewayState::Idle);
    }

    #[test]
    fn test_state_survives_the_session() {
        let state = GatewayState::Resolved(Resolution::Error("declined".to_string()));
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(serde_json::from_str::<GatewayState>(&json).unwrap(), state);
    }

    #[test]
    fn test_cancel_reason() {
        assert_eq!(WidgetOutcome::from_cancel_reason(None), WidgetOutcome::Cancelled);
        assert_eq!(WidgetOutcome::from_cancel_reason(Some(" ")), WidgetOutcome::Cancelled);
        assert_eq!(
            WidgetOutcome::from_cancel_reason(Some("Card declined")),
            WidgetOutcome::Failed("Card declined".to_string())
        );
    }

    #[test]
    fn test_pending_payment_from_nested_response() {
        let pending = gateway(Some("rzp_test_cfg"))
            .pending_payment(
                &online(json!({
                    "razorpayOrder": {"id": "order_N1", "amount": 29000, "currency": "INR"},
                    "mongoOrderId": "665f",
                })),
                Decimal::from(290),
            )
            .unwrap();

        assert_eq!(pending.gateway_order_id.as_str(), "order_N1");
        assert_eq!(pending.order_id.as_str(), "665f");
        assert_eq!(pending.amount_minor, 29000);
        assert_eq!(pending.key_id, "rzp_test_cfg");
    }

    #[test]
    fn test_response_key_wins_over_config() {
        let pending = gateway(Some("rzp_test_cfg"))
            .pending_payment(
                &online(json!({
                    "razorpayOrderId": "order_N1",
                    "orderId": "665f",
                    "razorpayKey": "rzp_test_resp",
                    "amount": 29000,
                    "currency": "INR",
                })),
                Decimal::from(290),
            )
            .unwrap();
        assert_eq!(pending.key_id, "rzp_test_resp");
    }

    #[test]
    fn test_missing_gateway_order_id() {
        let err = gateway(Some("rzp_test_cfg"))
            .pending_payment(
                &online(json!({"mongoOrderId": "665f", "amount": 29000, "currency": "INR"})),
                Decimal::from(290),
            )
            .unwrap_err();
        assert!(matches!(err, CheckoutError::GatewayConfig(ref m) if m.contains("gateway order id")));
    }

    #[test]
    fn test_missing_key_everywhere() {
        let err = gateway(None)
            .pending_payment(
                &online(json!({
                    "razorpayOrder": {"id": "order_N1"},
                    "mongoOrderId": "665f",
                    "amount": 29000,
                    "currency": "INR",
                })),
                Decimal::from(290),
            )
            .unwrap_err();
        assert!(matches!(err, CheckoutError::GatewayConfig(_)));
    }

    #[test]
    fn test_missing_currency() {
        let err = gateway(Some("k"))
            .pending_payment(
                &online(json!({
                    "razorpayOrder": {"id": "order_N1", "amount": 29000},
                    "mongoOrderId": "665f",
                })),
                Decimal::from(290),
            )
            .unwrap_err();
        assert!(matches!(err, CheckoutError::GatewayConfig(ref m) if m.contains("currency")));
    }

    #[test]
    fn test_widget_options_wire_format() {
        let gateway = gateway(Some("rzp_test_cfg"));
        let pending = PendingPayment {
            order_id: OrderId::new("665f"),
            gateway_order_id: GatewayOrderId::new("order_N1"),
            key_id: "rzp_test_cfg".to_string(),
            amount_minor: 29000,
            currency: CurrencyCode::INR,
        };

        let options = gateway.widget_options(&pending, &address());
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({
                "key": "rzp_test_cfg",
                "amount": 29000,
                "currency": "INR",
                "name": "QuickBite",
                "description": "Order Payment",
                "order_id": "order_N1",
                "prefill": {
                    "name": "Ravi Kumar",
                    "email": "ravi@quickbite.in",
                    "contact": "9876543210",
                },
                "notes": {"order_id": "665f"},
                "theme": {"color": "#3399cc"},
            })
        );
    }
}
