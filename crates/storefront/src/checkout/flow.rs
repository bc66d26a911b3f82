//! Checkout orchestration.
//!
//! One attempt runs strictly in sequence: validate, claim the submission,
//! create the order, and for online payments make sure the widget script is
//! available before handing back what the widget needs. The widget's
//! completion comes back in a later request and is handled by
//! [`CheckoutFlow::complete_payment`].

use std::sync::Arc;

use quickbite_core::{Cart, OrderDraft, PaymentMethod};
use secrecy::SecretString;
use tracing::instrument;

use crate::checkout::form::{CheckoutForm, ValidationError};
use crate::checkout::gateway::{
    GatewayEvent, GatewayScript, GatewayState, PaymentAttempt, PaymentGateway, WidgetOutcome,
};
use crate::checkout::guard::SubmissionGuard;
use crate::checkout::CheckoutError;
use crate::config::PricingConfig;
use crate::error::add_breadcrumb;
use crate::services::orders::{BackendResult, OrderClient, VerifyPaymentRequest};

/// Notice for an accepted cash-on-delivery order.
pub const ORDER_PLACED: &str = "Order Placed";

/// Notice for a verified online payment.
pub const PAYMENT_SUCCESSFUL: &str = "Payment Successful!";

/// An order the service has accepted (and, for online orders, paid).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub method: PaymentMethod,
    pub message: String,
}

/// Result of submitting the checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Cash on delivery accepted. Clear the cart.
    Placed(OrderConfirmation),
    /// Online order created; the widget must collect the payment.
    AwaitingPayment(PaymentAttempt),
}

/// Runs checkout attempts.
#[derive(Clone)]
pub struct CheckoutFlow {
    inner: Arc<CheckoutFlowInner>,
}

struct CheckoutFlowInner {
    orders: OrderClient,
    gateway: PaymentGateway,
    script: GatewayScript,
    guard: SubmissionGuard,
    pricing: PricingConfig,
}

impl CheckoutFlow {
    #[must_use]
    pub fn new(
        orders: OrderClient,
        gateway: PaymentGateway,
        script: GatewayScript,
        guard: SubmissionGuard,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CheckoutFlowInner {
                orders,
                gateway,
                script,
                guard,
                pricing,
            }),
        }
    }

    /// The shared widget script loader.
    #[must_use]
    pub fn script(&self) -> &GatewayScript {
        &self.inner.script
    }

    /// Handle a posted checkout form.
    ///
    /// Checks happen before any network call: the customer must be signed
    /// in, the cart must have something to charge for, the form must
    /// validate, and its submission ID must not have been used.
    ///
    /// # Errors
    ///
    /// Returns the first [`CheckoutError`] hit along the way.
    #[instrument(skip_all, fields(payment = %form.payment_method()))]
    pub async fn submit(
        &self,
        form: &CheckoutForm,
        cart: &Cart,
        token: Option<&SecretString>,
    ) -> Result<Submission, CheckoutError> {
        let token = token.ok_or(CheckoutError::Unauthenticated)?;
        if cart.has_zero_total() {
            return Err(CheckoutError::EmptyCart);
        }

        let address = form.validate()?;
        let submission_id = form
            .submission_id()
            .ok_or(ValidationError::MissingSubmissionId)?;
        self.inner.guard.claim(submission_id).await?;

        let draft = OrderDraft::from_cart(address, cart, self.inner.pricing.delivery_fee)
            .ok_or(CheckoutError::EmptyCart)?;

        self.submit_order(draft, form.payment_method(), token).await
    }

    /// Send a draft to the order service.
    ///
    /// The draft is consumed: it is sent once, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::BackendRejection`] if the service declines,
    /// [`CheckoutError::GatewayConfig`] if an online order cannot be paid
    /// with what the service returned, [`CheckoutError::GatewayUnavailable`]
    /// if the widget script cannot be fetched, and network errors as-is.
    #[instrument(skip_all, fields(payment = %method, amount = %draft.amount()))]
    pub async fn submit_order(
        &self,
        draft: OrderDraft,
        method: PaymentMethod,
        token: &SecretString,
    ) -> Result<Submission, CheckoutError> {
        add_breadcrumb("checkout", &format!("Submitting {method} order"), None);

        match method {
            PaymentMethod::CashOnDelivery => self.place_cod(draft, token).await,
            PaymentMethod::Online => self.place_online(draft, token).await,
        }
    }

    async fn place_cod(
        &self,
        draft: OrderDraft,
        token: &SecretString,
    ) -> Result<Submission, CheckoutError> {
        match self.inner.orders.place_cod(token, &draft).await? {
            BackendResult::Ok(ack) => {
                tracing::info!(message = ?ack.message, "Cash on delivery order placed");
                Ok(Submission::Placed(OrderConfirmation {
                    method: PaymentMethod::CashOnDelivery,
                    message: ORDER_PLACED.to_string(),
                }))
            }
            BackendResult::Rejected(reason) => {
                tracing::warn!(reason = ?reason, "Cash on delivery order rejected");
                Err(CheckoutError::BackendRejection(
                    "Order placement failed".to_string(),
                ))
            }
        }
    }

    async fn place_online(
        &self,
        draft: OrderDraft,
        token: &SecretString,
    ) -> Result<Submission, CheckoutError> {
        let order = match self.inner.orders.place_online(token, &draft).await? {
            BackendResult::Ok(order) => order,
            BackendResult::Rejected(reason) => {
                tracing::warn!(reason = ?reason, "Online order rejected");
                return Err(CheckoutError::BackendRejection(
                    reason.unwrap_or_else(|| "Failed to initiate payment".to_string()),
                ));
            }
        };

        let pending = self.inner.gateway.pending_payment(&order, draft.amount())?;
        add_breadcrumb(
            "checkout",
            "Gateway order created",
            Some(&[("gateway_order_id", pending.gateway_order_id.as_str())]),
        );

        let loading = advance(GatewayState::Idle, GatewayEvent::ScriptRequested)?;
        let state = match self.inner.script.ensure_loaded().await {
            Ok(_) => advance(loading, GatewayEvent::ScriptLoaded)?,
            Err(e) => {
                advance(loading, GatewayEvent::ScriptFailed(e.to_string()))?;
                return Err(e);
            }
        };

        let options = self.inner.gateway.widget_options(&pending, draft.address());
        Ok(Submission::AwaitingPayment(PaymentAttempt {
            pending,
            options,
            state,
        }))
    }

    /// Act on the widget's completion.
    ///
    /// `attempt` is the payment taken out of the session. Overlapping
    /// requests can each hold a copy of it, so the gateway order is also
    /// claimed in the [`SubmissionGuard`]: only the first completion goes on,
    /// and only a successful widget outcome reaches the order service.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NoPendingPayment`] without an attempt or when
    /// the attempt was already completed,
    /// [`CheckoutError::UserCancelled`] or [`CheckoutError::PaymentFailed`]
    /// for unsuccessful widget outcomes, and
    /// [`CheckoutError::VerificationFailure`] if the payment is not confirmed.
    #[instrument(skip_all)]
    pub async fn complete_payment(
        &self,
        attempt: Option<PaymentAttempt>,
        outcome: WidgetOutcome,
        token: Option<&SecretString>,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let attempt = attempt.ok_or(CheckoutError::NoPendingPayment)?;
        self.inner
            .guard
            .claim_completion(&attempt.pending.gateway_order_id)
            .await?;

        let pending = attempt.pending;
        let state = advance(attempt.state, outcome.event())?;

        let receipt = match outcome {
            WidgetOutcome::Success(receipt) => receipt,
            WidgetOutcome::Cancelled => {
                add_breadcrumb("checkout", "Payment widget dismissed", None);
                return Err(CheckoutError::UserCancelled);
            }
            WidgetOutcome::Failed(reason) => {
                add_breadcrumb(
                    "checkout",
                    "Payment failed in widget",
                    Some(&[("reason", reason.as_str())]),
                );
                return Err(CheckoutError::PaymentFailed(reason));
            }
        };

        let token = token.ok_or(CheckoutError::Unauthenticated)?;

        if receipt.razorpay_order_id != pending.gateway_order_id {
            tracing::warn!(
                expected = %pending.gateway_order_id,
                received = %receipt.razorpay_order_id,
                "Widget completed a different gateway order"
            );
            advance(
                state,
                GatewayEvent::VerificationFailed("gateway order mismatch".to_string()),
            )?;
            return Err(CheckoutError::VerificationFailure(
                "gateway order mismatch".to_string(),
            ));
        }

        let request = VerifyPaymentRequest {
            order_id: pending.order_id,
            razorpay_order_id: receipt.razorpay_order_id,
            razorpay_payment_id: receipt.razorpay_payment_id,
            razorpay_signature: receipt.razorpay_signature,
        };

        match self.inner.orders.verify_payment(token, &request).await {
            Ok(BackendResult::Ok(_)) => {
                advance(state, GatewayEvent::Verified)?;
                add_breadcrumb(
                    "checkout",
                    "Payment verified",
                    Some(&[("order_id", request.order_id.as_str())]),
                );
                Ok(OrderConfirmation {
                    method: PaymentMethod::Online,
                    message: PAYMENT_SUCCESSFUL.to_string(),
                })
            }
            Ok(BackendResult::Rejected(reason)) => {
                let reason = reason.unwrap_or_else(|| "not confirmed".to_string());
                advance(state, GatewayEvent::VerificationFailed(reason.clone()))?;
                Err(CheckoutError::VerificationFailure(reason))
            }
            Err(e) => {
                advance(state, GatewayEvent::VerificationFailed(e.to_string()))?;
                Err(e.into())
            }
        }
    }
}

fn advance(state: GatewayState, event: GatewayEvent) -> Result<GatewayState, CheckoutError> {
    state.advance(event).map_err(|e| {
        tracing::error!(error = %e, "Checkout reached an impossible gateway state");
        CheckoutError::Session(e.to_string())
    })
}

impl std::fmt::Debug for CheckoutFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutFlow")
            .field("gateway", &self.inner.gateway)
            .field("script", &self.inner.script)
            .field("guard", &self.inner.guard)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use quickbite_core::{CurrencyCode, FoodId};
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::checkout::gateway::{PaymentReceipt, Resolution};
    use crate::config::{GatewayConfig, OrderServiceConfig};
    use crate::services::orders::OnlineOrder;

    fn pricing() -> PricingConfig {
        PricingConfig {
            currency: CurrencyCode::INR,
            delivery_fee: Decimal::from(50),
        }
    }

    fn gateway() -> PaymentGateway {
        PaymentGateway::new(
            GatewayConfig {
                key_id: Some("rzp_test_1".to_string()),
                script_url: "https://checkout.razorpay.com/v1/checkout.js".parse().unwrap(),
                merchant_name: "QuickBite".to_string(),
                theme_color: "#3399cc".to_string(),
            },
            pricing(),
        )
    }

    fn flow(server: &MockServer) -> CheckoutFlow {
        let orders = OrderClient::new(&OrderServiceConfig {
            api_url: server.uri().parse().unwrap(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let script = GatewayScript::new(
            format!("{}/v1/checkout.js", server.uri()).parse().unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();

        CheckoutFlow::new(orders, gateway(), script, SubmissionGuard::new(), pricing())
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(FoodId::new("f1"), "Paneer Tikka", Decimal::from(150), 2);
        cart
    }

    fn form(submission_id: &str) -> CheckoutForm {
        CheckoutForm::from_pairs([
            ("firstName", "Asha"),
            ("lastName", "Rao"),
            ("email", "asha@example.com"),
            ("street", "4 Park Street"),
            ("city", "Kolkata"),
            ("state", "West Bengal"),
            ("zipcode", "700016"),
            ("country", "India"),
            ("phone", "9830012345"),
            ("payment", "cod"),
            ("submissionId", submission_id),
        ])
    }

    fn attempt() -> PaymentAttempt {
        let order: OnlineOrder = serde_json::from_value(json!({
            "razorpayOrder": { "id": "order_N1", "amount": 35000, "currency": "INR" },
            "orderId": "665f00000000000000000001"
        }))
        .unwrap();
        let gateway = gateway();
        let pending = gateway.pending_payment(&order, Decimal::from(350)).unwrap();
        let address = form(&uuid::Uuid::new_v4().to_string()).validate().unwrap();
        let options = gateway.widget_options(&pending, &address);
        PaymentAttempt {
            pending,
            options,
            state: GatewayState::WidgetOpen,
        }
    }

    fn receipt(gateway_order_id: &str) -> WidgetOutcome {
        WidgetOutcome::Success(PaymentReceipt {
            razorpay_payment_id: "pay_P1".into(),
            razorpay_order_id: gateway_order_id.into(),
            razorpay_signature: "sig".to_string(),
        })
    }

    fn token() -> SecretString {
        SecretString::from("tok_asha")
    }

    #[tokio::test]
    async fn test_missing_token_checked_before_cart() {
        let server = MockServer::start().await;
        let result = flow(&server)
            .submit(&form(&uuid::Uuid::new_v4().to_string()), &Cart::new(), None)
            .await;
        assert!(matches!(result, Err(CheckoutError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_unparseable_submission_id_is_a_validation_error() {
        let server = MockServer::start().await;
        let result = flow(&server)
            .submit(&form("not-a-uuid"), &cart(), Some(&token()))
            .await;
        assert!(matches!(
            result,
            Err(CheckoutError::Validation(ValidationError::MissingSubmissionId))
        ));
    }

    #[tokio::test]
    async fn test_cod_order_carries_total_with_delivery() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/order/placecod"))
            .and(wiremock::matchers::body_partial_json(json!({ "amount": 350.0 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let submission = flow(&server)
            .submit(&form(&uuid::Uuid::new_v4().to_string()), &cart(), Some(&token()))
            .await
            .unwrap();
        assert_eq!(
            submission,
            Submission::Placed(OrderConfirmation {
                method: PaymentMethod::CashOnDelivery,
                message: ORDER_PLACED.to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_no_attempt_means_no_pending_payment() {
        let server = MockServer::start().await;
        let result = flow(&server)
            .complete_payment(None, receipt("order_N1"), Some(&token()))
            .await;
        assert!(matches!(result, Err(CheckoutError::NoPendingPayment)));
    }

    #[tokio::test]
    async fn test_mismatched_gateway_order_is_not_verified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/order/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(0)
            .mount(&server)
            .await;

        let result = flow(&server)
            .complete_payment(Some(attempt()), receipt("order_OTHER"), Some(&token()))
            .await;
        assert!(matches!(result, Err(CheckoutError::VerificationFailure(_))));
    }

    #[tokio::test]
    async fn test_failed_widget_reports_reason() {
        let server = MockServer::start().await;
        let result = flow(&server)
            .complete_payment(
                Some(attempt()),
                WidgetOutcome::Failed("Card declined".to_string()),
                Some(&token()),
            )
            .await;
        match result {
            Err(e @ CheckoutError::PaymentFailed(_)) => {
                assert_eq!(e.user_message(), "Payment failed: Card declined");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_server_error_is_reportable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/order/verify"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = flow(&server)
            .complete_payment(Some(attempt()), receipt("order_N1"), Some(&token()))
            .await
            .unwrap_err();
        assert!(err.is_reportable());
        assert_eq!(err.user_message(), "Something went wrong");
    }

    #[tokio::test]
    async fn test_free_items_are_not_ordered() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/order/placecod"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(0)
            .mount(&server)
            .await;

        let mut free = Cart::new();
        free.add(FoodId::new("f0"), "Water", Decimal::ZERO, 2);

        let result = flow(&server)
            .submit(&form(&uuid::Uuid::new_v4().to_string()), &free, Some(&token()))
            .await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_overlapping_completions_verify_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/order/verify"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true }))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let flow = flow(&server);
        let token = token();
        let (a, b) = tokio::join!(
            flow.complete_payment(Some(attempt()), receipt("order_N1"), Some(&token)),
            flow.complete_payment(Some(attempt()), receipt("order_N1"), Some(&token))
        );

        assert!(a.is_ok() ^ b.is_ok());
        let err = a.err().or(b.err()).unwrap();
        assert!(matches!(err, CheckoutError::NoPendingPayment));
    }

    #[tokio::test]
    async fn test_resolved_attempt_is_not_verified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/order/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(0)
            .mount(&server)
            .await;

        let resolved = PaymentAttempt {
            state: GatewayState::Resolved(Resolution::Cancelled),
            ..attempt()
        };
        let result = flow(&server)
            .complete_payment(Some(resolved), receipt("order_N1"), Some(&token()))
            .await;
        assert!(result.is_err());
    }
}
