//! Checkout route handlers.
//!
//! Every outcome of a checkout attempt ends in a redirect or a re-rendered
//! form carrying a notice; nothing here fails the request outright except a
//! broken session store.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use quickbite_core::{Cart, PaymentMethod};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use crate::checkout::error::SIGN_IN_FIRST;
use crate::checkout::form::FieldView;
use crate::checkout::{CheckoutError, CheckoutForm, PaymentReceipt, Submission, WidgetOutcome};
use crate::error::Result;
use crate::filters;
use crate::middleware::{CspNonce, OptionalCustomer};
use crate::models::session::{
    clear_cart, load_cart, peek_payment_attempt, push_notice, store_payment_attempt,
    take_notice, take_payment_attempt,
};
use crate::models::views::TotalsView;
use crate::models::Notice;
use crate::state::AppState;

/// Delivery form page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/form.html")]
pub struct CheckoutFormTemplate<'a> {
    pub fields: Vec<FieldView<'a>>,
    pub payment: &'static str,
    pub submit_label: &'static str,
    pub submission_id: String,
    pub totals: TotalsView,
    pub invalid_field: Option<&'static str>,
    pub notice: Option<Notice>,
    pub cart_count: u32,
}

impl CheckoutFormTemplate<'_> {
    /// Whether `name` is the field that failed validation.
    fn is_invalid(&self, name: &str) -> bool {
        self.invalid_field == Some(name)
    }
}

/// Payment widget page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub amount: String,
    pub options_json: String,
    pub nonce: String,
    pub notice: Option<Notice>,
    pub cart_count: u32,
}

/// Fields posted back by the widget's success handler.
#[derive(Debug, Default, Deserialize)]
pub struct CompletionForm {
    pub razorpay_payment_id: Option<String>,
    pub razorpay_order_id: Option<String>,
    pub razorpay_signature: Option<String>,
}

impl CompletionForm {
    /// A receipt if all three fields are present, otherwise a failed payment.
    fn into_outcome(self) -> WidgetOutcome {
        let present = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        match (
            present(self.razorpay_payment_id),
            present(self.razorpay_order_id),
            present(self.razorpay_signature),
        ) {
            (Some(payment_id), Some(order_id), Some(signature)) => {
                WidgetOutcome::Success(PaymentReceipt {
                    razorpay_payment_id: payment_id.into(),
                    razorpay_order_id: order_id.into(),
                    razorpay_signature: signature,
                })
            }
            _ => WidgetOutcome::Failed("Invalid payment gateway response".to_string()),
        }
    }
}

/// Fields posted back when the widget is dismissed or the payment fails.
#[derive(Debug, Default, Deserialize)]
pub struct CancelForm {
    pub reason: Option<String>,
}

/// Display the delivery form.
///
/// Guests are sent back to the cart with a sign-in notice; a cart with
/// nothing to charge for (empty, or only free items) goes back silently.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    customer: OptionalCustomer,
) -> Response {
    if customer.0.is_none() {
        push_notice(&session, Notice::error(SIGN_IN_FIRST)).await;
        return Redirect::to("/cart").into_response();
    }

    let cart = load_cart(&session).await;
    if cart.has_zero_total() {
        return Redirect::to("/cart").into_response();
    }

    let form = CheckoutForm::new();
    let notice = take_notice(&session).await;
    render_form(&state, &form, &cart, notice, None)
}

/// Submit the delivery form.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    customer: OptionalCustomer,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let form = CheckoutForm::from_pairs(pairs);
    let cart = load_cart(&session).await;

    match state.checkout().submit(&form, &cart, customer.secret()).await {
        Ok(Submission::Placed(confirmation)) => {
            clear_cart(&session).await?;
            push_notice(&session, Notice::success(confirmation.message)).await;
            Ok(Redirect::to("/myorders").into_response())
        }
        Ok(Submission::AwaitingPayment(attempt)) => {
            store_payment_attempt(&session, &attempt).await?;
            Ok(Redirect::to("/checkout/payment").into_response())
        }
        Err(e) => {
            e.report();
            match &e {
                CheckoutError::Unauthenticated => {
                    push_notice(&session, Notice::error(e.user_message())).await;
                    Ok(Redirect::to("/cart").into_response())
                }
                CheckoutError::EmptyCart => Ok(Redirect::to("/cart").into_response()),
                CheckoutError::DuplicateSubmission => {
                    push_notice(&session, Notice::error(e.user_message())).await;
                    Ok(Redirect::to("/checkout/payment").into_response())
                }
                CheckoutError::Validation(validation) => {
                    let invalid = validation.field().map(|f| f.name());
                    let mut response = render_form(
                        &state,
                        &form,
                        &cart,
                        Some(Notice::error(e.user_message())),
                        invalid,
                    );
                    *response.status_mut() = StatusCode::UNPROCESSABLE_ENTITY;
                    Ok(response)
                }
                _ => Ok(render_form(
                    &state,
                    &form,
                    &cart,
                    Some(Notice::error(e.user_message())),
                    None,
                )),
            }
        }
    }
}

/// Display the payment widget for the attempt in progress.
///
/// Without an attempt there is nothing to pay; the customer is sent back to
/// the delivery form (which in turn sends them to the cart if it is empty).
#[instrument(skip_all)]
pub async fn payment(
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<Response> {
    let Some(attempt) = peek_payment_attempt(&session).await else {
        return Ok(Redirect::to("/checkout").into_response());
    };

    let options_json = filters::script_json(&attempt.options)
        .map_err(|e| crate::error::AppError::Internal(format!("widget options: {e}")))?;

    Ok(PaymentTemplate {
        amount: attempt.pending.money().display(),
        options_json,
        nonce,
        notice: take_notice(&session).await,
        cart_count: load_cart(&session).await.item_count(),
    }
    .into_response())
}

/// Serve the gateway widget script from our own origin.
///
/// The script is fetched from the gateway once per process and shared.
#[instrument(skip_all)]
pub async fn gateway_script(State(state): State<AppState>) -> Response {
    match state.checkout().script().ensure_loaded().await {
        Ok(body) => (
            [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            e.report();
            (StatusCode::BAD_GATEWAY, e.user_message()).into_response()
        }
    }
}

/// The widget's success handler posted its receipt.
#[instrument(skip_all)]
pub async fn complete(
    State(state): State<AppState>,
    session: Session,
    customer: OptionalCustomer,
    Form(form): Form<CompletionForm>,
) -> Result<Response> {
    let attempt = take_payment_attempt(&session).await?;
    let outcome = form.into_outcome();

    match state
        .checkout()
        .complete_payment(attempt, outcome, customer.secret())
        .await
    {
        Ok(confirmation) => {
            clear_cart(&session).await?;
            push_notice(&session, Notice::success(confirmation.message)).await;
            Ok(Redirect::to("/myorders").into_response())
        }
        Err(e) => {
            e.report();
            push_notice(&session, Notice::error(e.user_message())).await;
            Ok(Redirect::to("/checkout").into_response())
        }
    }
}

/// The widget was dismissed or reported a failed payment.
#[instrument(skip_all)]
pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    customer: OptionalCustomer,
    Form(form): Form<CancelForm>,
) -> Result<Response> {
    let attempt = take_payment_attempt(&session).await?;
    let outcome = WidgetOutcome::from_cancel_reason(form.reason.as_deref());

    let message = match state
        .checkout()
        .complete_payment(attempt, outcome, customer.secret())
        .await
    {
        Ok(confirmation) => confirmation.message,
        Err(e) => {
            e.report();
            e.user_message()
        }
    };

    push_notice(&session, Notice::error(message)).await;
    Ok(Redirect::to("/checkout").into_response())
}

fn render_form(
    state: &AppState,
    form: &CheckoutForm,
    cart: &Cart,
    notice: Option<Notice>,
    invalid_field: Option<&'static str>,
) -> Response {
    let pricing = &state.config().pricing;
    let method: PaymentMethod = form.payment_method();

    CheckoutFormTemplate {
        fields: form.fields(),
        payment: method.as_str(),
        submit_label: method.submit_label(),
        submission_id: Uuid::new_v4().to_string(),
        totals: TotalsView::new(cart, pricing.delivery_fee, pricing.currency),
        invalid_field,
        notice,
        cart_count: cart.item_count(),
    }
    .into_response()
}
