//! Checkout: delivery form, order submission and online payment.
//!
//! # Flow
//!
//! ```text
//! POST /checkout ──> CheckoutFlow::submit
//!                      ├─ cash on delivery ──> order placed, cart cleared, /myorders
//!                      └─ online ──> PaymentAttempt stored in session
//!                                      └─> GET /checkout/payment (widget)
//!                                            ├─ POST /checkout/payment/complete
//!                                            │     └─> CheckoutFlow::complete_payment
//!                                            └─ POST /checkout/payment/cancel
//! ```

pub mod error;
pub mod flow;
pub mod form;
pub mod gateway;
pub mod guard;

pub use error::CheckoutError;
pub use flow::{CheckoutFlow, OrderConfirmation, Submission};
pub use form::{CheckoutForm, UnknownField, ValidationError};
pub use gateway::{
    GatewayEvent, GatewayScript, GatewayState, PaymentAttempt, PaymentGateway, PaymentReceipt,
    Resolution, WidgetOptions, WidgetOutcome,
};
pub use guard::SubmissionGuard;
