//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page (hero header)
//! GET  /health                    - Health check
//!
//! # Cart
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add one unit of a menu item
//! POST /cart/remove               - Remove one unit (line dropped at zero)
//!
//! # Checkout
//! GET  /checkout                  - Delivery form
//! POST /checkout                  - Submit order
//! GET  /checkout/payment          - Payment widget for the attempt in progress
//! GET  /checkout/gateway.js       - Gateway widget script (fetched once, served same-origin)
//! POST /checkout/payment/complete - Widget success callback, verifies the payment
//! POST /checkout/payment/cancel   - Widget dismissed or payment failed
//!
//! # Orders
//! GET  /myorders                  - Order history
//! ```

pub mod cart;
pub mod checkout;
pub mod home;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::submit))
        .route("/payment", get(checkout::payment))
        .route("/gateway.js", get(checkout::gateway_script))
        .route("/payment/complete", post(checkout::complete))
        .route("/payment/cancel", post(checkout::cancel))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(home::health))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/myorders", get(orders::index))
}
