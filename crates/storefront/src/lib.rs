//! QuickBite storefront library.
//!
//! The binary in `main.rs` only wires up logging, Sentry and the listener;
//! everything that serves requests lives here so it can be driven in-process
//! by the integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, middleware::from_fn, middleware::from_fn_with_state};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Directory holding `checkout.js` and stylesheets.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the storefront router with its full middleware stack.
///
/// Sentry layers are added last so they wrap everything else; see
/// [`middleware`] for the order.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::security_headers_middleware,
        ))
        .layer(from_fn(middleware::csp_nonce_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use quickbite_core::CurrencyCode;
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{
        GatewayConfig, OrderServiceConfig, PricingConfig, SentryConfig, StorefrontConfig,
    };

    fn test_app() -> Router {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            auth_cookie_name: "token".to_string(),
            orders: OrderServiceConfig {
                api_url: "http://127.0.0.1:9".parse().unwrap(),
                timeout: Duration::from_secs(1),
            },
            gateway: GatewayConfig {
                key_id: None,
                script_url: config::DEFAULT_GATEWAY_SCRIPT_URL.parse().unwrap(),
                merchant_name: "QuickBite".to_string(),
                theme_color: "#3399cc".to_string(),
            },
            pricing: PricingConfig {
                currency: CurrencyCode::INR,
                delivery_fee: Decimal::from(50),
            },
            sentry: SentryConfig::default(),
        };
        app(AppState::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_health_carries_stack_headers() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let csp = response.headers()["content-security-policy"].to_str().unwrap();
        assert!(csp.contains("https://checkout.razorpay.com"));
    }

    #[tokio::test]
    async fn test_payment_page_without_attempt_redirects() {
        let response = test_app()
            .oneshot(Request::get("/checkout/payment").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/checkout");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = test_app()
            .oneshot(Request::get("/wp-admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
