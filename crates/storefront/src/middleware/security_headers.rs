//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. Start locked down and
//! loosen only when specific functionality requires it: the payment widget
//! needs its script, frame and API origins, and nothing else.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::checkout::gateway::GATEWAY_API_ORIGIN;
use crate::middleware::CspNonce;
use crate::state::AppState;

/// Origins the payment widget loads from or talks to.
#[must_use]
pub fn gateway_origins(state: &AppState) -> Vec<String> {
    let script_origin = state.config().gateway.script_url.origin().ascii_serialization();
    let mut origins = vec![script_origin];
    if !origins.iter().any(|o| o == GATEWAY_API_ORIGIN) {
        origins.push(GATEWAY_API_ORIGIN.to_string());
    }
    origins
}

/// Build the Content-Security-Policy header value.
///
/// ```text
/// default-src 'none';
/// script-src 'self' 'nonce-…' <gateway>;
/// style-src 'self';
/// font-src 'self';
/// img-src 'self' data: <gateway>;
/// connect-src 'self' <gateway>;
/// frame-src <gateway>;
/// object-src 'none';
/// base-uri 'self';
/// form-action 'self';
/// frame-ancestors 'none';
/// upgrade-insecure-requests
/// ```
#[must_use]
pub fn content_security_policy(gateway_origins: &[String], nonce: Option<&str>) -> String {
    let gateway = gateway_origins.join(" ");
    let nonce = nonce
        .filter(|n| !n.is_empty())
        .map(|n| format!(" 'nonce-{n}'"))
        .unwrap_or_default();

    format!(
        "default-src 'none'; \
         script-src 'self'{nonce} {gateway}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' data: {gateway}; \
         connect-src 'self' {gateway}; \
         frame-src {gateway}; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'; \
         upgrade-insecure-requests"
    )
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: no-referrer` - Zero referrer leakage
/// - `Content-Security-Policy` - Strict CSP, see [`content_security_policy`]
/// - `Permissions-Policy` - Deny sensitive features, allow `payment` for the gateway
/// - `Cache-Control: no-store, max-age=0` - Prevent caching sensitive data
/// - `Cross-Origin-Opener-Policy: same-origin-allow-popups` - Isolation that
///   still lets the widget open bank/UPI popups
/// - `Cross-Origin-Resource-Policy: same-origin` - Resource isolation
/// - `X-DNS-Prefetch-Control: off` - Prevent DNS prefetch leakage
///
/// Runs inside the CSP nonce middleware so the nonce is in the request
/// extensions.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let nonce = request
        .extensions()
        .get::<CspNonce>()
        .map(|n| n.value().to_string());
    let origins = gateway_origins(&state);

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    match HeaderValue::from_str(&content_security_policy(&origins, nonce.as_deref())) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => {
            tracing::error!("Invalid Content-Security-Policy header: {e}");
            headers.insert(
                CONTENT_SECURITY_POLICY,
                HeaderValue::from_static("default-src 'self'; frame-ancestors 'none'"),
            );
        }
    }

    let payment_allow = origins
        .iter()
        .map(|o| format!("\"{o}\""))
        .collect::<Vec<_>>()
        .join(" ");
    let permissions = format!(
        "accelerometer=(), \
         camera=(), \
         display-capture=(), \
         geolocation=(), \
         gyroscope=(), \
         magnetometer=(), \
         microphone=(), \
         payment=(self {payment_allow}), \
         publickey-credentials-get=(), \
         usb=(), \
         xr-spatial-tracking=()"
    );
    if let Ok(value) = HeaderValue::from_str(&permissions) {
        headers.insert(HeaderName::from_static("permissions-policy"), value);
    }

    headers.insert(
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static("no-store, max-age=0"),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}
