//! CSP nonce middleware.
//!
//! Each request gets a fresh random nonce. Pages put it on the `<script>`
//! tags they emit (the payment page's options block and loader), and the
//! security headers middleware puts it in `script-src`.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Per-request script nonce, base64 of 16 random bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// A fresh nonce from the thread-local RNG.
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(STANDARD.encode(bytes))
    }

    /// The nonce as it goes into `nonce="..."` and `'nonce-...'`.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Put a new [`CspNonce`] in the request extensions.
///
/// Layered outside `security_headers_middleware`, which reads it back when
/// building the policy.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    let nonce = CspNonce::generate();
    request.extensions_mut().insert(nonce);
    next.run(request).await
}

impl<S: Send + Sync> FromRequestParts<S> for CspNonce {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(nonce) = parts.extensions.get::<Self>() {
            return Ok(nonce.clone());
        }

        // An empty nonce matches no script, so inline scripts stay blocked.
        tracing::warn!("CSP nonce missing from request extensions");
        Ok(Self(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_are_unique() {
        assert_ne!(CspNonce::generate(), CspNonce::generate());
    }

    #[test]
    fn test_nonce_is_128_bits() {
        let nonce = CspNonce::generate();
        let decoded = STANDARD.decode(nonce.value()).unwrap_or_default();
        assert_eq!(decoded.len(), 16);
    }
}
