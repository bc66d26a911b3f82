//! Customer token extractor.
//!
//! Signing in happens elsewhere; it leaves the customer's token in a cookie
//! (named by `AUTH_COOKIE_NAME`). The storefront only reads it and forwards
//! it to the order service.

use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
};
use secrecy::SecretString;
use tower_sessions::cookie::Cookie;

use crate::state::AppState;

/// The signed-in customer's order service token.
#[derive(Clone)]
pub struct CustomerToken(SecretString);

impl CustomerToken {
    /// The token, still wrapped.
    #[must_use]
    pub const fn secret(&self) -> &SecretString {
        &self.0
    }
}

impl std::fmt::Debug for CustomerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CustomerToken([REDACTED])")
    }
}

/// Extractor that optionally gets the customer token.
///
/// Never rejects: handlers decide what a missing token means.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalCustomer(token): OptionalCustomer) -> impl IntoResponse {
///     match token {
///         Some(_) => "Signed in",
///         None => "Guest visitor",
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct OptionalCustomer(pub Option<CustomerToken>);

impl OptionalCustomer {
    /// The token, if any, still wrapped.
    #[must_use]
    pub fn secret(&self) -> Option<&SecretString> {
        self.0.as_ref().map(CustomerToken::secret)
    }
}

impl FromRequestParts<AppState> for OptionalCustomer {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let name = state.config().auth_cookie_name.as_str();
        Ok(Self(token_from_cookies(parts, name)))
    }
}

/// Find a non-empty cookie called `name` across all `Cookie` headers.
fn token_from_cookies(parts: &Parts, name: &str) -> Option<CustomerToken> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|token| !token.is_empty())
        .map(|token| CustomerToken(SecretString::from(token)))
}
