//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ORDER_API_URL` - Base URL of the order service (e.g., <https://api.quickbite.in>)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: <http://localhost:3000>)
//! - `AUTH_COOKIE_NAME` - Cookie carrying the customer's session token (default: token)
//! - `ORDER_API_TIMEOUT_SECS` - Timeout for order-creation requests (default: 30)
//! - `STORE_CURRENCY` - ISO currency code (default: INR)
//! - `DELIVERY_FEE` - Flat delivery fee in the store currency (default: 50)
//! - `GATEWAY_KEY_ID` - Payment gateway public key, used when the order service omits one
//! - `GATEWAY_SCRIPT_URL` - Widget script URL (default: <https://checkout.razorpay.com/v1/checkout.js>)
//! - `GATEWAY_MERCHANT_NAME` - Name shown in the widget (default: QuickBite)
//! - `GATEWAY_THEME_COLOR` - Widget accent colour (default: #3399cc)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use quickbite_core::CurrencyCode;
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default payment widget script.
pub const DEFAULT_GATEWAY_SCRIPT_URL: &str = "https://checkout.razorpay.com/v1/checkout.js";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Name of the cookie holding the customer's session token
    pub auth_cookie_name: String,
    /// Remote order service configuration
    pub orders: OrderServiceConfig,
    /// Payment gateway configuration
    pub gateway: GatewayConfig,
    /// Pricing configuration
    pub pricing: PricingConfig,
    /// Error tracking configuration
    pub sentry: SentryConfig,
}

/// Remote order service configuration.
#[derive(Debug, Clone)]
pub struct OrderServiceConfig {
    /// Base URL, without trailing slash
    pub api_url: Url,
    /// Timeout applied to order-creation requests
    pub timeout: Duration,
}

/// Payment gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Public key ID, used when the order service does not return one
    pub key_id: Option<String>,
    /// Where the widget script is fetched from
    pub script_url: Url,
    /// Merchant name shown in the widget
    pub merchant_name: String,
    /// Widget accent colour
    pub theme_color: String,
}

/// Store pricing configuration.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Store currency
    pub currency: CurrencyCode,
    /// Flat delivery fee, in the store currency's standard unit
    pub delivery_fee: Decimal,
}

/// Sentry configuration.
///
/// Implements `Debug` manually to redact the DSN.
#[derive(Clone, Default)]
pub struct SentryConfig {
    /// Sentry DSN (contains the project key)
    pub dsn: Option<SecretString>,
    /// Environment name (production, staging, ...)
    pub environment: Option<String>,
    /// Error event sample rate
    pub sample_rate: f32,
    /// Performance trace sample rate
    pub traces_sample_rate: f32,
}

impl std::fmt::Debug for SentryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryConfig")
            .field("dsn", &self.dsn.as_ref().map(|_| "[REDACTED]"))
            .field("environment", &self.environment)
            .field("sample_rate", &self.sample_rate)
            .field("traces_sample_rate", &self.traces_sample_rate)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_parsed_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = get_parsed_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        let auth_cookie_name = get_env_or_default("AUTH_COOKIE_NAME", "token");

        Ok(Self {
            host,
            port,
            base_url,
            auth_cookie_name,
            orders: OrderServiceConfig::from_env()?,
            gateway: GatewayConfig::from_env()?,
            pricing: PricingConfig::from_env()?,
            sentry: SentryConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl OrderServiceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url = parse_url("ORDER_API_URL", &get_required_env("ORDER_API_URL")?)?;
        let timeout_secs = get_parsed_or_default::<u64>("ORDER_API_TIMEOUT_SECS", "30")?;

        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Build the full URL of an order service endpoint.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl GatewayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let script_url = parse_url(
            "GATEWAY_SCRIPT_URL",
            &get_env_or_default("GATEWAY_SCRIPT_URL", DEFAULT_GATEWAY_SCRIPT_URL),
        )?;

        Ok(Self {
            key_id: get_optional_env("GATEWAY_KEY_ID"),
            script_url,
            merchant_name: get_env_or_default("GATEWAY_MERCHANT_NAME", "QuickBite"),
            theme_color: get_env_or_default("GATEWAY_THEME_COLOR", "#3399cc"),
        })
    }
}

impl PricingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let code = get_env_or_default("STORE_CURRENCY", "INR");
        let currency = CurrencyCode::from_code(&code).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "STORE_CURRENCY".to_string(),
                format!("unsupported currency '{code}'"),
            )
        })?;
        let delivery_fee = get_parsed_or_default::<Decimal>("DELIVERY_FEE", "50")?;
        if delivery_fee.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "DELIVERY_FEE".to_string(),
                "must not be negative".to_string(),
            ));
        }

        Ok(Self {
            currency,
            delivery_fee,
        })
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN").map(SecretString::from),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: get_parsed_or_default::<f32>("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: get_parsed_or_default::<f32>("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable parsed into `T`, falling back to `default`.
fn get_parsed_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse and validate an absolute http(s) URL.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}
