//! Integration tests for the QuickBite storefront.
//!
//! Each test spawns the full storefront router on an ephemeral port, with
//! `wiremock` servers standing in for the order service and the payment
//! gateway's script host. Requests go through a cookie-keeping `reqwest`
//! client so the session cart behaves as it does in a browser.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p quickbite-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use quickbite_core::CurrencyCode;
use quickbite_storefront::config::{
    GatewayConfig, OrderServiceConfig, PricingConfig, SentryConfig, StorefrontConfig,
};
use quickbite_storefront::state::AppState;
use reqwest::cookie::Jar;
use reqwest::{Client, Response, redirect};
use rust_decimal::Decimal;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Customer token used by signed-in tests.
pub const TOKEN: &str = "tok_ravi";

/// Menu item every test can add to the cart.
pub const BIRYANI_ID: &str = "665f1a2b3c4d5e6f7a8b9c01";

/// Complimentary menu item priced at zero.
pub const WATER_ID: &str = "665f1a2b3c4d5e6f7a8b9c02";

/// Stand-in for the gateway's widget script.
pub const WIDGET_SCRIPT: &str = "window.Razorpay = function (options) { this.options = options; };";

/// A running storefront and the mocks behind it.
pub struct TestApp {
    pub addr: SocketAddr,
    pub orders: MockServer,
    pub gateway: MockServer,
    client: Client,
    jar: Arc<Jar>,
}

impl TestApp {
    /// Start the mocks and the storefront. The menu endpoint is mounted.
    pub async fn spawn() -> Self {
        let orders = MockServer::start().await;
        let gateway = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/food/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [
                    {
                        "_id": BIRYANI_ID,
                        "name": "Chicken Biryani",
                        "price": 120,
                        "description": "Slow-cooked basmati rice with chicken",
                        "category": "Rice"
                    },
                    {
                        "_id": WATER_ID,
                        "name": "Filtered Water",
                        "price": 0,
                        "description": "On the house",
                        "category": "Drinks"
                    }
                ]
            })))
            .mount(&orders)
            .await;

        let config = config(&orders.uri(), &format!("{}/v1/checkout.js", gateway.uri()));
        let state = AppState::new(config).unwrap();
        let app = quickbite_storefront::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .redirect(redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            addr,
            orders,
            gateway,
            client,
            jar,
        }
    }

    /// Absolute URL of a storefront path.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Set the customer token cookie, as the sign-in page would.
    pub fn sign_in(&self) {
        let url: Url = self.url("/").parse().unwrap();
        self.jar.add_cookie_str(&format!("token={TOKEN}; Path=/"), &url);
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .unwrap()
    }

    /// Add one unit of the biryani to the session cart.
    pub async fn add_biryani(&self) {
        self.add_item(BIRYANI_ID).await;
    }

    /// Add one unit of a menu item to the session cart.
    pub async fn add_item(&self, item_id: &str) {
        let resp = self.post_form("/cart/add", &[("item_id", item_id)]).await;
        assert_eq!(resp.status(), 303);
    }

    /// Serve the widget script from the gateway mock, expecting `fetches`
    /// requests over the test's lifetime.
    pub async fn mount_widget_script(&self, fetches: u64) {
        Mock::given(method("GET"))
            .and(path("/v1/checkout.js"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/javascript")
                    .set_body_string(WIDGET_SCRIPT),
            )
            .expect(fetches)
            .mount(&self.gateway)
            .await;
    }
}

/// Storefront configuration pointing at the mocks.
pub fn config(order_api: &str, script_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        auth_cookie_name: "token".to_string(),
        orders: OrderServiceConfig {
            api_url: order_api.parse().unwrap(),
            timeout: Duration::from_secs(5),
        },
        gateway: GatewayConfig {
            key_id: Some("rzp_test_fallback".to_string()),
            script_url: script_url.parse().unwrap(),
            merchant_name: "QuickBite".to_string(),
            theme_color: "#3399cc".to_string(),
        },
        pricing: PricingConfig {
            currency: CurrencyCode::INR,
            delivery_fee: Decimal::from(50),
        },
        sentry: SentryConfig::default(),
    }
}

/// A complete delivery form.
pub fn delivery_form<'a>(payment: &'a str, submission_id: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("firstName", "Ravi"),
        ("lastName", "Kumar"),
        ("email", "ravi@quickbite.in"),
        ("street", "12 MG Road"),
        ("city", "Bengaluru"),
        ("state", "Karnataka"),
        ("zipcode", "560001"),
        ("country", "India"),
        ("phone", "9876543210"),
        ("payment", payment),
        ("submissionId", submission_id),
    ]
}

/// `Location` header of a redirect.
pub fn location(resp: &Response) -> &str {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
