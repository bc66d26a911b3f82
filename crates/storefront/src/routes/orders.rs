//! Order history route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalCustomer;
use crate::models::session::{load_cart, take_notice};
use crate::models::views::OrderView;
use crate::models::Notice;
use crate::services::BackendResult;
use crate::state::AppState;

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub signed_in: bool,
    pub orders: Vec<OrderView>,
    pub notice: Option<Notice>,
    pub cart_count: u32,
}

/// Display the customer's orders.
///
/// Guests see a sign-in prompt instead of a list.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    customer: OptionalCustomer,
) -> Result<OrdersTemplate> {
    let mut notice = take_notice(&session).await;
    let cart_count = load_cart(&session).await.item_count();

    let Some(token) = customer.secret() else {
        return Ok(OrdersTemplate {
            signed_in: false,
            orders: Vec::new(),
            notice,
            cart_count,
        });
    };

    let currency = state.config().pricing.currency;
    let orders = match state.orders().user_orders(token).await? {
        BackendResult::Ok(orders) => orders.iter().map(|o| OrderView::new(o, currency)).collect(),
        BackendResult::Rejected(reason) => {
            tracing::warn!(reason = ?reason, "Order history request rejected");
            notice.get_or_insert_with(|| {
                Notice::error(reason.unwrap_or_else(|| "Could not load your orders".to_string()))
            });
            Vec::new()
        }
    };

    Ok(OrdersTemplate {
        signed_in: true,
        orders,
        notice,
        cart_count,
    })
}
