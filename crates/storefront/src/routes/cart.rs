//! Cart route handlers.
//!
//! The cart lives in the session. Adding an item looks its name and price up
//! in the (cached) menu so the cart never trusts prices from the browser.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use quickbite_core::FoodId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalCustomer;
use crate::models::session::{load_cart, push_notice, save_cart, take_notice};
use crate::models::views::CartView;
use crate::models::Notice;
use crate::state::AppState;

/// Add/remove form data.
#[derive(Debug, Deserialize)]
pub struct CartItemForm {
    pub item_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub signed_in: bool,
    pub notice: Option<Notice>,
    pub cart_count: u32,
}

/// Display cart page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    customer: OptionalCustomer,
) -> CartShowTemplate {
    let cart = load_cart(&session).await;
    let pricing = &state.config().pricing;

    CartShowTemplate {
        cart: CartView::new(&cart, pricing.delivery_fee, pricing.currency),
        signed_in: customer.0.is_some(),
        notice: take_notice(&session).await,
        cart_count: cart.item_count(),
    }
}

/// Add one unit of a menu item to the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CartItemForm>,
) -> Result<Response> {
    let item_id = FoodId::new(form.item_id.trim());

    let item = match state.menu().find(&item_id).await {
        Ok(Some(item)) => item,
        Ok(None) => {
            push_notice(&session, Notice::error("That item is no longer on the menu")).await;
            return Ok(Redirect::to("/cart").into_response());
        }
        Err(e) => {
            tracing::error!("Failed to load menu: {e}");
            push_notice(&session, Notice::error("The menu is unavailable right now")).await;
            return Ok(Redirect::to("/cart").into_response());
        }
    };

    let mut cart = load_cart(&session).await;
    cart.add(item.id, &item.name, item.price, 1);
    save_cart(&session, &cart).await?;

    add_breadcrumb("cart", "Added item", Some(&[("item_id", item_id.as_str())]));
    Ok(Redirect::to("/cart").into_response())
}

/// Remove one unit of an item; the line disappears at zero.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<CartItemForm>) -> Result<Response> {
    let item_id = FoodId::new(form.item_id.trim());

    let mut cart = load_cart(&session).await;
    if cart.remove_one(&item_id) {
        save_cart(&session, &cart).await?;
        add_breadcrumb("cart", "Removed item", Some(&[("item_id", item_id.as_str())]));
    }

    Ok(Redirect::to("/cart").into_response())
}
