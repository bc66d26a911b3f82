//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::models::Notice;
use crate::models::session::{load_cart, take_notice};

/// Hero header content.
#[derive(Clone)]
pub struct Hero {
    pub title: &'static str,
    pub text: &'static str,
    pub button_text: &'static str,
    pub button_url: &'static str,
}

impl Default for Hero {
    fn default() -> Self {
        Self {
            title: "Order Your Favourite Food Here",
            text: "Choose from a diverse menu featuring a delectable array of dishes \
                   crafted with the finest ingredients and culinary expertise. Our \
                   mission is to satisfy your cravings and elevate your dining \
                   experience, one delicious meal at a time.",
            button_text: "View Menu",
            button_url: "/#explore-menu",
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub hero: Hero,
    pub notice: Option<Notice>,
    pub cart_count: u32,
}

/// Display the home page.
#[instrument(skip(session))]
pub async fn home(session: Session) -> HomeTemplate {
    HomeTemplate {
        hero: Hero::default(),
        notice: take_notice(&session).await,
        cart_count: load_cart(&session).await.item_count(),
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the order service.
pub async fn health() -> &'static str {
    "ok"
}
