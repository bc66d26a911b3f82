//! Clients for the services behind the storefront.
//!
//! - `orders` - Order service API (orders, payment verification, menu)
//! - `menu` - Cached menu lookups used to price the cart

pub mod menu;
pub mod orders;

pub use menu::{MenuError, MenuService};
pub use orders::{BackendResult, OrderClient, OrderServiceError};
