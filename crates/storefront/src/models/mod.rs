//! Storefront-side models.
//!
//! Domain types shared with other components live in `quickbite-core`; this
//! module only holds what is specific to serving pages: session contents and
//! view models for templates.

pub mod session;
pub mod views;

pub use session::{Notice, NoticeLevel, keys as session_keys};
