//! Core types for QuickBite.
//!
//! This module provides type-safe wrappers for the checkout domain.

pub mod address;
pub mod cart;
pub mod email;
pub mod id;
pub mod money;
pub mod order;
pub mod status;

pub use address::{AddressError, AddressField, DeliveryAddress};
pub use cart::{Cart, CartLine};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CurrencyCode, Money};
pub use order::{OrderDraft, PaymentMethod, PendingPayment};
pub use status::*;
