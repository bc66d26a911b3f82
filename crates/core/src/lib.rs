//! QuickBite Core - Shared domain types.
//!
//! This crate provides the types shared by the QuickBite components:
//! - `storefront` - Customer-facing site (cart, checkout, order history)
//! - `integration-tests` - End-to-end checkout tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. Cart arithmetic, address validation and order drafts live here so
//! they can be tested without a running server.
//!
//! # Modules
//!
//! - [`types`] - IDs, money, email, cart, delivery address, orders and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
