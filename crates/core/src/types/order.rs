//! Orders as they travel from the checkout form to the order service.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::address::DeliveryAddress;
use crate::types::cart::{Cart, CartLine};
use crate::types::id::{GatewayOrderId, OrderId};
use crate::types::money::{CurrencyCode, Money};

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    /// Pay the rider in cash when the food arrives.
    #[default]
    #[serde(rename = "cod")]
    CashOnDelivery,
    /// Pay up front through the hosted payment gateway.
    #[serde(rename = "online")]
    Online,
}

impl PaymentMethod {
    /// Form value of the method (`cod` / `online`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cod",
            Self::Online => "online",
        }
    }

    /// Parse a form value.
    #[must_use]
    pub fn from_form_value(value: &str) -> Option<Self> {
        match value {
            "cod" => Some(Self::CashOnDelivery),
            "online" => Some(Self::Online),
            _ => None,
        }
    }

    /// Label of the submit button for this method.
    #[must_use]
    pub const fn submit_label(&self) -> &'static str {
        match self {
            Self::CashOnDelivery => "Place Order",
            Self::Online => "Proceed To Payment",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order ready to be sent to the order service.
///
/// Built once per submission attempt from a validated address and the cart
/// contents. There are no setters: a draft is consumed when it is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDraft {
    address: DeliveryAddress,
    items: Vec<CartLine>,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

impl OrderDraft {
    /// Snapshot the cart into a draft, charging `delivery_fee` on top.
    ///
    /// Returns `None` when the cart has nothing to charge for, including a
    /// cart holding only zero-priced items.
    #[must_use]
    pub fn from_cart(address: DeliveryAddress, cart: &Cart, delivery_fee: Decimal) -> Option<Self> {
        if cart.has_zero_total() {
            return None;
        }

        Some(Self {
            address,
            items: cart.lines().to_vec(),
            amount: cart.total_with_delivery(delivery_fee),
        })
    }

    /// Delivery address.
    #[must_use]
    pub const fn address(&self) -> &DeliveryAddress {
        &self.address
    }

    /// Ordered items.
    #[must_use]
    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    /// Total charged, delivery included, in the store currency's standard unit.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }
}

/// An online payment waiting for the customer to finish the gateway widget.
///
/// Created from the order service's response to an online order, kept in the
/// customer's session while the widget is open, and taken out exactly once
/// when the widget reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayment {
    /// The order service's ID for the order being paid.
    pub order_id: OrderId,
    /// The gateway's order ID the widget pays against.
    pub gateway_order_id: GatewayOrderId,
    /// Public key ID the widget is opened with.
    pub key_id: String,
    /// Amount in the currency's smallest unit.
    pub amount_minor: u64,
    /// Currency of `amount_minor`.
    pub currency: CurrencyCode,
}

impl PendingPayment {
    /// Amount as [`Money`] in the standard unit.
    #[must_use]
    pub fn money(&self) -> Money {
        Money::new(
            Decimal::from(self.amount_minor) / Decimal::ONE_HUNDRED,
            self.currency,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::address::AddressField;
    use crate::types::id::FoodId;

    fn address() -> DeliveryAddress {
        DeliveryAddress::validated(|field| match field {
            AddressField::Email => "ravi@quickbite.in",
            AddressField::FirstName => "Ravi",
            _ => "x",
        })
        .unwrap()
    }

    #[test]
    fn test_draft_from_empty_cart() {
        assert!(OrderDraft::from_cart(address(), &Cart::new(), Decimal::from(50)).is_none());
    }

    #[test]
    fn test_no_draft_for_free_items() {
        let mut cart = Cart::new();
        cart.add(FoodId::new("food-water"), "Water", Decimal::ZERO, 2);
        assert!(OrderDraft::from_cart(address(), &cart, Decimal::from(50)).is_none());
    }

    #[test]
    fn test_draft_wire_format() {
        let mut cart = Cart::new();
        cart.add(FoodId::new("food-1"), "Masala Dosa", Decimal::from(120), 2);

        let draft = OrderDraft::from_cart(address(), &cart, Decimal::from(50)).unwrap();
        assert_eq!(draft.amount(), Decimal::from(290));

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["amount"], 290.0);
        assert_eq!(json["items"][0]["_id"], "food-1");
        assert_eq!(json["address"]["firstName"], "Ravi");
    }

    #[test]
    fn test_payment_method_form_values() {
        assert_eq!(
            PaymentMethod::from_form_value("online"),
            Some(PaymentMethod::Online)
        );
        assert_eq!(
            PaymentMethod::from_form_value("cod"),
            Some(PaymentMethod::CashOnDelivery)
        );
        assert_eq!(PaymentMethod::from_form_value("card"), None);
        assert_eq!(PaymentMethod::default(), PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_pending_payment_money() {
        let pending = PendingPayment {
            order_id: OrderId::new("665f"),
            gateway_order_id: GatewayOrderId::new("order_1"),
            key_id: "rzp_test_key".to_string(),
            amount_minor: 29050,
            currency: CurrencyCode::INR,
        };
        assert_eq!(pending.money().display(), "₹290.50");
    }
}
