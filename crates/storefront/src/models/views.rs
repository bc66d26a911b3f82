//! View models handed to templates.
//!
//! Templates get display-ready strings; all arithmetic happens here.

use chrono::DateTime;
use quickbite_core::{Cart, CartLine, CurrencyCode, Money};
use rust_decimal::Decimal;

use crate::services::orders::OrderSummary;

/// One cart line as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

impl CartItemView {
    fn from_line(line: &CartLine, currency: CurrencyCode) -> Self {
        Self {
            id: line.item_id.to_string(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: Money::new(line.unit_price, currency).display(),
            line_total: Money::new(line.line_total(), currency).display(),
        }
    }
}

/// Subtotal, delivery fee and total.
///
/// The delivery fee is only charged on a non-empty cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalsView {
    pub subtotal: String,
    pub delivery_fee: String,
    pub total: String,
}

impl TotalsView {
    #[must_use]
    pub fn new(cart: &Cart, delivery_fee: Decimal, currency: CurrencyCode) -> Self {
        let fee = if cart.is_empty() {
            Decimal::ZERO
        } else {
            delivery_fee
        };

        Self {
            subtotal: Money::new(cart.subtotal(), currency).display(),
            delivery_fee: Money::new(fee, currency).display(),
            total: Money::new(cart.total_with_delivery(delivery_fee), currency).display(),
        }
    }
}

/// The cart page's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub totals: TotalsView,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, delivery_fee: Decimal, currency: CurrencyCode) -> Self {
        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemView::from_line(line, currency))
                .collect(),
            item_count: cart.item_count(),
            totals: TotalsView::new(cart, delivery_fee, currency),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One past order on the order history page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub id: String,
    /// "Biryani x 2, Lassi x 1"
    pub items: String,
    pub item_count: usize,
    pub amount: String,
    pub status: String,
    pub paid: bool,
    pub placed_on: Option<String>,
}

impl OrderView {
    #[must_use]
    pub fn new(order: &OrderSummary, currency: CurrencyCode) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| format!("{} x {}", item.name, item.quantity))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            id: order.id.to_string(),
            items,
            item_count: order.items.len(),
            amount: Money::new(order.amount, currency).display(),
            status: order.status.label().to_string(),
            paid: order.payment,
            placed_on: order
                .date
                .as_deref()
                .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                .map(|d| d.format("%d %b %Y").to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use quickbite_core::{FoodId, OrderId, OrderStatus};

    use super::*;
    use crate::services::orders::OrderedItem;

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(FoodId::new("f1"), "Paneer Tikka", Decimal::from(180), 2);
        cart.add(FoodId::new("f2"), "Mango Lassi", Decimal::from(60), 1);
        cart
    }

    #[test]
    fn test_totals_with_items() {
        let totals = TotalsView::new(&cart(), Decimal::from(50), CurrencyCode::INR);
        assert_eq!(totals.subtotal, "₹420.00");
        assert_eq!(totals.delivery_fee, "₹50.00");
        assert_eq!(totals.total, "₹470.00");
    }

    #[test]
    fn test_empty_cart_has_no_delivery_fee() {
        let totals = TotalsView::new(&Cart::new(), Decimal::from(50), CurrencyCode::INR);
        assert_eq!(totals.delivery_fee, "₹0.00");
        assert_eq!(totals.total, "₹0.00");
    }

    #[test]
    fn test_cart_view_lines() {
        let view = CartView::new(&cart(), Decimal::from(50), CurrencyCode::INR);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.items[0].line_total, "₹360.00");
        assert!(!view.is_empty());
    }

    #[test]
    fn test_order_view() {
        let order = OrderSummary {
            id: OrderId::new("665f"),
            items: vec![
                OrderedItem {
                    name: "Biryani".to_string(),
                    quantity: 2,
                },
                OrderedItem {
                    name: "Lassi".to_string(),
                    quantity: 1,
                },
            ],
            amount: Decimal::from(410),
            status: OrderStatus::Delivered,
            payment: true,
            date: Some("2026-10-01T12:30:00.000Z".to_string()),
        };

        let view = OrderView::new(&order, CurrencyCode::INR);
        assert_eq!(view.items, "Biryani x 2, Lassi x 1");
        assert_eq!(view.amount, "₹410.00");
        assert_eq!(view.status, "Delivered");
        assert_eq!(view.placed_on.as_deref(), Some("01 Oct 2026"));
    }
}
