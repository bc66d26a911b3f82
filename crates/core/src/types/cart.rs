//! Shopping cart held for the customer until checkout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::FoodId;

/// One food item in the cart.
///
/// Serializes in the shape the order service expects for order items
/// (`_id`, `name`, `price`, `quantity`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "_id")]
    pub item_id: FoodId,
    pub name: String,
    #[serde(rename = "price", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    /// Price of the whole line (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A customer's cart.
///
/// Lines are unique per item and always have a positive quantity; a line is
/// dropped as soon as its quantity reaches zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add `quantity` units of an item, merging with an existing line.
    ///
    /// Adding zero units is a no-op. The unit price and name of an existing
    /// line are refreshed from the latest values.
    pub fn add(&mut self, item_id: FoodId, name: &str, unit_price: Decimal, quantity: u32) {
        if quantity == 0 {
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item_id) {
            line.quantity = line.quantity.saturating_add(quantity);
            line.unit_price = unit_price;
            name.clone_into(&mut line.name);
            return;
        }

        self.lines.push(CartLine {
            item_id,
            name: name.to_owned(),
            unit_price,
            quantity,
        });
    }

    /// Remove one unit of an item. Returns `false` if the item was not in the cart.
    pub fn remove_one(&mut self, item_id: &FoodId) -> bool {
        let Some(pos) = self.lines.iter().position(|l| &l.item_id == item_id) else {
            return false;
        };

        if let Some(line) = self.lines.get_mut(pos) {
            line.quantity -= 1;
            if line.quantity == 0 {
                self.lines.remove(pos);
            }
        }
        true
    }

    /// Quantity of an item currently in the cart (0 if absent).
    #[must_use]
    pub fn quantity_of(&self, item_id: &FoodId) -> u32 {
        self.lines
            .iter()
            .find(|l| &l.item_id == item_id)
            .map_or(0, |l| l.quantity)
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    /// Sum of all line totals, before delivery.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns `true` when there is nothing to charge for: no lines, or only
    /// zero-priced ones. Such a cart cannot be checked out.
    #[must_use]
    pub fn has_zero_total(&self) -> bool {
        self.subtotal().is_zero()
    }

    /// Grand total including the delivery fee.
    ///
    /// An empty cart costs nothing: no delivery fee is charged on zero.
    #[must_use]
    pub fn total_with_delivery(&self, delivery_fee: Decimal) -> Decimal {
        let subtotal = self.subtotal();
        if subtotal.is_zero() {
            Decimal::ZERO
        } else {
            subtotal + delivery_fee
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn biryani() -> FoodId {
        FoodId::new("food-biryani")
    }

    #[test]
    fn test_add_merges_lines() {
        let mut cart = Cart::new();
        cart.add(biryani(), "Biryani", Decimal::from(180), 1);
        cart.add(biryani(), "Biryani", Decimal::from(180), 2);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(&biryani()), 3);
        assert_eq!(cart.subtotal(), Decimal::from(540));
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut cart = Cart::new();
        cart.add(biryani(), "Biryani", Decimal::from(180), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_drops_line_at_zero() {
        let mut cart = Cart::new();
        cart.add(biryani(), "Biryani", Decimal::from(180), 2);

        assert!(cart.remove_one(&biryani()));
        assert_eq!(cart.quantity_of(&biryani()), 1);

        assert!(cart.remove_one(&biryani()));
        assert!(cart.is_empty());

        assert!(!cart.remove_one(&biryani()));
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.add(biryani(), "Biryani", Decimal::new(17950, 2), 2);
        cart.add(FoodId::new("food-lassi"), "Lassi", Decimal::from(60), 1);

        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), Decimal::new(41900, 2));
        assert_eq!(
            cart.total_with_delivery(Decimal::from(50)),
            Decimal::new(46900, 2)
        );
    }

    #[test]
    fn test_empty_cart_has_no_delivery_fee() {
        let cart = Cart::new();
        assert_eq!(cart.total_with_delivery(Decimal::from(50)), Decimal::ZERO);
    }

    #[test]
    fn test_free_items_make_a_zero_total() {
        let mut cart = Cart::new();
        assert!(cart.has_zero_total());

        cart.add(FoodId::new("food-water"), "Water", Decimal::ZERO, 3);
        assert!(!cart.is_empty());
        assert!(cart.has_zero_total());
        assert_eq!(cart.total_with_delivery(Decimal::from(50)), Decimal::ZERO);

        cart.add(biryani(), "Biryani", Decimal::from(180), 1);
        assert!(!cart.has_zero_total());
    }

    #[test]
    fn test_line_wire_format() {
        let mut cart = Cart::new();
        cart.add(biryani(), "Biryani", Decimal::new(1805, 1), 2);

        let json = serde_json::to_value(&cart.lines()[0]).unwrap();
        assert_eq!(json["_id"], "food-biryani");
        assert_eq!(json["name"], "Biryani");
        assert_eq!(json["price"], 180.5);
        assert_eq!(json["quantity"], 2);
    }
}
