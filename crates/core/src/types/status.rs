//! Status enums for orders.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Kitchen/delivery progress of an order, as reported by the order service.
///
/// Unknown strings are kept verbatim so a new backend status never breaks the
/// order history page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    #[default]
    FoodProcessing,
    OutForDelivery,
    Delivered,
    Other(String),
}

impl OrderStatus {
    /// Text shown to the customer.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::FoodProcessing => "Food Processing",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Food Processing" => Self::FoodProcessing,
            "Out for delivery" => Self::OutForDelivery,
            "Delivered" => Self::Delivered,
            _ => Self::Other(value),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(s) => s,
            known => known.label().to_owned(),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether the order has been paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Cash on delivery, or an online payment not yet verified.
    #[default]
    Unpaid,
    /// Payment verified by the order service.
    Paid,
}

impl From<bool> for PaymentStatus {
    fn from(paid: bool) -> Self {
        if paid { Self::Paid } else { Self::Unpaid }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_statuses() {
        let status: OrderStatus = serde_json::from_str("\"Out for delivery\"").unwrap();
        assert_eq!(status, OrderStatus::OutForDelivery);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"Out for delivery\"");
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let status: OrderStatus = serde_json::from_str("\"Cancelled\"").unwrap();
        assert_eq!(status.label(), "Cancelled");
    }

    #[test]
    fn test_payment_status_from_bool() {
        assert_eq!(PaymentStatus::from(true), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from(false), PaymentStatus::Unpaid);
    }
}
