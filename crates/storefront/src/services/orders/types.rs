//! Request and response bodies of the order service.

use quickbite_core::{FoodId, GatewayOrderId, GatewayPaymentId, OrderId, OrderStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of a plain `{success: true, message?}` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to an online order.
///
/// The service has shipped two shapes over time: the gateway order nested
/// under `razorpayOrder` with the service's ID in `mongoOrderId`, and a flat
/// shape with `razorpayOrderId` and `orderId`. Both are accepted; checking
/// that the required fields are present is left to the payment gateway
/// adapter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineOrder {
    #[serde(default)]
    pub razorpay_order: Option<GatewayOrder>,
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default, alias = "orderId")]
    pub mongo_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_key: Option<String>,
    /// Amount in the currency's smallest unit.
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// The gateway order object as relayed by the order service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GatewayOrder {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl OnlineOrder {
    /// Gateway order ID, from either response shape. Blank IDs count as missing.
    #[must_use]
    pub fn gateway_order_id(&self) -> Option<GatewayOrderId> {
        self.razorpay_order
            .as_ref()
            .and_then(|o| o.id.as_deref())
            .or(self.razorpay_order_id.as_deref())
            .map(GatewayOrderId::new)
            .filter(|id| !id.is_blank())
    }

    /// The order service's own order ID.
    #[must_use]
    pub fn order_id(&self) -> Option<OrderId> {
        self.mongo_order_id
            .as_deref()
            .map(OrderId::new)
            .filter(|id| !id.is_blank())
    }

    /// Amount in minor units, top-level first, then from the gateway order.
    ///
    /// `Some(None)` means a value was present but is not a whole,
    /// non-negative number.
    #[must_use]
    pub fn amount_minor(&self) -> Option<Option<u64>> {
        self.amount
            .as_ref()
            .or_else(|| self.razorpay_order.as_ref().and_then(|o| o.amount.as_ref()))
            .map(minor_units)
    }

    /// Currency code, top-level first, then from the gateway order.
    #[must_use]
    pub fn currency_code(&self) -> Option<&str> {
        self.currency
            .as_deref()
            .or_else(|| self.razorpay_order.as_ref().and_then(|o| o.currency.as_deref()))
            .filter(|c| !c.trim().is_empty())
    }
}

/// Interpret a JSON value as a whole number of minor units.
fn minor_units(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .and_then(|f| format!("{f:.0}").parse().ok())
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Body of the payment verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyPaymentRequest {
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
    pub razorpay_order_id: GatewayOrderId,
    pub razorpay_payment_id: GatewayPaymentId,
    pub razorpay_signature: String,
}

/// A food item from the order service's menu.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FoodItem {
    #[serde(rename = "_id")]
    pub id: FoodId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// `{success, data: [...]}` list payload.
#[derive(Debug, Clone, Deserialize)]
pub struct DataList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// One line of a past order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderedItem {
    pub name: String,
    pub quantity: u32,
}

/// A past order, as listed on the order history page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderSummary {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub items: Vec<OrderedItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment: bool,
    #[serde(default)]
    pub date: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_nested_shape() {
        let order: OnlineOrder = serde_json::from_value(json!({
            "success": true,
            "razorpayOrder": {"id": "order_N1", "amount": 29000, "currency": "INR"},
            "mongoOrderId": "665f1c2e",
        }))
        .unwrap();

        assert_eq!(order.gateway_order_id(), Some(GatewayOrderId::new("order_N1")));
        assert_eq!(order.order_id(), Some(OrderId::new("665f1c2e")));
        assert_eq!(order.amount_minor(), Some(Some(29000)));
        assert_eq!(order.currency_code(), Some("INR"));
    }

    #[test]
    fn test_flat_shape() {
        let order: OnlineOrder = serde_json::from_value(json!({
            "success": true,
            "razorpayOrderId": "order_N2",
            "orderId": "665f",
            "razorpayKey": "rzp_test_abc",
            "amount": 15000.0,
            "currency": "INR",
        }))
        .unwrap();

        assert_eq!(order.gateway_order_id(), Some(GatewayOrderId::new("order_N2")));
        assert_eq!(order.order_id(), Some(OrderId::new("665f")));
        assert_eq!(order.amount_minor(), Some(Some(15000)));
        assert_eq!(order.razorpay_key.as_deref(), Some("rzp_test_abc"));
    }

    #[test]
    fn test_blank_and_invalid_fields() {
        let order: OnlineOrder = serde_json::from_value(json!({
            "razorpayOrder": {"id": "  "},
            "amount": -5,
            "currency": "",
        }))
        .unwrap();

        assert_eq!(order.gateway_order_id(), None);
        assert_eq!(order.amount_minor(), Some(None));
        assert_eq!(order.currency_code(), None);
    }

    #[test]
    fn test_verify_request_wire_format() {
        let body = VerifyPaymentRequest {
            order_id: OrderId::new("665f"),
            razorpay_order_id: GatewayOrderId::new("order_N1"),
            razorpay_payment_id: GatewayPaymentId::new("pay_P1"),
            razorpay_signature: "sig".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "orderId": "665f",
                "razorpay_order_id": "order_N1",
                "razorpay_payment_id": "pay_P1",
                "razorpay_signature": "sig",
            })
        );
    }

    #[test]
    fn test_order_summary() {
        let order: OrderSummary = serde_json::from_value(json!({
            "_id": "665f",
            "items": [{"name": "Biryani", "quantity": 2, "price": 180}],
            "amount": 410,
            "status": "Out for delivery",
            "payment": true,
            "date": "2026-10-01T12:30:00.000Z",
        }))
        .unwrap();

        assert_eq!(order.amount, Decimal::from(410));
        assert_eq!(order.status, OrderStatus::OutForDelivery);
        assert!(order.payment);
    }
}
