//! Order Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::RecordId;
use super::serde_helpers::{null_as_default, timestamp};

/// Service type chosen by the waiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// 堂食 - eat in ("Para comer aquí")
    #[serde(rename = "local")]
    DineIn,
    /// 外带 - take away ("Para llevar")
    #[serde(rename = "llevar")]
    Takeout,
}

impl ServiceType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ServiceType::DineIn => "local",
            ServiceType::Takeout => "llevar",
        }
    }

}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of an order, snapshotted when the order is created
///
/// Also the shape of a cart line: the cart hands its lines over unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Menu item id at the time of sale
    pub id: RecordId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "cantidad")]
    pub quantity: i32,
    #[serde(rename = "precio", serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    /// Free-text note ("sin cebolla")
    #[serde(rename = "observaciones", default, deserialize_with = "null_as_default")]
    pub note: String,
}

/// A money amount that does not fit in a `Decimal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("amount out of range")]
pub struct AmountOverflow;

/// Σ amounts, failing instead of panicking when the sum leaves `Decimal`'s range
pub fn checked_sum<I>(amounts: I) -> Result<Decimal, AmountOverflow>
where
    I: IntoIterator<Item = Result<Decimal, AmountOverflow>>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |acc, amount| {
        acc.checked_add(amount?).ok_or(AmountOverflow)
    })
}

impl OrderItem {
    /// price × quantity
    pub fn subtotal(&self) -> Result<Decimal, AmountOverflow> {
        self.price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(AmountOverflow)
    }

    fn check(&self) -> Result<(), InvalidOrder> {
        if self.quantity <= 0 {
            return Err(InvalidOrder(format!(
                "item {} has non-positive quantity {}",
                self.id, self.quantity
            )));
        }
        if self.price.is_sign_negative() {
            return Err(InvalidOrder(format!(
                "item {} has negative price {}",
                self.id, self.price
            )));
        }
        Ok(())
    }
}

/// Order entity (`pedidos`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: RecordId,
    /// Waiter (auth user id) who placed the order
    #[serde(rename = "mesero_id", default)]
    pub waiter_id: Option<String>,
    #[serde(rename = "creado_at", deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "tipo_servicio")]
    pub service_type: ServiceType,
    #[serde(rename = "pagado", default)]
    pub paid: bool,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Reject rows whose embedded items do not have the fixed line shape
    pub fn validate(&self) -> Result<(), InvalidOrder> {
        self.items.iter().try_for_each(OrderItem::check)
    }

    /// Σ price × quantity over the embedded snapshot
    pub fn items_total(&self) -> Result<Decimal, AmountOverflow> {
        checked_sum(self.items.iter().map(OrderItem::subtotal))
    }
}

/// Insert payload for a new order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    #[serde(rename = "mesero_id")]
    pub waiter_id: String,
    pub items: Vec<OrderItem>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
    #[serde(rename = "tipo_servicio")]
    pub service_type: ServiceType,
    #[serde(rename = "pagado")]
    pub paid: bool,
}

impl NewOrder {
    /// Build an unpaid order whose total is the sum of its lines
    pub fn new(
        waiter_id: impl Into<String>,
        service_type: ServiceType,
        items: Vec<OrderItem>,
    ) -> Result<Self, AmountOverflow> {
        let total = checked_sum(items.iter().map(OrderItem::subtotal))?;
        Ok(Self {
            waiter_id: waiter_id.into(),
            items,
            total,
            service_type,
            paid: false,
        })
    }
}

/// Patch flipping the paid flag; the only transition the application makes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarkPaid {
    #[serde(rename = "pagado")]
    pub paid: bool,
}

impl Default for MarkPaid {
    fn default() -> Self {
        Self { paid: true }
    }
}

/// An order row that failed boundary validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidOrder(pub String);

impl fmt::Display for InvalidOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid order: {}", self.0)
    }
}

impl std::error::Error for InvalidOrder {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(id: i64, price: &str, quantity: i32) -> OrderItem {
        OrderItem {
            id: RecordId::from(id),
            name: format!("Plato {id}"),
            quantity,
            price: dec(price),
            note: String::new(),
        }
    }

    #[test]
    fn test_decode_order_row() {
        let row = json!({
            "id": "9b1f7c2a-0000-4000-8000-000000000001",
            "mesero_id": "user-1",
            "creado_at": "2024-05-01T18:00:00.123456+00:00",
            "tipo_servicio": "llevar",
            "pagado": false,
            "total": 13.5,
            "items": [
                {"id": 4, "nombre": "Taco", "cantidad": 3, "precio": 4.5, "observaciones": ""}
            ]
        });
        let order: Order = serde_json::from_value(row).unwrap();
        assert_eq!(order.service_type, ServiceType::Takeout);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items_total(), Ok(dec("13.50")));
        assert!(order.validate().is_ok());
        assert_eq!(order.id.short(), "9b1f7c");
    }

    #[test]
    fn test_null_items_decode_as_empty() {
        let row = json!({
            "id": 1,
            "creado_at": "2024-05-01T18:00:00+00:00",
            "tipo_servicio": "local",
            "total": 0,
            "items": null
        });
        let order: Order = serde_json::from_value(row).unwrap();
        assert!(order.items.is_empty());
        assert!(!order.paid);
    }

    #[test]
    fn test_malformed_items_are_rejected() {
        let missing_quantity = json!({
            "id": 1,
            "creado_at": "2024-05-01T18:00:00+00:00",
            "tipo_servicio": "local",
            "total": 1,
            "items": [{"id": 4, "nombre": "Taco", "precio": 1}]
        });
        assert!(serde_json::from_value::<Order>(missing_quantity).is_err());

        let mut order: Order = serde_json::from_value(json!({
            "id": 1,
            "creado_at": "2024-05-01T18:00:00+00:00",
            "tipo_servicio": "local",
            "total": 1,
            "items": []
        }))
        .unwrap();
        order.items.push(item(4, "1.00", 0));
        assert!(order.validate().is_err());
    }

    #[test]
    fn test_unknown_service_type_is_rejected() {
        let row = json!({
            "id": 1,
            "creado_at": "2024-05-01T18:00:00+00:00",
            "tipo_servicio": "delivery",
            "total": 1
        });
        assert!(serde_json::from_value::<Order>(row).is_err());
    }

    #[test]
    fn test_new_order_total_matches_items() {
        let order = NewOrder::new(
            "user-1",
            ServiceType::DineIn,
            vec![item(1, "5.00", 1), item(2, "3.75", 2)],
        )
        .unwrap();
        assert_eq!(order.total, dec("12.50"));
        assert!(!order.paid);

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["tipo_servicio"], "local");
        assert_eq!(json["pagado"], false);
        assert_eq!(json["total"], json!(12.5));
        assert_eq!(json["items"][1]["cantidad"], 2);
    }

    #[test]
    fn test_huge_amounts_overflow_instead_of_panicking() {
        let mut huge = item(1, "1", 2);
        huge.price = Decimal::from_scientific("5e28").unwrap();
        assert_eq!(huge.subtotal(), Err(AmountOverflow));

        huge.quantity = 1;
        assert!(huge.subtotal().is_ok());
        let err = NewOrder::new("user-1", ServiceType::DineIn, vec![huge.clone(), huge]);
        assert_eq!(err.unwrap_err(), AmountOverflow);

        assert_eq!(checked_sum([Ok(dec("1.5")), Ok(dec("2"))]), Ok(dec("3.5")));
    }

    #[test]
    fn test_mark_paid_payload() {
        assert_eq!(
            serde_json::to_value(MarkPaid::default()).unwrap(),
            json!({"pagado": true})
        );
    }
}
