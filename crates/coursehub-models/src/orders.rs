use chrono::{DateTime, Utc};
use coursehub_core::ownership::Owned;
use coursehub_core::serde::{deserialize_bool, deserialize_f64};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::ids::{CourseId, OrderId, UserId};

pub const ORDER_COLUMNS: &str =
    "id, user_id, items, address, amount, payment, checkout_session_id, created_at, updated_at";

/// One purchased line. Unknown fields are kept as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[validate(custom(function = "crate::validation::not_blank", message = "Item name is required"))]
    pub name: String,
    #[serde(deserialize_with = "deserialize_f64")]
    #[validate(range(min = 0.0, message = "Item price cannot be negative"))]
    pub price: f64,
    #[validate(range(min = 1, message = "Item quantity must be at least 1"))]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<CourseId>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

impl OrderItem {
    /// Unit price in the currency's minor unit.
    pub fn unit_amount_cents(&self) -> i64 {
        (self.price * 100.0).round() as i64
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[schema(value_type = Vec<OrderItem>)]
    pub items: Json<Vec<OrderItem>>,
    #[schema(value_type = Object)]
    pub address: Json<Value>,
    pub amount: f64,
    pub payment: bool,
    #[serde(skip_serializing)]
    pub checkout_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for Order {
    type Owner = UserId;
    const RESOURCE: &'static str = "order";

    fn owner_id(&self) -> &UserId {
        &self.user_id
    }
}

fn validate_address(address: &Value) -> Result<(), ValidationError> {
    match address {
        Value::Object(fields) if !fields.is_empty() => Ok(()),
        _ => Err(ValidationError::new("address")),
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderDto {
    #[validate(length(min = 1, message = "Order must contain at least one item"), nested)]
    pub items: Vec<OrderItem>,
    #[validate(custom(function = "validate_address", message = "Address is required"))]
    #[schema(value_type = Object)]
    pub address: Value,
    #[serde(deserialize_with = "deserialize_f64")]
    #[validate(range(min = 0.0, message = "Amount cannot be negative"))]
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOrderDto {
    pub order_id: OrderId,
    /// Outcome reported by the checkout redirect
    #[serde(deserialize_with = "deserialize_bool")]
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub order_id: OrderId,
    pub session_url: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOrderResponse {
    pub order_id: OrderId,
    pub paid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_keeps_unknown_fields() {
        let item: OrderItem = serde_json::from_value(json!({
            "name": "Rust from scratch",
            "price": "19.99",
            "quantity": 2,
            "thumbnail": "https://img/1.png"
        }))
        .unwrap();

        assert_eq!(item.unit_amount_cents(), 1999);
        assert_eq!(item.extra["thumbnail"], "https://img/1.png");
        assert_eq!(serde_json::to_value(&item).unwrap()["thumbnail"], "https://img/1.png");
    }

    #[test]
    fn test_place_order_requires_items_and_address() {
        let dto: PlaceOrderDto = serde_json::from_value(json!({
            "items": [],
            "address": {},
            "amount": 10
        }))
        .unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));
        assert!(errors.field_errors().contains_key("address"));
    }

    #[test]
    fn test_verify_accepts_string_flag() {
        let dto: VerifyOrderDto = serde_json::from_value(json!({
            "orderId": "12345678-1234-1234-1234-123456789abc",
            "success": "true"
        }))
        .unwrap();
        assert!(dto.success);
    }
}
