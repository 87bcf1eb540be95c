use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{domain::entities::payments::PaymentEntity, infra::db::postgres::schema::orders};

pub const CONFIRMED_ORDER_STATUS: &str = "confirmed";
pub const ALIF_PAYMENT_METHOD: &str = "alif";

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = orders)]
pub struct OrderEntity {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub delivery_type: Option<String>,
    pub delivery_address: Option<String>,
    pub items: serde_json::Value,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = orders)]
pub struct InsertOrderEntity {
    pub payment_id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub delivery_type: Option<String>,
    pub delivery_address: Option<String>,
    pub items: serde_json::Value,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub payment_method: String,
}

impl InsertOrderEntity {
    /// Builds the confirmed order for a completed payment from its stored snapshot.
    ///
    /// Line items are copied as stored, so fields the storefront added survive.
    pub fn confirmed_from_payment(payment: &PaymentEntity) -> Self {
        let items = payment
            .order_data
            .get("items")
            .filter(|items| items.is_array())
            .cloned()
            .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));

        Self {
            payment_id: payment.id,
            order_number: payment.alif_order_id.clone(),
            customer_name: payment.customer_name.clone(),
            customer_phone: payment.customer_phone.clone(),
            customer_email: payment.customer_email.clone(),
            delivery_type: payment.delivery_type.clone(),
            delivery_address: payment.delivery_address.clone(),
            items,
            total_amount: payment.amount,
            currency: payment.currency.clone(),
            status: CONFIRMED_ORDER_STATUS.to_string(),
            payment_method: ALIF_PAYMENT_METHOD.to_string(),
        }
    }
}
