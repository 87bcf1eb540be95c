use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    domain::value_objects::enums::payment_statuses::PaymentStatus,
    infra::db::postgres::schema::payments,
};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payments)]
pub struct PaymentEntity {
    pub id: Uuid,
    pub alif_order_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub order_data: serde_json::Value,
    pub alif_transaction_id: Option<String>,
    pub alif_callback_payload: Option<serde_json::Value>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub delivery_type: Option<String>,
    pub delivery_address: Option<String>,
    pub payment_gateway: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentEntity {
    /// Unknown stored values are treated as failed rather than pending so they can never be
    /// moved again by a callback.
    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::from_stored(&self.status).unwrap_or(PaymentStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payments)]
pub struct InsertPaymentEntity {
    pub alif_order_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub order_data: serde_json::Value,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub delivery_type: Option<String>,
    pub delivery_address: Option<String>,
    pub payment_gateway: String,
}

/// Columns written by the callback reconciler. Applied only while the row is still pending.
#[derive(Debug, Clone, PartialEq, AsChangeset)]
#[diesel(table_name = payments)]
pub struct PaymentCallbackChangeset {
    pub status: String,
    pub alif_transaction_id: Option<String>,
    pub alif_callback_payload: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}
