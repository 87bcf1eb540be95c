use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    entities::payments::PaymentEntity,
    value_objects::enums::notification_checkpoints::NotificationCheckpoint,
};

/// Staff-facing notice that a payment reached a checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentNotification {
    pub payment_id: Uuid,
    pub checkpoint: NotificationCheckpoint,
    pub alif_order_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_type: Option<String>,
}

impl PaymentNotification {
    pub fn from_payment(payment: &PaymentEntity, checkpoint: NotificationCheckpoint) -> Self {
        Self {
            payment_id: payment.id,
            checkpoint,
            alif_order_id: payment.alif_order_id.clone(),
            amount: payment.amount,
            currency: payment.currency.clone(),
            customer_name: payment.customer_name.clone(),
            customer_phone: payment.customer_phone.clone(),
            delivery_type: payment.delivery_type.clone(),
        }
    }
}
