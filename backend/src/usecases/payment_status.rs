use std::sync::Arc;

use rust_decimal::Decimal;
use sakina_core::domain::{
    repositories::payments::PaymentRepository,
    value_objects::enums::payment_statuses::PaymentStatus,
};
use serde::Serialize;
use tracing::{debug, error};

use super::payment_errors::{PaymentError, UseCaseResult};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentStatusView {
    pub order_id: String,
    pub payment_status: PaymentStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

/// Read-only lookup used by the storefront's success page after the gateway redirect.
pub struct PaymentStatusUseCase<P>
where
    P: PaymentRepository + Send + Sync + 'static,
{
    payment_repo: Arc<P>,
}

impl<P> PaymentStatusUseCase<P>
where
    P: PaymentRepository + Send + Sync + 'static,
{
    pub fn new(payment_repo: Arc<P>) -> Self {
        Self { payment_repo }
    }

    pub async fn get_status(&self, order_id: &str) -> UseCaseResult<PaymentStatusView> {
        let payment = self
            .payment_repo
            .find_by_alif_order_id(order_id)
            .await
            .map_err(|err| {
                error!(%order_id, db_error = ?err, "payment_status: lookup failed");
                PaymentError::Internal(err)
            })?
            .ok_or_else(|| PaymentError::NotFound(format!("payment {order_id} not found")))?;

        let payment_status = payment.payment_status();
        debug!(%order_id, %payment_status, "payment_status: loaded");

        Ok(PaymentStatusView {
            order_id: payment.alif_order_id,
            payment_status,
            amount: payment.amount,
            currency: payment.currency,
        })
    }
}
