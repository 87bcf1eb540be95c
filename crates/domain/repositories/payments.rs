use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::payments::{
    InsertPaymentEntity, PaymentCallbackChangeset, PaymentEntity,
};

#[automock]
#[async_trait]
pub trait PaymentRepository {
    async fn insert_pending_payment(&self, payment: InsertPaymentEntity) -> Result<Uuid>;

    async fn find_by_alif_order_id(&self, alif_order_id: &str) -> Result<Option<PaymentEntity>>;

    /// Applies the changeset only if the row is still `pending`.
    ///
    /// Returns the updated row, or `None` when the row had already left `pending`
    /// (or no longer exists), in which case nothing was written.
    async fn transition_from_pending(
        &self,
        payment_id: Uuid,
        changeset: PaymentCallbackChangeset,
    ) -> Result<Option<PaymentEntity>>;
}
