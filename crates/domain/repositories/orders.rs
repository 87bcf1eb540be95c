use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::orders::InsertOrderEntity;

#[automock]
#[async_trait]
pub trait OrderRepository {
    /// Inserts a confirmed order for a payment. Returns `None` if one already exists for
    /// that payment.
    async fn insert_confirmed_order(&self, order: InsertOrderEntity) -> Result<Option<Uuid>>;
}
