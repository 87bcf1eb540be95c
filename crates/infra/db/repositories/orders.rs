use anyhow::Result;
use async_trait::async_trait;
use diesel::{OptionalExtension, RunQueryDsl, insert_into};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::orders},
};
use domain::{entities::orders::InsertOrderEntity, repositories::orders::OrderRepository};

pub struct OrderPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl OrderPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl OrderRepository for OrderPostgres {
    async fn insert_confirmed_order(&self, order: InsertOrderEntity) -> Result<Option<Uuid>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let order_id = insert_into(orders::table)
            .values(&order)
            .on_conflict(orders::payment_id)
            .do_nothing()
            .returning(orders::id)
            .get_result::<Uuid>(&mut conn)
            .optional()?;

        Ok(order_id)
    }
}
