use anyhow::{Context, Result};
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::{
    aliases::DbPool,
    models::{
        CreateOrderEntity, CreateOrderItemEntity, OrderEntity, OrderItemEntity, OrderItemSnapshot,
        OrderWithItems,
    },
    repositories::OrderRepository,
    schema::{order_items, orders},
};

#[derive(Clone)]
pub struct PgOrderRepository {
    pool: DbPool,
}

impl PgOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(
        &self,
        order: CreateOrderEntity,
        items: Vec<OrderItemSnapshot>,
    ) -> Result<OrderWithItems> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let created = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    let order: OrderEntity = diesel::insert_into(orders::table)
                        .values(order)
                        .returning(OrderEntity::as_returning())
                        .get_result(conn)
                        .await
                        .context("Failed to create order")?;

                    let new_items: Vec<CreateOrderItemEntity> = items
                        .into_iter()
                        .map(|item| item.into_entity(order.id))
                        .collect();

                    let order_items: Vec<OrderItemEntity> =
                        diesel::insert_into(order_items::table)
                            .values(new_items)
                            .returning(OrderItemEntity::as_returning())
                            .get_results(conn)
                            .await
                            .context("Failed to create order items")?;

                    Ok::<OrderWithItems, anyhow::Error>(OrderWithItems { order, order_items })
                })
            })
            .await
            .context("Transaction failed")?;

        Ok(created)
    }

    async fn find(&self, id: i32) -> Result<Option<OrderWithItems>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let order: Option<OrderEntity> = orders::table
            .find(id)
            .get_result(conn)
            .await
            .optional()
            .context("Failed to get order")?;

        let Some(order) = order else {
            return Ok(None);
        };

        let order_items: Vec<OrderItemEntity> = order_items::table
            .filter(order_items::order_id.eq(order.id))
            .order_by(order_items::id.asc())
            .get_results(conn)
            .await
            .context("Failed to get order items")?;

        Ok(Some(OrderWithItems { order, order_items }))
    }
}
