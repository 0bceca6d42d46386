use serde::Serialize;
use sqlx::{query_as, FromRow, PgConnection};
use uuid::Uuid;

use crate::db::{errors::DatabaseError, ConnectionPool};

/// INSERT model for an `OrderItem`. Name and price are copied from the
/// product so the order is unaffected by later catalog edits.
pub struct OrderItemInsert {
    order_id: Uuid,
    product_id: Uuid,
    product_name: String,
    unit_price: i64,
    quantity: i64,
}

#[derive(Serialize, FromRow, Debug)]
pub struct OrderItem {
    product_id: Uuid,
    pub product_name: String,
    unit_price: i64,
    quantity: i64,
}

impl OrderItemInsert {
    pub fn new(
        order_id: Uuid,
        product_id: Uuid,
        product_name: &str,
        unit_price: i64,
        quantity: u32,
    ) -> Self {
        Self {
            order_id,
            product_id,
            product_name: product_name.to_owned(),
            unit_price,
            quantity: i64::from(quantity),
        }
    }
    pub async fn store(self, conn: &mut PgConnection) -> Result<OrderItem, DatabaseError> {
        Ok(query_as::<_, OrderItem>(
            "INSERT INTO order_item (order_id, product_id, product_name, unit_price, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING product_id, product_name, unit_price, quantity",
        )
        .bind(self.order_id)
        .bind(self.product_id)
        .bind(self.product_name)
        .bind(self.unit_price)
        .bind(self.quantity)
        .fetch_one(conn)
        .await?)
    }
}

impl OrderItem {
    pub async fn select_all(
        order_id: Uuid,
        db_client: &ConnectionPool,
    ) -> Result<Vec<Self>, DatabaseError> {
        Ok(query_as::<_, Self>(
            "SELECT product_id, product_name, unit_price, quantity FROM order_item
            WHERE order_id = $1 ORDER BY product_name",
        )
        .bind(order_id)
        .fetch_all(db_client)
        .await?)
    }
}
