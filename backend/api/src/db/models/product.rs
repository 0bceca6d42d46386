//! Models mapping to the product database table. Represents a purchaseable
//! product in a shop.
use serde::Serialize;
use sqlx::{query, query_as, FromRow, PgConnection};
use uuid::Uuid;

use crate::db::{errors::DatabaseError, ConnectionPool};

/// A `Product` which is stored in the database. Only listed products are ever
/// read by the public shop, so the listing flag is not carried on the model.
#[derive(Serialize, FromRow, Clone, Debug)]
pub struct Product {
    /// The product's ID primary key.
    pub(crate) id: Uuid,
    /// The name of the product.
    pub name: String,
    /// A description of the product.
    pub description: String,
    /// The price of the product in cents (EUR).
    pub(crate) price: i64,
    /// The count of the product left in stock.
    pub(crate) stock: i64,
}

/// Columns selected for every `Product` query.
const PRODUCT_COLUMNS: &str = "id, name, description, price, stock";

impl Product {
    /// Retrieve all listed products of a shop, ordered by name.
    pub async fn select_listed(
        shop_id: Uuid,
        db_client: &ConnectionPool,
    ) -> Result<Vec<Self>, DatabaseError> {
        Ok(query_as::<_, Self>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE shop_id = $1 AND listed ORDER BY name"
        ))
        .bind(shop_id)
        .fetch_all(db_client)
        .await?)
    }
    /// Select one listed product of a shop by its ID.
    pub async fn select_listed_one(
        shop_id: Uuid,
        id: Uuid,
        db_client: &ConnectionPool,
    ) -> Result<Option<Self>, DatabaseError> {
        Ok(query_as::<_, Self>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE shop_id = $1 AND id = $2 AND listed"
        ))
        .bind(shop_id)
        .bind(id)
        .fetch_optional(db_client)
        .await?)
    }
    /// Select the listed products of a shop among the given IDs. IDs which do
    /// not match a listed product are silently left out.
    pub async fn select_listed_many(
        shop_id: Uuid,
        ids: &[Uuid],
        db_client: &ConnectionPool,
    ) -> Result<Vec<Self>, DatabaseError> {
        Ok(query_as::<_, Self>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE shop_id = $1 AND id = ANY($2) AND listed"
        ))
        .bind(shop_id)
        .bind(ids)
        .fetch_all(db_client)
        .await?)
    }
    /// Select a listed product and lock its row until the surrounding
    /// transaction ends.
    pub async fn select_listed_for_update(
        shop_id: Uuid,
        id: Uuid,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>, DatabaseError> {
        Ok(query_as::<_, Self>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product \
             WHERE shop_id = $1 AND id = $2 AND listed FOR UPDATE"
        ))
        .bind(shop_id)
        .bind(id)
        .fetch_optional(conn)
        .await?)
    }
    /// Take `count` units out of stock. The row must already be locked.
    pub async fn remove_stock(
        &mut self,
        count: u32,
        conn: &mut PgConnection,
    ) -> Result<(), DatabaseError> {
        let count = i64::from(count);
        query("UPDATE product SET stock = stock - $1 WHERE id = $2")
            .bind(count)
            .bind(self.id)
            .execute(conn)
            .await?;
        self.stock -= count;
        Ok(())
    }
    /// Get this product's ID primary key.
    pub const fn id(&self) -> Uuid {
        self.id
    }
    /// Get the price of this product in cents (EUR).
    pub const fn price(&self) -> i64 {
        self.price
    }
    /// Get the count of this product in stock.
    pub const fn stock(&self) -> i64 {
        self.stock
    }
    /// Whether `count` units can be taken from stock.
    pub fn has_stock_for(&self, count: u64) -> bool {
        u64::try_from(self.stock).is_ok_and(|stock| stock >= count)
    }
}
