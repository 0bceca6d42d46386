//! Models mapping to the `shop_order` database table. An order placed by a
//! guest customer through a shop's checkout.
use serde::Serialize;
use sqlx::{query_as, FromRow, PgConnection};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{errors::DatabaseError, ConnectionPool};

/// INSERT model for an `Order`. Used ONLY when placing a new order.
pub struct OrderInsert {
    pub shop_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub notes: Option<String>,
    /// The amount due in cents (EUR).
    pub total: i64,
}

/// An `Order` stored in the database.
#[derive(Serialize, FromRow, Debug)]
pub struct Order {
    id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub notes: Option<String>,
    total: i64,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub placed_at: OffsetDateTime,
}

const ORDER_COLUMNS: &str = "id, customer_name, customer_email, customer_phone, \
    shipping_address, notes, total, status, placed_at";

impl OrderInsert {
    /// Store this INSERT model and return the complete `Order`.
    pub async fn store(self, conn: &mut PgConnection) -> Result<Order, DatabaseError> {
        Ok(query_as::<_, Order>(&format!(
            "INSERT INTO shop_order
            (shop_id, customer_name, customer_email, customer_phone, shipping_address, notes, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ORDER_COLUMNS}"
        ))
        .bind(self.shop_id)
        .bind(self.customer_name)
        .bind(self.customer_email)
        .bind(self.customer_phone)
        .bind(self.shipping_address)
        .bind(self.notes)
        .bind(self.total)
        .fetch_one(conn)
        .await?)
    }
}

impl Order {
    /// Select an order by ID, only if it was placed in the given shop.
    pub async fn select_for_shop(
        shop_id: Uuid,
        id: Uuid,
        db_client: &ConnectionPool,
    ) -> Result<Option<Self>, DatabaseError> {
        Ok(query_as::<_, Self>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop_order WHERE shop_id = $1 AND id = $2"
        ))
        .bind(shop_id)
        .bind(id)
        .fetch_optional(db_client)
        .await?)
    }
    pub const fn id(&self) -> Uuid {
        self.id
    }
    /// The amount due in cents (EUR).
    pub const fn total(&self) -> i64 {
        self.total
    }
}
