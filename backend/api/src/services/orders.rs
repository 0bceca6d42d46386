//! Read access to placed orders for the confirmation page.
use serde::Serialize;
use uuid::Uuid;

use crate::db::{
    self,
    models::{order::Order, order_item::OrderItem, shop::Shop},
};

#[derive(Serialize)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Fetch an order of a shop with its items. Orders of other shops are
/// reported as non-existent.
pub async fn get_order_with_items(
    shop: &Shop,
    order_id: Uuid,
    db_conn: &db::ConnectionPool,
) -> Result<OrderWithItems, errors::OrderRetrievalError> {
    let order = Order::select_for_shop(shop.id(), order_id, db_conn)
        .await?
        .ok_or(errors::OrderRetrievalError::OrderNonExistent(order_id))?;
    let items = OrderItem::select_all(order.id(), db_conn).await?;
    Ok(OrderWithItems { order, items })
}

pub mod errors {
    use thiserror::Error;
    use uuid::Uuid;

    use crate::db::errors::DatabaseError;

    #[derive(Error, Debug)]
    pub enum OrderRetrievalError {
        #[error(transparent)]
        DatabaseError(#[from] DatabaseError),
        #[error("Order does not exist")]
        OrderNonExistent(Uuid),
    }
}
