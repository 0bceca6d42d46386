//! Redis storage for guest carts. Each cart is one hash mapping product IDs
//! to quantities, scoped to a shop and a cart token.
use std::collections::HashMap;

use redis::AsyncCommands as _;
use uuid::Uuid;

use crate::{cache, services::errors::StorageError};

/// A connection to the cart store, checked out of the Redis pool.
pub struct Connection(cache::Connection);

/// Identifies one cart in the store.
pub struct CartKey(String);

impl CartKey {
    pub fn new(slug: &str, token: &str) -> Self {
        Self(format!("cart:{slug}:{token}"))
    }
}

impl Connection {
    pub async fn open(pool: &cache::Pool) -> Result<Self, StorageError> {
        Ok(Self(cache::connection(pool).await?))
    }

    /// All lines of a cart. Fields which are not product IDs are ignored.
    pub(super) async fn quantities(
        &mut self,
        key: &CartKey,
    ) -> Result<HashMap<Uuid, u32>, StorageError> {
        let raw: HashMap<String, u32> = self.0.hgetall(&key.0).await?;
        Ok(raw
            .into_iter()
            .filter_map(|(product, quantity)| {
                Uuid::parse_str(&product)
                    .ok()
                    .map(|product| (product, quantity))
            })
            .collect())
    }

    /// Atomically add to the quantity of a product and return the new quantity.
    pub(super) async fn increment(
        &mut self,
        key: &CartKey,
        product: Uuid,
        quantity: u32,
    ) -> Result<i64, StorageError> {
        Ok(self
            .0
            .hincr(&key.0, product.to_string(), i64::from(quantity))
            .await?)
    }

    /// Take back an earlier increment. The line is removed once it reaches 0.
    pub(super) async fn decrement(
        &mut self,
        key: &CartKey,
        product: Uuid,
        quantity: u32,
    ) -> Result<(), StorageError> {
        let remaining: i64 = self
            .0
            .hincr(&key.0, product.to_string(), -i64::from(quantity))
            .await?;
        if remaining <= 0 {
            self.remove(key, &[product]).await?;
        }
        Ok(())
    }

    /// Set the quantity of a product. 0 removes the line.
    pub(super) async fn set(
        &mut self,
        key: &CartKey,
        product: Uuid,
        quantity: u32,
    ) -> Result<(), StorageError> {
        if quantity == 0 {
            self.remove(key, &[product]).await
        } else {
            let _: () = self.0.hset(&key.0, product.to_string(), quantity).await?;
            Ok(())
        }
    }

    /// Remove lines from a cart.
    pub(super) async fn remove(
        &mut self,
        key: &CartKey,
        products: &[Uuid],
    ) -> Result<(), StorageError> {
        if products.is_empty() {
            return Ok(());
        }
        let fields: Vec<String> = products.iter().map(Uuid::to_string).collect();
        let _: () = self.0.hdel(&key.0, fields).await?;
        Ok(())
    }

    /// Reset the cart's expiry to `seconds` from now.
    pub(super) async fn touch(&mut self, key: &CartKey, seconds: u32) -> Result<(), StorageError> {
        let _: () = self.0.expire(&key.0, i64::from(seconds)).await?;
        Ok(())
    }

    /// Delete a cart entirely.
    pub(super) async fn clear(&mut self, key: &CartKey) -> Result<(), StorageError> {
        let _: () = self.0.del(&key.0).await?;
        Ok(())
    }
}
