//! Models mapping to the shop database table. Each shop is a storefront
//! addressed by its slug.
use serde::Serialize;
use sqlx::{query_as, FromRow};
use uuid::Uuid;

use crate::db::{errors::DatabaseError, ConnectionPool};

/// A `Shop` which is stored in the database. Can only be constructed by
/// reading it from the database.
#[derive(Serialize, FromRow, Clone, Debug)]
pub struct Shop {
    /// The shop's ID primary key.
    pub(crate) id: Uuid,
    /// The URL-friendly identifier of the shop.
    pub slug: String,
    /// The display name of the shop.
    pub name: String,
    /// A description of the shop.
    pub description: String,
}

impl Shop {
    /// Select an active `Shop` by its slug. Inactive shops are never returned.
    pub async fn select_active_by_slug(
        slug: &str,
        db_client: &ConnectionPool,
    ) -> Result<Option<Self>, DatabaseError> {
        Ok(query_as::<_, Self>(
            "SELECT id, slug, name, description FROM shop WHERE slug = $1 AND active",
        )
        .bind(slug)
        .fetch_optional(db_client)
        .await?)
    }
    /// Get this shop's ID primary key.
    pub const fn id(&self) -> Uuid {
        self.id
    }
}
