//! Models mapping to the appuser database table. Represents a user allowed to
//! call the authenticated API.
use serde::Serialize;
use sqlx::{query_as, FromRow, PgConnection};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    db::{errors::DatabaseError, ConnectionPool},
    utils::email::EmailAddress,
};

/// INSERT model for an `AppUser`. Used ONLY when creating a new user.
pub struct AppUserInsert {
    /// The user's email address. Private to enforce validity.
    email: String,
    /// The user's display name.
    pub name: String,
}

/// An `AppUser` which is stored in the database. Can only be constructed by
/// reading it from the database.
#[derive(Serialize, FromRow, Debug)]
pub struct AppUser {
    /// The user's ID primary key.
    id: Uuid,
    /// The user's email address.
    email: String,
    /// The user's display name.
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl AppUserInsert {
    /// Construct a new `AppUser` INSERT model.
    pub fn new(email: EmailAddress, name: &str) -> Self {
        Self {
            email: email.into(),
            name: name.to_owned(),
        }
    }

    /// Store this INSERT model in the database and return a complete `AppUser` model.
    pub async fn store(self, conn: &mut PgConnection) -> Result<AppUser, DatabaseError> {
        Ok(query_as::<_, AppUser>(
            "INSERT INTO appuser (email, name) VALUES ($1, $2) \
             RETURNING id, email, name, created_at",
        )
        .bind(self.email)
        .bind(self.name)
        .fetch_one(conn)
        .await?)
    }
}

impl AppUser {
    /// Get the `AppUser`'s ID primary key.
    pub const fn id(&self) -> Uuid {
        self.id
    }
    /// Get the user's email address.
    pub fn email(&self) -> &str {
        &self.email
    }
    /// Select an `AppUser` from the database by ID.
    pub async fn select_one(
        id: Uuid,
        db_client: &ConnectionPool,
    ) -> Result<Option<Self>, DatabaseError> {
        Ok(query_as::<_, Self>(
            "SELECT id, email, name, created_at FROM appuser WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db_client)
        .await?)
    }
    /// Select an `AppUser` from the database by email.
    pub async fn select_by_email(
        email: &str,
        db_client: &ConnectionPool,
    ) -> Result<Option<Self>, DatabaseError> {
        Ok(query_as::<_, Self>(
            "SELECT id, email, name, created_at FROM appuser WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(db_client)
        .await?)
    }
}
