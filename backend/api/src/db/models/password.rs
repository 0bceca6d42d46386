//! Models mapping to the password database table. Represents a password-based
//! credential used by a user.
use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier as _,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use sqlx::{query_as, FromRow, PgConnection};
use uuid::Uuid;

use crate::db::{errors::DatabaseError, ConnectionPool};

/// INSERT model for a `Password`. Used ONLY when adding a new credential.
pub struct PasswordInsert {
    /// The hashed password string.
    password: String,
}

/// A `Password` which is stored in the database. Can only be constructed
/// by reading it from the database.
#[derive(FromRow)]
pub struct Password {
    /// The hashed password string.
    password: String,
}

/// Instantiate an Argon2 context with the standard parameters.
fn create_argon2<'a>() -> Result<Argon2<'a>, argon2::Error> {
    Ok(Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(12288, 3, 1, None)?,
    ))
}

/// Convert a raw password string into a hashed PHC representation.
fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let argon2 = create_argon2()?;
    let salt = SaltString::generate(&mut OsRng);
    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Check a raw password against a PHC hash string. Malformed hashes never verify.
fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    create_argon2().is_ok_and(|argon2| {
        argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

impl PasswordInsert {
    /// Construct a new password INSERT model, hashing the raw password.
    pub fn new(password: &str) -> Result<Self, password_hash::Error> {
        Ok(Self {
            password: hash_password(password)?,
        })
    }
    /// Store this credential for a user and return a complete `Password` model.
    pub async fn store(
        self,
        user_id: Uuid,
        conn: &mut PgConnection,
    ) -> Result<Password, DatabaseError> {
        Ok(query_as::<_, Password>(
            "INSERT INTO password (user_id, password) VALUES ($1, $2) RETURNING password",
        )
        .bind(user_id)
        .bind(self.password)
        .fetch_one(conn)
        .await?)
    }
}

impl Password {
    /// Verify that a given plaintext password matches this credential.
    pub fn verify(&self, password: &str) -> bool {
        verify_password(password, &self.password)
    }
    /// Select a password credential from the database by the corresponding user's ID.
    pub async fn select(
        user_id: Uuid,
        db_client: &ConnectionPool,
    ) -> Result<Option<Self>, DatabaseError> {
        Ok(query_as::<_, Self>("SELECT password FROM password WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(db_client)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies_only_the_original() {
        let hash = hash_password("correct horse battery staple").expect("hashing failed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("Correct horse battery staple", &hash));
    }

    #[test]
    fn stored_credential_rejects_a_wrong_password() {
        let credential = Password {
            password: PasswordInsert::new("correct horse battery staple")
                .unwrap()
                .password,
        };
        assert!(credential.verify("correct horse battery staple"));
        assert!(!credential.verify("correct horse battery stapler"));
        assert!(!credential.verify(""));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
