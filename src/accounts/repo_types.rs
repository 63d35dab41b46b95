use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,                      // assigned by the store, 0 before insert
    pub name: String,                 // display name
    pub login_handle: String,         // unique, email-shaped
    pub password_hash: String,        // Argon2 PHC string, never leaves the service
    pub photo_url: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Fields of a user that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub login_handle: String,
    pub password_hash: String,
    pub photo_url: Option<String>,
}
