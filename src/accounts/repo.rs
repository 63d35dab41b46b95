use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::accounts::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("login handle already taken")]
    UniqueViolation,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for user records, keyed by id and queryable by login handle.
///
/// Implementations own the uniqueness of `login_handle`: `insert` and
/// `replace` must fail with [`StoreError::UniqueViolation`] when another
/// record already holds the handle, even under concurrent calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    async fn find_by_handle(&self, login_handle: &str) -> StoreResult<Option<User>>;
    async fn list(&self) -> StoreResult<Vec<User>>;
    async fn insert(&self, user: NewUser) -> StoreResult<User>;
    /// Overwrite every field of the record with `user.id`; `None` if no such record.
    async fn replace(&self, user: &User) -> StoreResult<Option<User>>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_error(e: sqlx::Error, what: &'static str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation,
        _ => StoreError::Backend(anyhow::Error::new(e).context(what)),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, login_handle, password_hash, photo_url, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_handle(&self, login_handle: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, login_handle, password_hash, photo_url, created_at
            FROM users
            WHERE login_handle = $1
            "#,
        )
        .bind(login_handle)
        .fetch_optional(&self.db)
        .await
        .context("find user by login handle")?;
        Ok(user)
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, login_handle, password_hash, photo_url, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(users)
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, login_handle, password_hash, photo_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, login_handle, password_hash, photo_url, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.login_handle)
        .bind(&user.password_hash)
        .bind(&user.photo_url)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_write_error(e, "insert user"))
    }

    async fn replace(&self, user: &User) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name = $2, login_handle = $3, password_hash = $4, photo_url = $5
             WHERE id = $1
            RETURNING id, name, login_handle, password_hash, photo_url, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.login_handle)
        .bind(&user.password_hash)
        .bind(&user.photo_url)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_write_error(e, "replace user"))
    }
}
