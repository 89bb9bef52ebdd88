//! SQLite user and API key repository implementation.

use chrono::{DateTime, Duration, Utc};
use exprflow_core::repository::user::{IssuedCredentials, UserRepository};
use exprflow_types::error::RepositoryError;
use exprflow_types::expression::UserId;

use super::expression::{format_datetime, parse_datetime};
use super::pool::DatabasePool;
use crate::crypto::hash::{generate_api_key, hash_api_key};

/// Minimum gap, in seconds, between two `last_used_at` writes for one key.
const LAST_USED_RESOLUTION_SECS: i64 = 60;

/// Whether a key last stamped at `last_used` should be stamped again at `now`.
/// Unparseable stamps are rewritten.
fn needs_touch(last_used: Option<&str>, now: DateTime<Utc>) -> bool {
    match last_used.map(parse_datetime) {
        Some(Ok(at)) => now - at >= Duration::seconds(LAST_USED_RESOLUTION_SECS),
        _ => true,
    }
}

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, name: &str) -> Result<IssuedCredentials, RepositoryError> {
        let now = format_datetime(&Utc::now());
        let api_key = generate_api_key();

        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let inserted = sqlx::query("INSERT INTO users (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(&now)
            .execute(&mut *tx)
            .await;

        let user_id: UserId = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                return Err(RepositoryError::Conflict(format!(
                    "user '{name}' already exists"
                )));
            }
            Err(e) => return Err(RepositoryError::Query(e.to_string())),
        };

        sqlx::query("INSERT INTO api_keys (key_hash, user_id, created_at) VALUES (?, ?, ?)")
            .bind(hash_api_key(&api_key))
            .bind(user_id)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tracing::info!(user_id, name, "user created");
        Ok(IssuedCredentials { user_id, api_key })
    }

    async fn authenticate(&self, api_key: &str) -> Result<Option<UserId>, RepositoryError> {
        let key_hash = hash_api_key(api_key);

        let row: Option<(UserId, Option<String>)> =
            sqlx::query_as("SELECT user_id, last_used_at FROM api_keys WHERE key_hash = ?")
                .bind(&key_hash)
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some((user_id, last_used)) = row else {
            return Ok(None);
        };

        // At most one writer round-trip per key and window.
        let now = Utc::now();
        if needs_touch(last_used.as_deref(), now) {
            if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE key_hash = ?")
                .bind(format_datetime(&now))
                .bind(&key_hash)
                .execute(&self.pool.writer)
                .await
            {
                tracing::debug!(error = %e, "failed to update api key last_used_at");
            }
        }

        Ok(Some(user_id))
    }
}
