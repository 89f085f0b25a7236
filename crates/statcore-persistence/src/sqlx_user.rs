use crate::repository::UserRepository;
use crate::time::{from_millis, to_millis};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{AnyPool, Row};
use statcore_core::CoreError;
use statcore_model::User;

pub struct SqlxUserRepository {
    pool: AnyPool,
}

impl SqlxUserRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn touch(&self, user_id: &str, now: DateTime<Utc>) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| CoreError::internal(err))?;

        let existing = sqlx::query("SELECT first_seen_at, seen_count FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|err| CoreError::internal(err))?;

        match existing {
            Some(row) => {
                let seen_count: i64 = row.try_get(1).map_err(|err| CoreError::internal(err))?;
                sqlx::query(
                    "UPDATE users SET last_seen_at = ?, seen_count = ? WHERE user_id = ?",
                )
                .bind(to_millis(now))
                .bind(seen_count + 1)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|err| CoreError::internal(err))?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO users (user_id, first_seen_at, last_seen_at, seen_count) VALUES (?, ?, ?, ?)",
                )
                .bind(user_id)
                .bind(to_millis(now))
                .bind(to_millis(now))
                .bind(1_i64)
                .execute(&mut *tx)
                .await
                .map_err(|err| CoreError::internal(err))?;
            }
        }

        tx.commit().await.map_err(|err| CoreError::internal(err))?;
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<User>, CoreError> {
        let row = sqlx::query(
            "SELECT first_seen_at, last_seen_at, seen_count FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| CoreError::internal(err))?;

        row.map(|row| {
            let first_seen_at: i64 = row.try_get(0).map_err(|err| CoreError::internal(err))?;
            let last_seen_at: i64 = row.try_get(1).map_err(|err| CoreError::internal(err))?;
            let seen_count: i64 = row.try_get(2).map_err(|err| CoreError::internal(err))?;
            Ok(User {
                user_id: user_id.to_string(),
                first_seen_at: from_millis(first_seen_at),
                last_seen_at: from_millis(last_seen_at),
                seen_count,
            })
        })
        .transpose()
    }
}
