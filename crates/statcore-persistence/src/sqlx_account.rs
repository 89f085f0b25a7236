use crate::time::{from_millis, to_millis};
use async_trait::async_trait;
use sqlx::{AnyPool, Row};
use statcore_core::CoreError;
use statcore_model::Account;

use crate::repository::AccountRepository;

pub struct SqlxAccountRepository {
    pool: AnyPool,
}

impl SqlxAccountRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for SqlxAccountRepository {
    async fn get_by_username(&self, username_lower: &str) -> Result<Option<Account>, CoreError> {
        let row = sqlx::query(
            "SELECT player_uuid, username, queried_at FROM usernames WHERE username_lower = ?",
        )
        .bind(username_lower)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| CoreError::internal(err))?;

        row.map(|row| {
            let uuid: String = row.try_get(0).map_err(|err| CoreError::internal(err))?;
            let username: String = row.try_get(1).map_err(|err| CoreError::internal(err))?;
            let queried_at: i64 = row.try_get(2).map_err(|err| CoreError::internal(err))?;
            Ok(Account::new(uuid, username, from_millis(queried_at)))
        })
        .transpose()
    }

    async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Account>, CoreError> {
        let row = sqlx::query(
            "SELECT player_uuid, username, queried_at FROM usernames WHERE player_uuid = ?",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| CoreError::internal(err))?;

        row.map(|row| {
            let uuid: String = row.try_get(0).map_err(|err| CoreError::internal(err))?;
            let username: String = row.try_get(1).map_err(|err| CoreError::internal(err))?;
            let queried_at: i64 = row.try_get(2).map_err(|err| CoreError::internal(err))?;
            Ok(Account::new(uuid, username, from_millis(queried_at)))
        })
        .transpose()
    }

    async fn store(&self, account: &Account) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| CoreError::internal(err))?;

        let username_lower = account.username.to_lowercase();

        // A prior row may hold this username under a different uuid
        // (reassignment) or this uuid under a different username (rename).
        // Either conflicting row's prior entry is appended to the audit
        // table before being replaced (§6).
        let conflicting = sqlx::query(
            "SELECT player_uuid, username, queried_at FROM usernames \
             WHERE username_lower = ? OR player_uuid = ?",
        )
        .bind(&username_lower)
        .bind(&account.uuid)
        .fetch_all(&mut *tx)
        .await
        .map_err(|err| CoreError::internal(err))?;

        for row in &conflicting {
            let prior_uuid: String = row.try_get(0).map_err(|err| CoreError::internal(err))?;
            let prior_username: String = row.try_get(1).map_err(|err| CoreError::internal(err))?;
            let prior_queried_at: i64 = row.try_get(2).map_err(|err| CoreError::internal(err))?;
            sqlx::query(
                "INSERT INTO username_queries (player_uuid, username, last_queried_at) VALUES (?, ?, ?)",
            )
            .bind(prior_uuid)
            .bind(prior_username)
            .bind(prior_queried_at)
            .execute(&mut *tx)
            .await
            .map_err(|err| CoreError::internal(err))?;
        }

        sqlx::query("DELETE FROM usernames WHERE username_lower = ? OR player_uuid = ?")
            .bind(&username_lower)
            .bind(&account.uuid)
            .execute(&mut *tx)
            .await
            .map_err(|err| CoreError::internal(err))?;

        sqlx::query(
            "INSERT INTO usernames (player_uuid, username, username_lower, queried_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&account.uuid)
        .bind(&account.username)
        .bind(&username_lower)
        .bind(to_millis(account.queried_at))
        .execute(&mut *tx)
        .await
        .map_err(|err| CoreError::internal(err))?;

        tx.commit().await.map_err(|err| CoreError::internal(err))?;
        Ok(())
    }

    async fn delete_by_username(&self, username_lower: &str) -> Result<(), CoreError> {
        sqlx::query("DELETE FROM usernames WHERE username_lower = ?")
            .bind(username_lower)
            .execute(&self.pool)
            .await
            .map_err(|err| CoreError::internal(err))?;
        Ok(())
    }
}
