use crate::payload::StoredPayload;
use crate::repository::PlayerRepository;
use crate::time::{from_millis, to_millis};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{AnyPool, Row};
use statcore_core::CoreError;
use statcore_model::PlayerSnapshot;

/// `GAMES_PLAYED_JUMP_TOLERANCE`'s sibling constants for the dedup guard
/// (§4.4): a row within the last minute suppresses the write outright; a row
/// within the last hour suppresses it only if the payload is unchanged.
const RECENCY_GUARD: Duration = Duration::minutes(1);
const DUPLICATE_GUARD: Duration = Duration::hours(1);

pub struct SqlxPlayerRepository {
    pool: AnyPool,
}

impl SqlxPlayerRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    fn row_to_snapshot(
        uuid: String,
        queried_at_millis: i64,
        db_id: String,
        payload_json: String,
    ) -> Result<PlayerSnapshot, CoreError> {
        let payload: StoredPayload =
            serde_json::from_str(&payload_json).map_err(|err| CoreError::internal(err))?;
        let db_id = uuid::Uuid::parse_str(&db_id)
            .map_err(|err| CoreError::internal(anyhow::anyhow!("corrupt db_id: {err}")))?;
        Ok(PlayerSnapshot {
            db_id: Some(db_id),
            uuid,
            queried_at: from_millis(queried_at_millis),
            experience: payload.experience,
            five_gamemodes: payload.five_gamemodes,
            nickname: payload.nickname,
            tags: payload.tags,
        })
    }
}

#[async_trait]
impl PlayerRepository for SqlxPlayerRepository {
    async fn store_player(
        &self,
        snapshot: PlayerSnapshot,
        now: DateTime<Utc>,
    ) -> Result<PlayerSnapshot, CoreError> {
        let _ = now; // the guard windows are relative to snapshot.queried_at, not wall clock.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| CoreError::internal(err))?;

        let recency_cutoff = to_millis(snapshot.queried_at - RECENCY_GUARD);
        let recent = sqlx::query(
            "SELECT id FROM stats WHERE player_uuid = ? AND queried_at > ? LIMIT 1",
        )
        .bind(snapshot.uuid.clone())
        .bind(recency_cutoff)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| CoreError::internal(err))?;

        if recent.is_some() {
            tx.commit().await.map_err(|err| CoreError::internal(err))?;
            return Ok(snapshot);
        }

        let dedup_cutoff = to_millis(snapshot.queried_at - DUPLICATE_GUARD);
        let last_row = sqlx::query(
            "SELECT player_data FROM stats WHERE player_uuid = ? AND queried_at > ? ORDER BY queried_at DESC LIMIT 1",
        )
        .bind(snapshot.uuid.clone())
        .bind(dedup_cutoff)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| CoreError::internal(err))?;

        if let Some(row) = last_row {
            let payload_json: String = row.try_get(0).map_err(|err| CoreError::internal(err))?;
            let existing: StoredPayload =
                serde_json::from_str(&payload_json).map_err(|err| CoreError::internal(err))?;
            let candidate = StoredPayload {
                experience: snapshot.experience,
                five_gamemodes: snapshot.five_gamemodes,
                nickname: snapshot.nickname.clone(),
                tags: snapshot.tags,
            };
            if existing.experience == candidate.experience
                && existing.five_gamemodes == candidate.five_gamemodes
            {
                tx.commit().await.map_err(|err| CoreError::internal(err))?;
                return Ok(snapshot);
            }
        }

        let db_id = uuid::Uuid::now_v7();
        let payload = StoredPayload {
            experience: snapshot.experience,
            five_gamemodes: snapshot.five_gamemodes,
            nickname: snapshot.nickname.clone(),
            tags: snapshot.tags,
        };
        let payload_json = serde_json::to_string(&payload).map_err(|err| CoreError::internal(err))?;

        sqlx::query(
            "INSERT INTO stats (id, player_uuid, queried_at, data_format_version, player_data) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(db_id.to_string())
        .bind(snapshot.uuid.clone())
        .bind(to_millis(snapshot.queried_at))
        .bind(1_i64)
        .bind(payload_json)
        .execute(&mut *tx)
        .await
        .map_err(|err| CoreError::internal(err))?;

        tx.commit().await.map_err(|err| CoreError::internal(err))?;

        let mut stored = snapshot;
        stored.db_id = Some(db_id);
        Ok(stored)
    }

    async fn snapshots_in_range(
        &self,
        uuid: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PlayerSnapshot>, CoreError> {
        let rows = sqlx::query(
            "SELECT id, player_uuid, queried_at, player_data FROM stats \
             WHERE player_uuid = ? AND queried_at >= ? AND queried_at <= ? \
             ORDER BY queried_at ASC",
        )
        .bind(uuid)
        .bind(to_millis(start))
        .bind(to_millis(end))
        .fetch_all(&self.pool)
        .await
        .map_err(|err| CoreError::internal(err))?;

        rows.into_iter()
            .map(|row| {
                let db_id: String = row.try_get(0).map_err(|err| CoreError::internal(err))?;
                let uuid: String = row.try_get(1).map_err(|err| CoreError::internal(err))?;
                let queried_at: i64 = row.try_get(2).map_err(|err| CoreError::internal(err))?;
                let payload_json: String = row.try_get(3).map_err(|err| CoreError::internal(err))?;
                Self::row_to_snapshot(uuid, queried_at, db_id, payload_json)
            })
            .collect()
    }

    async fn all_snapshots(&self, uuid: &str) -> Result<Vec<PlayerSnapshot>, CoreError> {
        let rows = sqlx::query(
            "SELECT id, player_uuid, queried_at, player_data FROM stats \
             WHERE player_uuid = ? ORDER BY queried_at ASC",
        )
        .bind(uuid)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| CoreError::internal(err))?;

        rows.into_iter()
            .map(|row| {
                let db_id: String = row.try_get(0).map_err(|err| CoreError::internal(err))?;
                let uuid: String = row.try_get(1).map_err(|err| CoreError::internal(err))?;
                let queried_at: i64 = row.try_get(2).map_err(|err| CoreError::internal(err))?;
                let payload_json: String = row.try_get(3).map_err(|err| CoreError::internal(err))?;
                Self::row_to_snapshot(uuid, queried_at, db_id, payload_json)
            })
            .collect()
    }
}
