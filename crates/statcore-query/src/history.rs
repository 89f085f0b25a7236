//! Bucketed history sampling (§4.5): divide the requested window into
//! `limit / 2` equal sub-intervals and keep the first and last snapshot of
//! each, de-duplicated by `db_id`.

use chrono::{DateTime, Utc};
use statcore_core::CoreError;
use statcore_model::PlayerSnapshot;
use statcore_persistence::PlayerRepository;
use std::collections::HashSet;

const MIN_LIMIT: i64 = 2;
const MAX_LIMIT: i64 = 1000;

pub async fn get_history(
    repo: &dyn PlayerRepository,
    uuid: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<PlayerSnapshot>, CoreError> {
    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(CoreError::invalid_input(format!(
            "limit must be between {MIN_LIMIT} and {MAX_LIMIT}, got {limit}"
        )));
    }
    if end <= start {
        return Err(CoreError::invalid_input("end must be after start"));
    }

    let snapshots = repo.snapshots_in_range(uuid, start, end).await?;
    let num_intervals = (limit / 2) as usize;
    let span = end - start;
    let width = span / num_intervals as i32;

    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for i in 0..num_intervals {
        let a = start + width * i as i32;
        let last_bucket = i == num_intervals - 1;
        let b = if last_bucket {
            end
        } else {
            start + width * (i as i32 + 1)
        };

        let bucket: Vec<&PlayerSnapshot> = snapshots
            .iter()
            .filter(|s| {
                s.queried_at >= a && if last_bucket { s.queried_at <= b } else { s.queried_at < b }
            })
            .collect();

        let Some(first) = bucket.first() else {
            continue;
        };
        let last = bucket.last().unwrap();

        for snapshot in [*first, *last] {
            if let Some(db_id) = snapshot.db_id {
                if seen.insert(db_id) {
                    result.push(snapshot.clone());
                }
            }
        }
    }

    result.sort_by_key(|s| s.queried_at);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use statcore_model::FiveGamemodes;

    struct FakeRepo {
        snapshots: Vec<PlayerSnapshot>,
    }

    fn snap(uuid: &str, t: DateTime<Utc>, games_played: i64) -> PlayerSnapshot {
        let mut five = FiveGamemodes::default();
        five.overall.games_played = games_played;
        PlayerSnapshot {
            db_id: Some(uuid::Uuid::now_v7()),
            uuid: uuid.to_string(),
            queried_at: t,
            experience: games_played * 100,
            five_gamemodes: five,
            nickname: None,
            tags: None,
        }
    }

    #[async_trait]
    impl PlayerRepository for FakeRepo {
        async fn store_player(
            &self,
            snapshot: PlayerSnapshot,
            _now: DateTime<Utc>,
        ) -> Result<PlayerSnapshot, CoreError> {
            Ok(snapshot)
        }
        async fn snapshots_in_range(
            &self,
            _uuid: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<PlayerSnapshot>, CoreError> {
            Ok(self
                .snapshots
                .iter()
                .filter(|s| s.queried_at >= start && s.queried_at <= end)
                .cloned()
                .collect())
        }
        async fn all_snapshots(&self, _uuid: &str) -> Result<Vec<PlayerSnapshot>, CoreError> {
            Ok(self.snapshots.clone())
        }
    }

    #[tokio::test]
    async fn rejects_limit_out_of_range() {
        let repo = FakeRepo { snapshots: vec![] };
        let t0 = Utc::now();
        let err = get_history(&repo, "u", t0, t0 + Duration::hours(1), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn empty_range_yields_empty_history() {
        let repo = FakeRepo { snapshots: vec![] };
        let t0 = Utc::now();
        let out = get_history(&repo, "u", t0, t0 + Duration::hours(1), 4)
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn history_of_two_returns_both_oldest_first() {
        let t0 = Utc::now();
        let s1 = snap("u", t0 + Duration::minutes(1), 1);
        let s2 = snap("u", t0 + Duration::hours(23) + Duration::minutes(59), 0);
        let repo = FakeRepo {
            snapshots: vec![s1.clone(), s2.clone()],
        };
        let out = get_history(&repo, "u", t0, t0 + Duration::hours(24), 4)
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].db_id, s1.db_id);
        assert_eq!(out[1].db_id, s2.db_id);
    }

    #[tokio::test]
    async fn dense_bucket_collapses_to_first_and_last() {
        let t0 = Utc::now();
        let mut snapshots = Vec::new();
        for m in 0..50 {
            snapshots.push(snap("u", t0 + Duration::minutes(m), m));
        }
        let repo = FakeRepo {
            snapshots: snapshots.clone(),
        };
        let out = get_history(&repo, "u", t0, t0 + Duration::minutes(50), 2)
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].db_id, snapshots.first().unwrap().db_id);
        assert_eq!(out[1].db_id, snapshots.last().unwrap().db_id);
    }

    #[tokio::test]
    async fn result_never_exceeds_limit() {
        let t0 = Utc::now();
        let mut snapshots = Vec::new();
        for m in 0..200 {
            snapshots.push(snap("u", t0 + Duration::minutes(m), m));
        }
        let repo = FakeRepo { snapshots };
        let out = get_history(&repo, "u", t0, t0 + Duration::minutes(200), 10)
            .await
            .unwrap();
        assert!(out.len() <= 10);
        let mut sorted = out.clone();
        sorted.sort_by_key(|s| s.queried_at);
        assert_eq!(out, sorted);
    }
}
