//! Milestone finding (§4.7): a star/experience achievement query plus the
//! star-to-experience conversion the `Stars` stat is expressed in terms of.
//!
//! Experience costs repeat every prestige (100 stars): the offsets within a
//! prestige cost `{500, 1000, 2000, 3500, 5000 * 96}` respectively. Both
//! conversions are derived from that single table rather than hand-tuned
//! separately, so they stay inverses of each other by construction.

use chrono::{DateTime, Utc};
use statcore_core::CoreError;
use statcore_model::{Gamemode, PlayerSnapshot};
use statcore_persistence::PlayerRepository;

/// Experience cost of each of the 100 star offsets within a single prestige.
const PRESTIGE_COSTS: [i64; 4] = [500, 1000, 2000, 3500];
const STEADY_STATE_COST: i64 = 5000;
const STARS_PER_PRESTIGE: i64 = 100;

fn cost_of_star_offset(offset: i64) -> i64 {
    debug_assert!((0..STARS_PER_PRESTIGE).contains(&offset));
    PRESTIGE_COSTS
        .get(offset as usize)
        .copied()
        .unwrap_or(STEADY_STATE_COST)
}

fn prestige_total() -> i64 {
    (0..STARS_PER_PRESTIGE).map(cost_of_star_offset).sum()
}

/// Sum of the experience cost of the first `n` stars (§4.7).
pub fn stars_to_exp(n: i64) -> i64 {
    if n <= 0 {
        return 0;
    }
    let per_prestige = prestige_total();
    let full_prestiges = n / STARS_PER_PRESTIGE;
    let remainder = n % STARS_PER_PRESTIGE;
    let mut total = full_prestiges * per_prestige;
    for offset in 0..remainder {
        total += cost_of_star_offset(offset);
    }
    total
}

/// Inverse of [`stars_to_exp`]: the number of whole star levels `x`
/// experience covers.
pub fn exp_to_stars(x: i64) -> i64 {
    if x <= 0 {
        return 0;
    }
    let per_prestige = prestige_total();
    let mut remaining = x;
    let mut stars = (remaining / per_prestige) * STARS_PER_PRESTIGE;
    remaining %= per_prestige;

    let mut offset = 0;
    while offset < STARS_PER_PRESTIGE {
        let cost = cost_of_star_offset(offset);
        if remaining < cost {
            break;
        }
        remaining -= cost;
        stars += 1;
        offset += 1;
    }
    stars
}

/// The stat a milestone list is expressed against (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Experience,
    Stars,
}

/// One achieved milestone: the snapshot at which the stat first reached the
/// threshold, and the stat's value there (in the caller's original units).
#[derive(Debug, Clone, PartialEq)]
pub struct Achievement {
    pub milestone: i64,
    pub snapshot: PlayerSnapshot,
    pub value: i64,
}

fn stat_value_exp(s: &PlayerSnapshot) -> i64 {
    s.experience
}

/// Finds, for each milestone, the earliest snapshot at which `overall`
/// experience first reached the threshold. Milestones never reached are
/// omitted (§4.7); a milestone the player jumped past is still reported at
/// the first snapshot that already cleared it.
pub async fn find_milestones(
    repo: &dyn PlayerRepository,
    uuid: &str,
    gamemode: Gamemode,
    stat: Stat,
    milestones: &[i64],
) -> Result<Vec<Achievement>, CoreError> {
    if gamemode != Gamemode::Overall {
        return Err(CoreError::invalid_input(
            "milestones are only supported for the overall gamemode",
        ));
    }

    let exp_milestones: Vec<i64> = match stat {
        Stat::Experience => milestones.to_vec(),
        Stat::Stars => milestones.iter().map(|&m| stars_to_exp(m)).collect(),
    };

    let mut snapshots = repo.all_snapshots(uuid).await?;
    snapshots.sort_by_key(|s| s.queried_at);

    let mut results = Vec::new();
    for (i, &target) in exp_milestones.iter().enumerate() {
        let Some(snapshot) = snapshots.iter().find(|s| stat_value_exp(s) >= target) else {
            continue;
        };
        let value = match stat {
            Stat::Experience => stat_value_exp(snapshot),
            Stat::Stars => exp_to_stars(stat_value_exp(snapshot)),
        };
        results.push(Achievement {
            milestone: milestones[i],
            snapshot: snapshot.clone(),
            value,
        });
    }

    Ok(results)
}

/// Returns the `queried_at` of an achievement, for callers that only need
/// ordering rather than the full snapshot.
pub fn achieved_at(a: &Achievement) -> DateTime<Utc> {
    a.snapshot.queried_at
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

    fn snap(t: DateTime<Utc>, experience: i64) -> PlayerSnapshot {
        PlayerSnapshot {
            db_id: Some(uuid::Uuid::now_v7()),
            uuid: "u".to_string(),
            queried_at: t,
            experience,
            five_gamemodes: FiveGamemodes::default(),
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

    #[test]
    fn stars_to_exp_pins_spec_values() {
        assert_eq!(stars_to_exp(1), 500);
        assert_eq!(stars_to_exp(3), 3500);
        assert_eq!(stars_to_exp(20), 87000);
        assert_eq!(stars_to_exp(481), 2340000);
        assert_eq!(stars_to_exp(1000), 4870000);
        assert_eq!(stars_to_exp(1091), 5312000);
    }

    #[test]
    fn exp_to_stars_inverts_stars_to_exp_round_trip() {
        for n in 0..=10_000 {
            let exp = stars_to_exp(n);
            assert_eq!(exp_to_stars(exp), n, "round trip failed for n={n}");
        }
    }

    #[tokio::test]
    async fn rejects_non_overall_gamemode() {
        let repo = FakeRepo { snapshots: vec![] };
        let err = find_milestones(&repo, "u", Gamemode::Solo, Stat::Experience, &[100])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn skips_unreached_milestones() {
        let t0 = Utc::now();
        let repo = FakeRepo {
            snapshots: vec![snap(t0, 500)],
        };
        let out = find_milestones(&repo, "u", Gamemode::Overall, Stat::Experience, &[100, 1000])
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].milestone, 100);
    }

    #[tokio::test]
    async fn stars_milestone_skip_scenario() {
        // T1 clears star 1 exactly; T2 jumps straight past star 3 and star
        // 20, so both are credited at the same snapshot rather than
        // separately (§4.7's "skipped milestones" case).
        let t0 = Utc::now();
        let t1 = t0;
        let t2 = t0 + Duration::hours(1);
        let repo = FakeRepo {
            snapshots: vec![snap(t1, 500), snap(t2, 100_000)],
        };
        let out = find_milestones(&repo, "u", Gamemode::Overall, Stat::Stars, &[1, 3, 20])
            .await
            .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].milestone, 1);
        assert_eq!(out[0].snapshot.queried_at, t1);
        assert_eq!(out[1].milestone, 3);
        assert_eq!(out[1].snapshot.queried_at, t2);
        assert_eq!(out[2].milestone, 20);
        assert_eq!(out[2].snapshot.queried_at, t2);
        assert_eq!(out[2].value, exp_to_stars(100_000));
    }

    #[tokio::test]
    async fn empty_milestone_list_yields_empty_result() {
        let repo = FakeRepo { snapshots: vec![] };
        let out = find_milestones(&repo, "u", Gamemode::Overall, Stat::Experience, &[])
            .await
            .unwrap();
        assert!(out.is_empty());
    }
}
