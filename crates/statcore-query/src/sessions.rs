//! Session extraction (§4.6): a state machine over games-played progress
//! that groups adjacent eventful snapshots into sessions, tolerating short
//! idle gaps and a games-played jump of up to 2.
//!
//! The scanner uses a `while` loop with a manually controlled index rather
//! than `for i in ..`, because the gap-handling branch rewinds `i` back to
//! `last_eventful` so that snapshot can be reconsidered as the start of a
//! new session — a `for` loop's own increment would skip past it.

use chrono::{DateTime, Duration, Utc};
use statcore_core::CoreError;
use statcore_model::{PlayerSnapshot, Session};
use statcore_persistence::PlayerRepository;

const MAX_WINDOW_DAYS: i64 = 60;
const BOUNDARY_PADDING_HOURS: i64 = 24;
const GAP_THRESHOLD_MINUTES: i64 = 60;
const TOLERATED_GAMES_PLAYED_JUMP: i64 = 2;

fn progress(s: &PlayerSnapshot) -> (i64, i64) {
    (s.games_played(), s.experience)
}

fn overlaps(snapshots: &[PlayerSnapshot], session_start: usize, last_eventful: usize, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    !(snapshots[session_start].queried_at > end || snapshots[last_eventful].queried_at < start)
}

pub async fn get_sessions(
    repo: &dyn PlayerRepository,
    uuid: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Session>, CoreError> {
    if end <= start {
        return Err(CoreError::invalid_input("end must be after start"));
    }
    if end - start > Duration::days(MAX_WINDOW_DAYS) {
        return Err(CoreError::invalid_input(format!(
            "window must not exceed {MAX_WINDOW_DAYS} days"
        )));
    }

    let padded_start = start - Duration::hours(BOUNDARY_PADDING_HOURS);
    let padded_end = end + Duration::hours(BOUNDARY_PADDING_HOURS);
    let mut snapshots = repo.snapshots_in_range(uuid, padded_start, padded_end).await?;
    snapshots.sort_by_key(|s| s.queried_at);

    let n = snapshots.len();
    let mut sessions = Vec::new();
    let mut session_start: Option<usize> = None;
    let mut last_eventful: Option<usize> = None;
    let mut consecutive = true;
    let mut i = 0usize;

    while i < n {
        match (session_start, last_eventful) {
            (None, _) => {
                session_start = Some(i);
                last_eventful = Some(i);
                consecutive = true;
            }
            (Some(ss), Some(le)) => {
                if progress(&snapshots[i]) == progress(&snapshots[ss]) {
                    session_start = Some(i);
                    last_eventful = Some(i);
                } else if snapshots[i].queried_at - snapshots[le].queried_at
                    > Duration::minutes(GAP_THRESHOLD_MINUTES)
                {
                    if ss != le {
                        // A real accumulated session ends here: emit it, then
                        // rewind to last_eventful so it can open a new session
                        // with s[i] rather than being stranded.
                        if overlaps(&snapshots, ss, le, start, end) {
                            sessions.push(Session {
                                start: snapshots[ss].clone(),
                                end: snapshots[le].clone(),
                                consecutive,
                            });
                        }
                        i = le;
                        session_start = None;
                        last_eventful = None;
                        continue;
                    }
                    // ss == le: a lone snapshot more than 60 minutes from its
                    // successor. Nothing to emit, and rewinding to le would
                    // just reproduce this same state, so start fresh at i.
                    session_start = Some(i);
                    last_eventful = Some(i);
                    consecutive = true;
                } else {
                    if snapshots[i].games_played() < snapshots[le].games_played()
                        || snapshots[i].games_played()
                            > snapshots[le].games_played() + TOLERATED_GAMES_PLAYED_JUMP
                    {
                        consecutive = false;
                    }
                    if progress(&snapshots[i]) != progress(&snapshots[le]) {
                        last_eventful = Some(i);
                    }
                }
            }
            (Some(_), None) => unreachable!("last_eventful is always set alongside session_start"),
        }
        i += 1;
    }

    if let (Some(ss), Some(le)) = (session_start, last_eventful) {
        if ss != le && overlaps(&snapshots, ss, le, start, end) {
            sessions.push(Session {
                start: snapshots[ss].clone(),
                end: snapshots[le].clone(),
                consecutive,
            });
        }
    }

    Ok(sessions)
}
