use crate::player::PlayerSnapshot;

/// A derived play session, never stored (§3, §4.6).
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub start: PlayerSnapshot,
    pub end: PlayerSnapshot,
    /// `false` if a games-played jump larger than the tolerated 2 was
    /// observed somewhere inside the session.
    pub consecutive: bool,
}
