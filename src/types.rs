use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::error::AppError;

pub type UserId = i64;
pub type MatchId = i64;
pub type TeamId = i64;
pub type BetId = i64;

// ---------------------------------------------------------------------------
// Match lifecycle
// ---------------------------------------------------------------------------

/// Inferred from the scheduled start and the presence of a result row.
/// Betting is only legal while `Scheduled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// Start time is still in the future.
    Scheduled,
    /// Start time has passed, no result uploaded yet.
    AwaitingResult,
    /// A result row exists. Terminal.
    Settled,
}

impl MatchState {
    pub fn derive(match_date_ms: i64, now_ms: i64, has_result: bool) -> Self {
        if has_result {
            MatchState::Settled
        } else if now_ms < match_date_ms {
            MatchState::Scheduled
        } else {
            MatchState::AwaitingResult
        }
    }
}

impl std::fmt::Display for MatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchState::Scheduled => "scheduled",
            MatchState::AwaitingResult => "awaiting_result",
            MatchState::Settled => "settled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for MatchState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchState::Scheduled),
            "awaiting_result" => Ok(MatchState::AwaitingResult),
            "settled" => Ok(MatchState::Settled),
            other => Err(AppError::invalid_argument(format!("unknown match state: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Uploaded match results
// ---------------------------------------------------------------------------

/// The single row of an uploaded results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub winning_team_id: TeamId,
    pub team_a_score: i64,
    pub team_b_score: i64,
}

/// One row of an uploaded per-player stats table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerStatLine {
    pub player_id: i64,
    pub kills: i64,
    pub headshot_kills: i64,
    pub assists: i64,
    pub deaths: i64,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub fn datetime_from_ms(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}
