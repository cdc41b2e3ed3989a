/// Database row types for the betting schema in migrations/0001_init.sql.
/// Money columns are cents, timestamps are unix milliseconds.
use crate::types::TeamId;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRow {
    pub id: i64,
    pub team_a_id: i64,
    pub team_b_id: i64,
    pub match_date: i64,
}

impl MatchRow {
    pub fn has_team(&self, team_id: TeamId) -> bool {
        team_id == self.team_a_id || team_id == self.team_b_id
    }

    /// Betting closes at the scheduled start, inclusive.
    pub fn has_started(&self, now_ms: i64) -> bool {
        now_ms >= self.match_date
    }
}

/// Match joined with its result, if any.
#[derive(Debug, sqlx::FromRow)]
pub struct MatchListRow {
    pub id: i64,
    pub team_a_id: i64,
    pub team_b_id: i64,
    pub match_date: i64,
    pub winning_team_id: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct MatchResultRow {
    pub winning_team_id: i64,
    pub team_a_score: i64,
    pub team_b_score: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub balance: i64,
    pub is_admin: i64,
}

/// A bet joined with the payout it received, if it won.
#[derive(Debug, sqlx::FromRow)]
pub struct BetRow {
    pub id: i64,
    pub match_id: i64,
    pub team_id: i64,
    pub amount: i64,
    pub placed_at: i64,
    pub payout: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct TeamPoolRow {
    pub team_id: i64,
    pub staked: i64,
    pub bets: i64,
}
