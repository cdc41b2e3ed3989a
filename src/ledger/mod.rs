//! Transactional ledger: bet placement and match settlement.
//!
//! Every operation runs in exactly one SQLite transaction. SQLite has no row
//! locks, so each transaction opens with a no-op write on the match row
//! ([`lock_match`]). That takes the database write lock before anything is
//! read: settlement and betting on the same match are serialised, and so are
//! concurrent balance checks for the same user.

pub mod bet;
pub mod payout;
pub mod settle;

use sqlx::{SqliteConnection, SqlitePool};

use crate::db::models::MatchRow;
use crate::error::{AppError, Result};
use crate::types::MatchId;

pub use bet::BetRequest;
pub use settle::Settlement;

/// Entry point for the ledger operations. Holds the pool it draws
/// transactions from; cheap to clone.
#[derive(Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Loads the match and takes the write lock in one statement.
pub(crate) async fn lock_match(conn: &mut SqliteConnection, match_id: MatchId) -> Result<MatchRow> {
    sqlx::query_as::<_, MatchRow>(
        r#"
        UPDATE matches SET match_date = match_date
        WHERE id = ?
        RETURNING id, team_a_id, team_b_id, match_date
        "#,
    )
    .bind(match_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found("match not found"))
}

pub(crate) async fn result_exists(conn: &mut SqliteConnection, match_id: MatchId) -> Result<bool> {
    let exists: i64 =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM matches_results WHERE match_id = ?)")
            .bind(match_id)
            .fetch_one(conn)
            .await?;
    Ok(exists != 0)
}
