use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use super::payout::{distribute, Payout, Pools, Stake};
use super::{lock_match, result_exists, Ledger};
use crate::error::{AppError, Result};
use crate::money::Money;
use crate::types::{MatchId, MatchOutcome, PlayerStatLine, TeamId};

/// Everything an administrator uploads to close a match.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub match_id: MatchId,
    pub outcome: MatchOutcome,
    pub player_stats: Vec<PlayerStatLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementSummary {
    pub match_id: MatchId,
    pub winning_team_id: TeamId,
    pub total_pool: Money,
    pub winning_pool: Money,
    pub paid_out: Money,
    pub winners: usize,
}

impl Ledger {
    /// Records the stats and the result, then credits every winning bet.
    /// One transaction: either all of it commits or none of it does, and a
    /// match can only be settled once.
    pub async fn settle_match(&self, settlement: Settlement, now_ms: i64) -> Result<SettlementSummary> {
        let match_id = settlement.match_id;
        match self.try_settle_match(settlement, now_ms).await {
            Ok(summary) => {
                info!(
                    match_id,
                    winning_team_id = summary.winning_team_id,
                    total_pool = %summary.total_pool,
                    winning_pool = %summary.winning_pool,
                    paid_out = %summary.paid_out,
                    winners = summary.winners,
                    "Match settled"
                );
                Ok(summary)
            }
            Err(e) => {
                if e.is_client_error() {
                    debug!(match_id, reason = %e, "Settlement rejected");
                }
                Err(e)
            }
        }
    }

    async fn try_settle_match(&self, settlement: Settlement, now_ms: i64) -> Result<SettlementSummary> {
        let Settlement { match_id, outcome, player_stats } = settlement;
        let mut tx = self.pool.begin().await?;

        let game = lock_match(&mut *tx, match_id).await?;
        if !game.has_started(now_ms) {
            return Err(AppError::invalid_state("cannot settle a match that hasn't finished"));
        }
        if result_exists(&mut *tx, match_id).await? {
            return Err(AppError::invalid_state("match already settled"));
        }
        if !game.has_team(outcome.winning_team_id) {
            return Err(AppError::invalid_state("winning team not part of match"));
        }

        for line in &player_stats {
            insert_player_stats(&mut *tx, match_id, line).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO matches_results (match_id, winning_team_id, team_a_score, team_b_score)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(match_id)
        .bind(outcome.winning_team_id)
        .bind(outcome.team_a_score)
        .bind(outcome.team_b_score)
        .execute(&mut *tx)
        .await?;

        let pools = load_pools(&mut *tx, match_id, outcome.winning_team_id).await?;
        let payouts = if pools.has_no_winners() {
            if pools.total.is_positive() {
                warn!(
                    match_id,
                    forfeited = %pools.total,
                    "No bets on the winning team; losing pool is not redistributed"
                );
            }
            Vec::new()
        } else {
            let stakes = load_winning_stakes(&mut *tx, match_id, outcome.winning_team_id).await?;
            distribute(pools, &stakes)
        };

        for payout in &payouts {
            credit(&mut *tx, match_id, payout, now_ms).await?;
        }

        tx.commit().await?;

        Ok(SettlementSummary {
            match_id,
            winning_team_id: outcome.winning_team_id,
            total_pool: pools.total,
            winning_pool: pools.winning,
            paid_out: payouts.iter().map(|p| p.amount).sum(),
            winners: payouts.len(),
        })
    }
}

async fn insert_player_stats(conn: &mut SqliteConnection, match_id: MatchId, line: &PlayerStatLine) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO player_match_stats (match_id, player_id, kills, headshot_kills, assists, deaths)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(match_id)
    .bind(line.player_id)
    .bind(line.kills)
    .bind(line.headshot_kills)
    .bind(line.assists)
    .bind(line.deaths)
    .execute(conn)
    .await?;
    Ok(())
}

/// Both pools in one aggregate read.
async fn load_pools(conn: &mut SqliteConnection, match_id: MatchId, winning_team_id: TeamId) -> Result<Pools> {
    let (total, winning): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(amount), 0),
               COALESCE(SUM(CASE WHEN team_id = ? THEN amount ELSE 0 END), 0)
        FROM bets
        WHERE match_id = ?
        "#,
    )
    .bind(winning_team_id)
    .bind(match_id)
    .fetch_one(conn)
    .await?;

    Ok(Pools {
        total: Money::from_cents(total),
        winning: Money::from_cents(winning),
    })
}

async fn load_winning_stakes(
    conn: &mut SqliteConnection,
    match_id: MatchId,
    winning_team_id: TeamId,
) -> Result<Vec<Stake>> {
    let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
        "SELECT id, user_id, amount FROM bets WHERE match_id = ? AND team_id = ? ORDER BY id",
    )
    .bind(match_id)
    .bind(winning_team_id)
    .fetch_all(conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(bet_id, user_id, amount)| Stake {
            bet_id,
            user_id,
            amount: Money::from_cents(amount),
        })
        .collect())
}

async fn credit(conn: &mut SqliteConnection, match_id: MatchId, payout: &Payout, now_ms: i64) -> Result<()> {
    sqlx::query("UPDATE users SET balance = balance + ? WHERE id = ?")
        .bind(payout.amount.cents())
        .bind(payout.user_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO payouts (bet_id, user_id, match_id, amount, paid_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(payout.bet_id)
    .bind(payout.user_id)
    .bind(match_id)
    .bind(payout.amount.cents())
    .bind(now_ms)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
