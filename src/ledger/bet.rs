use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{lock_match, result_exists, Ledger};
use crate::config::MAX_BET_CENTS;
use crate::error::{AppError, Result};
use crate::ingest::{approximate_value, decimal_value, integer_value};
use crate::money::Money;
use crate::types::{BetId, MatchId, TeamId, UserId};

/// Body of `POST /bet`, untyped so that missing or non-numeric fields are
/// reported as invalid arguments instead of deserialization failures.
#[derive(Debug, Default, Deserialize)]
pub struct BetRequest {
    pub match_id: Option<Value>,
    pub team_id: Option<Value>,
    pub amount: Option<Value>,
}

/// A bet request that passed shape validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BetOrder {
    pub match_id: MatchId,
    pub team_id: TeamId,
    pub amount: Money,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BetReceipt {
    pub bet_id: BetId,
    /// Balance after the debit.
    pub balance: Money,
}

fn id_field(value: Option<&Value>, field: &str) -> Result<i64> {
    let value = value.ok_or_else(|| AppError::invalid_argument(format!("{field} is required")))?;
    integer_value(value)
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::invalid_argument(format!("{field} must be a positive integer")))
}

impl BetRequest {
    /// Checks run in order; the first failure wins.
    pub fn validate(&self) -> Result<BetOrder> {
        let match_id = id_field(self.match_id.as_ref(), "match_id")?;
        let team_id = id_field(self.team_id.as_ref(), "team_id")?;

        let raw = self
            .amount
            .as_ref()
            .ok_or_else(|| AppError::invalid_argument("amount is required"))?;
        let ceiling = Money::from_cents(MAX_BET_CENTS);
        let not_positive = || AppError::invalid_argument("amount must be greater than 0");
        let too_large = || AppError::invalid_argument(format!("amount must be less than {ceiling}"));
        let too_precise = || AppError::invalid_argument("amount must have at most 2 decimal places");

        let amount = match decimal_value(raw) {
            Some(amount) => amount,
            // Not numeric, or numeric but outside what Decimal holds.
            None => {
                return Err(match approximate_value(raw) {
                    None => AppError::invalid_argument("amount must be a number"),
                    Some(f) if f <= 0.0 => not_positive(),
                    Some(f) if f.abs() >= 1.0 => too_large(),
                    Some(_) => too_precise(),
                })
            }
        };

        if amount <= Decimal::ZERO {
            return Err(not_positive());
        }
        if amount >= ceiling.to_decimal() {
            return Err(too_large());
        }
        let amount = Money::from_decimal(amount).ok_or_else(too_precise)?;

        Ok(BetOrder { match_id, team_id, amount })
    }
}

impl Ledger {
    /// Debits `order.amount` from the user and records the bet, atomically.
    /// Nothing is written unless every check passes.
    pub async fn place_bet(&self, user_id: UserId, order: BetOrder, now_ms: i64) -> Result<BetReceipt> {
        match self.try_place_bet(user_id, order, now_ms).await {
            Ok(receipt) => {
                info!(
                    user_id,
                    match_id = order.match_id,
                    team_id = order.team_id,
                    amount = %order.amount,
                    bet_id = receipt.bet_id,
                    balance = %receipt.balance,
                    "Bet placed"
                );
                Ok(receipt)
            }
            Err(e) => {
                if e.is_client_error() {
                    debug!(user_id, match_id = order.match_id, reason = %e, "Bet rejected");
                }
                Err(e)
            }
        }
    }

    async fn try_place_bet(&self, user_id: UserId, order: BetOrder, now_ms: i64) -> Result<BetReceipt> {
        let mut tx = self.pool.begin().await?;

        let game = lock_match(&mut *tx, order.match_id).await?;
        if !game.has_team(order.team_id) {
            return Err(AppError::invalid_argument("team does not belong to match"));
        }
        if game.has_started(now_ms) {
            return Err(AppError::invalid_state("match already started or finished"));
        }
        if result_exists(&mut *tx, game.id).await? {
            return Err(AppError::invalid_state("match already has a result"));
        }

        let balance: Option<i64> = sqlx::query_scalar("SELECT balance FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        let balance = Money::from_cents(balance.ok_or_else(|| AppError::not_found("user not found"))?);
        if balance < order.amount {
            return Err(AppError::invalid_state("insufficient balance"));
        }

        let debited = sqlx::query("UPDATE users SET balance = balance - ? WHERE id = ? AND balance >= ?")
            .bind(order.amount.cents())
            .bind(user_id)
            .bind(order.amount.cents())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if debited != 1 {
            return Err(AppError::invalid_state("insufficient balance"));
        }

        let bet_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO bets (user_id, match_id, team_id, amount, placed_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(order.match_id)
        .bind(order.team_id)
        .bind(order.amount.cents())
        .bind(now_ms)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(BetReceipt {
            bet_id,
            balance: balance.checked_sub(order.amount).unwrap_or(Money::ZERO),
        })
    }
}
