//! Converts loosely typed request values into typed ones.
//!
//! Uploaded tables arrive as arrays of JSON objects, already converted from
//! CSV or JSON files, so a cell may be a number or a numeric string.

use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::types::{MatchOutcome, PlayerStatLine};

pub type Row = Map<String, Value>;

/// Body of `POST /matches/{id}/results`.
#[derive(Debug, Deserialize)]
pub struct ResultsUpload {
    pub results: Vec<Row>,
    #[serde(default)]
    pub player_stats: Vec<Row>,
}

fn numeric_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Exact decimal from a JSON number or numeric string.
pub fn decimal_value(value: &Value) -> Option<Decimal> {
    let text = numeric_text(value)?;
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Floating-point reading of a number [`decimal_value`] cannot represent,
/// such as `"1e100"`. None when the value is not numeric.
pub fn approximate_value(value: &Value) -> Option<f64> {
    let text = numeric_text(value)?;
    if !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<f64>().ok().filter(|f| !f.is_nan())
}

/// Integer from a JSON number or numeric string. `3.0` is accepted, `3.5` is not.
pub fn integer_value(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    let d = decimal_value(value)?;
    if d.fract().is_zero() {
        d.to_i64()
    } else {
        None
    }
}

fn non_negative(row: &Row, field: &str, context: &str) -> Result<i64> {
    row.get(field)
        .and_then(integer_value)
        .filter(|v| *v >= 0)
        .ok_or_else(|| {
            AppError::invalid_argument(format!("{context}: {field} must be a non-negative integer"))
        })
}

fn positive(row: &Row, field: &str, context: &str) -> Result<i64> {
    row.get(field)
        .and_then(integer_value)
        .filter(|v| *v > 0)
        .ok_or_else(|| AppError::invalid_argument(format!("{context}: {field} must be a positive integer")))
}

/// The results table must hold exactly one row.
pub fn parse_results_table(rows: &[Row]) -> Result<MatchOutcome> {
    let row = match rows {
        [row] => row,
        [] => return Err(AppError::invalid_argument("results table is empty")),
        _ => {
            return Err(AppError::invalid_argument(
                "results table must contain exactly one row",
            ))
        }
    };

    Ok(MatchOutcome {
        winning_team_id: positive(row, "winning_team_id", "results")?,
        team_a_score: non_negative(row, "team_a_score", "results")?,
        team_b_score: non_negative(row, "team_b_score", "results")?,
    })
}

/// Every row must be well formed. The first bad row rejects the whole upload.
pub fn parse_player_stats(rows: &[Row]) -> Result<Vec<PlayerStatLine>> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut lines = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let context = format!("player stats row {}", i + 1);
        let line = PlayerStatLine {
            player_id: positive(row, "player_id", &context)?,
            kills: non_negative(row, "kills", &context)?,
            headshot_kills: non_negative(row, "headshot_kills", &context)?,
            assists: non_negative(row, "assists", &context)?,
            deaths: non_negative(row, "deaths", &context)?,
        };
        if line.headshot_kills > line.kills {
            return Err(AppError::invalid_argument(format!(
                "{context}: headshot_kills cannot exceed kills"
            )));
        }
        if !seen.insert(line.player_id) {
            return Err(AppError::invalid_argument(format!(
                "{context}: duplicate player_id {}",
                line.player_id
            )));
        }
        lines.push(line);
    }

    Ok(lines)
}
