use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::info;

use super::auth::{AdminUser, AuthUser};
use super::health::HealthState;
use super::latency::{LedgerLatency, LedgerOp};
use crate::config::MAX_UPLOAD_BYTES;
use crate::db::models::{BetRow, MatchListRow, MatchResultRow, TeamPoolRow, UserRow};
use crate::error::AppError;
use crate::ingest::{parse_player_stats, parse_results_table, ResultsUpload};
use crate::ledger::{BetRequest, Ledger, Settlement};
use crate::money::Money;
use crate::types::{datetime_from_ms, now_ms, MatchState};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
    pub ledger: Ledger,
    pub jwt_secret: Arc<str>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LedgerLatency>,
}

impl ApiState {
    pub fn new(pool: SqlitePool, jwt_secret: &str) -> Self {
        Self {
            ledger: Ledger::new(pool.clone()),
            pool,
            jwt_secret: Arc::from(jwt_secret),
            health: Arc::new(HealthState::new()),
            latency: Arc::new(LedgerLatency::new()),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/bet", post(post_bet))
        .route("/matches", get(get_matches).post(post_match))
        .route("/matches/:id", get(get_match))
        .route("/matches/:id/results", post(post_match_results))
        .route("/me", get(get_me))
        .route("/me/bets", get(get_my_bets))
        .route("/health", get(get_health))
        .route("/stats/summary", get(get_stats_summary))
        .route("/stats/latency", get(get_stats_latency))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct MatchesQuery {
    pub state: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateMatchRequest {
    pub team_a_id: i64,
    pub team_b_id: i64,
    pub match_date: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct MatchResponse {
    pub id: i64,
    pub team_a_id: i64,
    pub team_b_id: i64,
    pub match_date: DateTime<Utc>,
    pub state: MatchState,
    pub winning_team_id: Option<i64>,
}

impl MatchResponse {
    fn from_row(row: &MatchListRow, now_ms: i64) -> Self {
        Self {
            id: row.id,
            team_a_id: row.team_a_id,
            team_b_id: row.team_b_id,
            match_date: datetime_from_ms(row.match_date),
            state: MatchState::derive(row.match_date, now_ms, row.winning_team_id.is_some()),
            winning_team_id: row.winning_team_id,
        }
    }
}

#[derive(Serialize)]
pub struct ResultResponse {
    pub winning_team_id: i64,
    pub team_a_score: i64,
    pub team_b_score: i64,
}

#[derive(Serialize)]
pub struct TeamPoolResponse {
    pub team_id: i64,
    pub staked: Money,
    pub bets: i64,
}

#[derive(Serialize)]
pub struct MatchDetailResponse {
    #[serde(flatten)]
    pub summary: MatchResponse,
    pub result: Option<ResultResponse>,
    pub pools: Vec<TeamPoolResponse>,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub balance: Money,
    pub is_admin: bool,
}

#[derive(Serialize)]
pub struct BetResponse {
    pub id: i64,
    pub match_id: i64,
    pub team_id: i64,
    pub amount: Money,
    pub placed_at: DateTime<Utc>,
    /// Present once the match is settled and this bet won.
    pub payout: Option<Money>,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub total_matches: i64,
    pub settled_matches: i64,
    pub total_bets: i64,
    pub total_staked: Money,
    pub total_paid_out: Money,
}

// ---------------------------------------------------------------------------
// Ledger handlers
// ---------------------------------------------------------------------------

async fn post_bet(
    State(state): State<ApiState>,
    user: AuthUser,
    payload: Result<Json<BetRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let order = match payload.map_err(AppError::from).and_then(|Json(req)| req.validate()) {
        Ok(order) => order,
        Err(e) => {
            state.health.inc_bets_rejected();
            return Err(e);
        }
    };

    let started = Instant::now();
    let outcome = state.ledger.place_bet(user.user_id, order, now_ms()).await;
    state.latency.record(LedgerOp::PlaceBet, started.elapsed());

    match outcome {
        Ok(receipt) => {
            state.health.inc_bets_placed();
            Ok(Json(json!({
                "message": "bet placed",
                "success": true,
                "bet_id": receipt.bet_id,
                "balance": receipt.balance,
            })))
        }
        Err(e) => {
            if e.is_client_error() {
                state.health.inc_bets_rejected();
            }
            Err(e)
        }
    }
}

async fn post_match_results(
    State(state): State<ApiState>,
    admin: AdminUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ResultsUpload>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(match_id) = path?;
    let Json(upload) = payload?;

    let outcome = parse_results_table(&upload.results)?;
    let player_stats = parse_player_stats(&upload.player_stats)?;
    let settlement = Settlement { match_id, outcome, player_stats };

    let now = now_ms();
    let started = Instant::now();
    let result = state.ledger.settle_match(settlement, now).await;
    state.latency.record(LedgerOp::SettleMatch, started.elapsed());
    let summary = result?;

    state.health.record_settlement(now);
    info!(match_id, settled_by = admin.user_id, "Results uploaded");

    Ok(Json(json!({
        "message": "match results recorded and payouts distributed",
        "success": true,
        "total_pool": summary.total_pool,
        "winning_pool": summary.winning_pool,
        "paid_out": summary.paid_out,
        "winners": summary.winners,
    })))
}

// ---------------------------------------------------------------------------
// Match handlers
// ---------------------------------------------------------------------------

async fn post_match(
    State(state): State<ApiState>,
    admin: AdminUser,
    payload: Result<Json<CreateMatchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(req) = payload?;
    if req.team_a_id == req.team_b_id {
        return Err(AppError::invalid_argument("a match needs two different teams"));
    }

    let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams WHERE id IN (?, ?)")
        .bind(req.team_a_id)
        .bind(req.team_b_id)
        .fetch_one(&state.pool)
        .await?;
    if known != 2 {
        return Err(AppError::not_found("team not found"));
    }

    let match_id: i64 = sqlx::query_scalar(
        "INSERT INTO matches (team_a_id, team_b_id, match_date) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(req.team_a_id)
    .bind(req.team_b_id)
    .bind(req.match_date.timestamp_millis())
    .fetch_one(&state.pool)
    .await?;

    info!(match_id, created_by = admin.user_id, match_date = %req.match_date, "Match created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "match created", "success": true, "match_id": match_id })),
    ))
}

async fn get_matches(
    State(state): State<ApiState>,
    query: Result<Query<MatchesQuery>, QueryRejection>,
) -> Result<Json<Vec<MatchResponse>>, AppError> {
    let Query(params) = query?;
    let filter = params
        .state
        .as_deref()
        .map(str::parse::<MatchState>)
        .transpose()?;

    let rows = sqlx::query_as::<_, MatchListRow>(
        r#"
        SELECT m.id, m.team_a_id, m.team_b_id, m.match_date, r.winning_team_id
        FROM matches m
        LEFT JOIN matches_results r ON r.match_id = m.id
        ORDER BY m.match_date, m.id
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let now = now_ms();
    let matches = rows
        .iter()
        .map(|r| MatchResponse::from_row(r, now))
        .filter(|m| filter.map_or(true, |f| m.state == f))
        .collect();

    Ok(Json(matches))
}

async fn get_match(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MatchDetailResponse>, AppError> {
    let Path(match_id) = path?;

    let row = sqlx::query_as::<_, MatchListRow>(
        r#"
        SELECT m.id, m.team_a_id, m.team_b_id, m.match_date, r.winning_team_id
        FROM matches m
        LEFT JOIN matches_results r ON r.match_id = m.id
        WHERE m.id = ?
        "#,
    )
    .bind(match_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("match not found"))?;

    let result = sqlx::query_as::<_, MatchResultRow>(
        "SELECT winning_team_id, team_a_score, team_b_score FROM matches_results WHERE match_id = ?",
    )
    .bind(match_id)
    .fetch_optional(&state.pool)
    .await?
    .map(|r| ResultResponse {
        winning_team_id: r.winning_team_id,
        team_a_score: r.team_a_score,
        team_b_score: r.team_b_score,
    });

    let pool_rows = sqlx::query_as::<_, TeamPoolRow>(
        r#"
        SELECT team_id, COALESCE(SUM(amount), 0) AS staked, COUNT(*) AS bets
        FROM bets
        WHERE match_id = ?
        GROUP BY team_id
        "#,
    )
    .bind(match_id)
    .fetch_all(&state.pool)
    .await?;

    let pools = [row.team_a_id, row.team_b_id]
        .into_iter()
        .map(|team_id| {
            let found = pool_rows.iter().find(|p| p.team_id == team_id);
            TeamPoolResponse {
                team_id,
                staked: Money::from_cents(found.map_or(0, |p| p.staked)),
                bets: found.map_or(0, |p| p.bets),
            }
        })
        .collect();

    Ok(Json(MatchDetailResponse {
        summary: MatchResponse::from_row(&row, now_ms()),
        result,
        pools,
    }))
}

// ---------------------------------------------------------------------------
// Account handlers
// ---------------------------------------------------------------------------

async fn get_me(
    State(state): State<ApiState>,
    user: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, balance, is_admin FROM users WHERE id = ?",
    )
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::not_found("user not found"))?;

    Ok(Json(MeResponse {
        id: row.id,
        username: row.username,
        balance: Money::from_cents(row.balance),
        is_admin: row.is_admin != 0,
    }))
}

async fn get_my_bets(
    State(state): State<ApiState>,
    user: AuthUser,
) -> Result<Json<Vec<BetResponse>>, AppError> {
    let rows = sqlx::query_as::<_, BetRow>(
        r#"
        SELECT b.id, b.match_id, b.team_id, b.amount, b.placed_at, p.amount AS payout
        FROM bets b
        LEFT JOIN payouts p ON p.bet_id = b.id
        WHERE b.user_id = ?
        ORDER BY b.id DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let bets = rows
        .into_iter()
        .map(|r| BetResponse {
            id: r.id,
            match_id: r.match_id,
            team_id: r.team_id,
            amount: Money::from_cents(r.amount),
            placed_at: datetime_from_ms(r.placed_at),
            payout: r.payout.map(Money::from_cents),
        })
        .collect();

    Ok(Json(bets))
}

// ---------------------------------------------------------------------------
// Operational handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> (StatusCode, Json<Value>) {
    let db_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let status = if db_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(json!({
            "status": if db_ok { "ok" } else { "degraded" },
            "db_ok": db_ok,
            "bets_placed": state.health.bets_placed(),
            "bets_rejected": state.health.bets_rejected(),
            "matches_settled": state.health.matches_settled(),
            "last_settled_at": state.health.last_settled_at_ms().map(datetime_from_ms),
        })),
    )
}

async fn get_stats_summary(
    State(state): State<ApiState>,
) -> Result<Json<SummaryResponse>, AppError> {
    let total_matches: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM matches")
        .fetch_one(&state.pool)
        .await?;

    let settled_matches: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM matches_results")
        .fetch_one(&state.pool)
        .await?;

    let (total_bets, total_staked): (i64, i64) =
        sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(amount), 0) FROM bets")
            .fetch_one(&state.pool)
            .await?;

    let total_paid_out: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM payouts")
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(SummaryResponse {
        total_matches,
        settled_matches,
        total_bets,
        total_staked: Money::from_cents(total_staked),
        total_paid_out: Money::from_cents(total_paid_out),
    }))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "place_bet": state.latency.snapshot(LedgerOp::PlaceBet),
        "settle_match": state.latency.snapshot(LedgerOp::SettleMatch),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::{issue_token, Role};
    use crate::db::testing::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;

    const SECRET: &str = "test-secret";
    const HOUR_MS: i64 = 3_600_000;

    struct TestApp {
        app: Router,
        pool: SqlitePool,
    }

    impl TestApp {
        async fn new() -> Self {
            let pool = memory_pool().await;
            let app = router(ApiState::new(pool.clone(), SECRET));
            Self { app, pool }
        }

        async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(t) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
            }
            let request = match body {
                Some(b) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(b.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, json)
        }

        /// Two teams and a match starting in an hour. Returns (match, team_a, team_b).
        async fn open_match(&self) -> (i64, i64, i64) {
            let a = seed_team(&self.pool, "Falcons").await;
            let b = seed_team(&self.pool, "Vipers").await;
            let m = seed_match(&self.pool, a, b, now_ms() + HOUR_MS).await;
            (m, a, b)
        }

        /// Moves the match start into the past.
        async fn kick_off(&self, match_id: i64) {
            sqlx::query("UPDATE matches SET match_date = ? WHERE id = ?")
                .bind(now_ms() - HOUR_MS)
                .bind(match_id)
                .execute(&self.pool)
                .await
                .unwrap();
        }
    }

    fn results_body(winner: i64) -> Value {
        json!({
            "results": [{"winning_team_id": winner, "team_a_score": "16", "team_b_score": "9"}],
            "player_stats": [
                {"player_id": 1, "kills": 21, "headshot_kills": 10, "assists": 5, "deaths": 12},
                {"player_id": 2, "kills": "14", "headshot_kills": "6", "assists": "8", "deaths": "15"}
            ]
        })
    }

    #[tokio::test]
    async fn bet_requires_a_token() {
        let t = TestApp::new().await;
        let (status, body) = t
            .send(Method::POST, "/bet", None, Some(json!({"match_id": 1, "team_id": 1, "amount": 1})))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing Authorization header");
    }

    #[tokio::test]
    async fn bet_then_balance() {
        let t = TestApp::new().await;
        let (m, a, _) = t.open_match().await;
        let user = seed_user(&t.pool, "alice", 10_000).await;
        let token = issue_token(user, Role::User, SECRET);

        let (status, body) = t
            .send(Method::POST, "/bet", Some(&token), Some(json!({"match_id": m, "team_id": a, "amount": 25.5})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["balance"], "74.50");

        let (status, me) = t.send(Method::GET, "/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["balance"], "74.50");

        let (_, bets) = t.send(Method::GET, "/me/bets", Some(&token), None).await;
        assert_eq!(bets.as_array().unwrap().len(), 1);
        assert_eq!(bets[0]["amount"], "25.50");
        assert!(bets[0]["payout"].is_null());
    }

    #[tokio::test]
    async fn rejections_are_400_with_reason() {
        let t = TestApp::new().await;
        let (m, a, _) = t.open_match().await;
        let user = seed_user(&t.pool, "bob", 1_000).await;
        let token = issue_token(user, Role::User, SECRET);

        let (status, body) = t
            .send(Method::POST, "/bet", Some(&token), Some(json!({"match_id": m, "team_id": a, "amount": 1.005})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "amount must have at most 2 decimal places");

        let (status, body) = t
            .send(Method::POST, "/bet", Some(&token), Some(json!({"match_id": m, "team_id": a, "amount": 20})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "insufficient balance");
        assert_eq!(balance_of(&t.pool, user).await, 1_000);

        let (status, _) = t
            .send(Method::POST, "/bet", Some(&token), Some(json!({"match_id": 777, "team_id": a, "amount": 1})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, health) = t.send(Method::GET, "/health", None, None).await;
        assert_eq!(health["bets_rejected"], 3);
        assert_eq!(health["bets_placed"], 0);
    }

    #[tokio::test]
    async fn malformed_json_is_a_client_error() {
        let t = TestApp::new().await;
        let user = seed_user(&t.pool, "carol", 1_000).await;
        let token = issue_token(user, Role::User, SECRET);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/bet")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = t.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn results_upload_settles_and_pays() {
        let t = TestApp::new().await;
        let (m, a, b) = t.open_match().await;
        let u1 = seed_user(&t.pool, "user1", 10_000).await;
        let u2 = seed_user(&t.pool, "user2", 5_000).await;
        let admin = seed_user(&t.pool, "admin", 0).await;
        let t1 = issue_token(u1, Role::User, SECRET);
        let t2 = issue_token(u2, Role::User, SECRET);
        let ta = issue_token(admin, Role::Admin, SECRET);

        t.send(Method::POST, "/bet", Some(&t1), Some(json!({"match_id": m, "team_id": a, "amount": 100}))).await;
        t.send(Method::POST, "/bet", Some(&t2), Some(json!({"match_id": m, "team_id": b, "amount": 50}))).await;
        t.kick_off(m).await;

        let uri = format!("/matches/{m}/results");
        let (status, _) = t.send(Method::POST, &uri, Some(&t1), Some(results_body(a))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = t.send(Method::POST, &uri, Some(&ta), Some(results_body(a))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["paid_out"], "150.00");
        assert_eq!(body["winners"], 1);

        assert_eq!(balance_of(&t.pool, u1).await, 15_000);
        assert_eq!(balance_of(&t.pool, u2).await, 0);

        let (status, body) = t.send(Method::POST, &uri, Some(&ta), Some(results_body(b))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "match already settled");
        assert_eq!(balance_of(&t.pool, u1).await, 15_000);

        let (_, detail) = t.send(Method::GET, &format!("/matches/{m}"), None, None).await;
        assert_eq!(detail["state"], "settled");
        assert_eq!(detail["result"]["team_a_score"], 16);
        assert_eq!(detail["pools"][0]["staked"], "100.00");
        assert_eq!(detail["pools"][1]["staked"], "50.00");

        let (_, bets) = t.send(Method::GET, "/me/bets", Some(&t1), None).await;
        assert_eq!(bets[0]["payout"], "150.00");

        let (_, summary) = t.send(Method::GET, "/stats/summary", None, None).await;
        assert_eq!(summary["settled_matches"], 1);
        assert_eq!(summary["total_staked"], "150.00");
        assert_eq!(summary["total_paid_out"], "150.00");

        let (_, latency) = t.send(Method::GET, "/stats/latency", None, None).await;
        assert_eq!(latency["place_bet"]["samples"], 2);
        assert_eq!(latency["settle_match"]["samples"], 2);
    }

    #[tokio::test]
    async fn bad_stats_row_leaves_match_unsettled() {
        let t = TestApp::new().await;
        let (m, a, _) = t.open_match().await;
        let admin = seed_user(&t.pool, "admin", 0).await;
        let ta = issue_token(admin, Role::Admin, SECRET);
        t.kick_off(m).await;

        let mut body = results_body(a);
        body["player_stats"][1]["player_id"] = json!("n/a");
        let (status, resp) = t.send(Method::POST, &format!("/matches/{m}/results"), Some(&ta), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["error"], "player stats row 2: player_id must be a positive integer");

        let (_, detail) = t.send(Method::GET, &format!("/matches/{m}"), None, None).await;
        assert_eq!(detail["state"], "awaiting_result");
        assert!(detail["result"].is_null());
    }

    #[tokio::test]
    async fn admin_creates_and_lists_matches() {
        let t = TestApp::new().await;
        let a = seed_team(&t.pool, "Falcons").await;
        let b = seed_team(&t.pool, "Vipers").await;
        let admin = seed_user(&t.pool, "admin", 0).await;
        let ta = issue_token(admin, Role::Admin, SECRET);

        let when = (Utc::now() + chrono::Duration::days(2)).to_rfc3339();
        let (status, body) = t
            .send(Method::POST, "/matches", Some(&ta), Some(json!({"team_a_id": a, "team_b_id": b, "match_date": when})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["match_id"].as_i64().unwrap();

        let (status, _) = t
            .send(Method::POST, "/matches", Some(&ta), Some(json!({"team_a_id": a, "team_b_id": a, "match_date": when})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = t.send(Method::GET, "/matches?state=scheduled", None, None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], id);

        let (_, list) = t.send(Method::GET, "/matches?state=settled", None, None).await;
        assert!(list.as_array().unwrap().is_empty());

        let (status, _) = t.send(Method::GET, "/matches?state=bogus", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_db() {
        let t = TestApp::new().await;
        let (status, body) = t.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["db_ok"], true);
        assert!(body["last_settled_at"].is_null());
    }
}
