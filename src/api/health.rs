//! Shared ledger counters for the /health endpoint.
//! Updated by the bet and settlement handlers.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

#[derive(Default)]
pub struct HealthState {
    /// Bets committed since startup.
    pub bets_placed: AtomicU64,
    /// Bets refused for a client-side reason (validation or business rule).
    pub bets_rejected: AtomicU64,
    pub matches_settled: AtomicU64,
    /// Unix ms of the last committed settlement (0 = none).
    pub last_settled_at_ms: AtomicI64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_bets_placed(&self) {
        self.bets_placed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_bets_rejected(&self) {
        self.bets_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_settlement(&self, at_ms: i64) {
        self.matches_settled.fetch_add(1, Ordering::Relaxed);
        self.last_settled_at_ms.store(at_ms, Ordering::Relaxed);
    }

    pub fn bets_placed(&self) -> u64 {
        self.bets_placed.load(Ordering::Relaxed)
    }

    pub fn bets_rejected(&self) -> u64 {
        self.bets_rejected.load(Ordering::Relaxed)
    }

    pub fn matches_settled(&self) -> u64 {
        self.matches_settled.load(Ordering::Relaxed)
    }

    pub fn last_settled_at_ms(&self) -> Option<i64> {
        match self.last_settled_at_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(ms),
        }
    }
}
