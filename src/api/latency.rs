//! In-memory latency histograms for ledger transactions, one per operation.
//! Handlers record, /stats/latency reads.

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    PlaceBet,
    SettleMatch,
}

#[derive(Debug, Serialize)]
pub struct LatencySnapshot {
    pub samples: u64,
    pub p50_us: Option<u64>,
    pub p95_us: Option<u64>,
    pub p99_us: Option<u64>,
}

/// Values stored in microseconds.
pub struct LedgerLatency {
    place_bet: Mutex<hdrhistogram::Histogram<u64>>,
    settle_match: Mutex<hdrhistogram::Histogram<u64>>,
}

fn histogram() -> Mutex<hdrhistogram::Histogram<u64>> {
    // 1us to 100s, 3 significant figures.
    let h = hdrhistogram::Histogram::new_with_bounds(1, 100_000_000, 3)
        .expect("valid histogram bounds");
    Mutex::new(h)
}

impl LedgerLatency {
    pub fn new() -> Self {
        Self {
            place_bet: histogram(),
            settle_match: histogram(),
        }
    }

    fn slot(&self, op: LedgerOp) -> &Mutex<hdrhistogram::Histogram<u64>> {
        match op {
            LedgerOp::PlaceBet => &self.place_bet,
            LedgerOp::SettleMatch => &self.settle_match,
        }
    }

    pub fn record(&self, op: LedgerOp, d: Duration) {
        let us = d.as_micros().clamp(1, 100_000_000) as u64;
        if let Ok(mut h) = self.slot(op).lock() {
            let _ = h.record(us);
        }
    }

    pub fn snapshot(&self, op: LedgerOp) -> LatencySnapshot {
        let Ok(h) = self.slot(op).lock() else {
            return LatencySnapshot { samples: 0, p50_us: None, p95_us: None, p99_us: None };
        };
        if h.len() == 0 {
            return LatencySnapshot { samples: 0, p50_us: None, p95_us: None, p99_us: None };
        }
        LatencySnapshot {
            samples: h.len(),
            p50_us: Some(h.value_at_quantile(0.5)),
            p95_us: Some(h.value_at_quantile(0.95)),
            p99_us: Some(h.value_at_quantile(0.99)),
        }
    }
}

impl Default for LedgerLatency {
    fn default() -> Self {
        Self::new()
    }
}
