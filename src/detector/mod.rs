//! Opportunity detector: composes the per-venue simulators to find
//! profitable arbitrage paths, either from a pending same-venue swap
//! (backrun) or from a standing cross-venue price spread.

pub mod backrun;
pub mod cross_venue;

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::cache::HotPathCache;
use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    Backrun,
    CrossVenueArb,
    Sandwich,
    JitLiquidity,
    PureArb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapLeg {
    pub pool: Pubkey,
    pub venue: crate::config::Venue,
    pub amount_in: u64,
    pub amount_out: u64,
}

/// The outbound event this crate's callers serialize onward to a
/// bundle-submission or evidence-store layer; this crate only produces
/// it, per spec.md §6.
#[derive(Debug, Clone, Serialize)]
pub struct Opportunity {
    pub id: u64,
    pub kind: OpportunityKind,
    pub path: Vec<SwapLeg>,
    pub input_amount: u64,
    pub expected_output: u64,
    pub expected_profit: i64,
    pub profit_bps: i64,
    pub confidence: f64,
    pub detected_at: u64,
    pub expiry_slot: u64,
}

/// A rejected opportunity is not re-reported until state changes; the
/// caller is expected to hash/dedup on `(path, input_amount)` for that.
pub fn passes_viability_gates(op: &Opportunity, config: &EngineConfig) -> bool {
    op.expected_profit >= config.min_profit_lamports
        && op.profit_bps >= config.min_profit_bps
        && op.input_amount <= config.max_position_lamports
        && op.confidence >= 0.8
}

/// Ties the cache and configuration together for both detection paths.
pub struct Detector<'a> {
    pub cache: &'a HotPathCache,
    pub config: &'a EngineConfig,
    next_id: std::sync::atomic::AtomicU64,
}

impl<'a> Detector<'a> {
    pub fn new(cache: &'a HotPathCache, config: &'a EngineConfig) -> Self {
        Self {
            cache,
            config,
            next_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    pub fn next_opportunity_id(&self) -> u64 {
        self.next_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opp(expected_profit: i64, profit_bps: i64, input_amount: u64, confidence: f64) -> Opportunity {
        Opportunity {
            id: 1,
            kind: OpportunityKind::CrossVenueArb,
            path: vec![],
            input_amount,
            expected_output: 0,
            expected_profit,
            profit_bps,
            confidence,
            detected_at: 0,
            expiry_slot: 10,
        }
    }

    #[test]
    fn gates_reject_low_confidence() {
        let config = EngineConfig::default();
        let op = opp(1_000, 100, 1_000, 0.5);
        assert!(!passes_viability_gates(&op, &config));
    }

    #[test]
    fn gates_reject_oversized_position() {
        let mut config = EngineConfig::default();
        config.max_position_lamports = 500;
        let op = opp(1_000, 100, 1_000, 0.9);
        assert!(!passes_viability_gates(&op, &config));
    }

    #[test]
    fn gates_accept_when_all_satisfied() {
        let config = EngineConfig::default();
        let op = opp(1_000, 100, 1_000, 0.9);
        assert!(passes_viability_gates(&op, &config));
    }
}
