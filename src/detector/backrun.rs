//! Same-venue backrun detection: map a pending swap's program key to a
//! venue, simulate it against the confirmed cache to produce a
//! speculative delta, then probe the affected pool's mint pair for a
//! cross-venue path using the same simulators.

use std::collections::HashMap;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::cache::{CachedPool, HotPathCache};
use crate::config::Venue;
use crate::detector::{cross_venue, Detector, Opportunity, OpportunityKind};
use crate::dex::{meteora_dlmm, pumpswap, raydium_clmm, raydium_v4};
use crate::error::{ConfigError, SimulationError};
use crate::speculative::{PendingTx, SpeculativeDelta};

/// Mainnet program keys for the four tracked venues.
pub mod program_id {
    use solana_sdk::{pubkey, pubkey::Pubkey};

    pub const PUMPSWAP: Pubkey = pubkey!("pAMMBay6oceH9fJKBRHGP5D4bD4sWpmSwMn52FMfXEA");
    pub const RAYDIUM_V4: Pubkey = pubkey!("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8");
    pub const RAYDIUM_CLMM: Pubkey = pubkey!("CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK");
    pub const METEORA_DLMM: Pubkey = pubkey!("LBUZKhRxPF3XUpBCjp4YzTKgLccjZhTSDM9YuVaPwxo");
}

/// Maps a program key to the venue it serves.
pub fn venue_for_program(program: &Pubkey) -> Result<Venue, ConfigError> {
    match *program {
        program_id::PUMPSWAP => Ok(Venue::PumpSwap),
        program_id::RAYDIUM_V4 => Ok(Venue::RaydiumV4),
        program_id::RAYDIUM_CLMM => Ok(Venue::RaydiumClmm),
        program_id::METEORA_DLMM => Ok(Venue::MeteoraDlmm),
        other => Err(ConfigError::UnknownProgramKey(other.to_string())),
    }
}

/// CP-AMMs carry confidence ~0.9; concentrated-liquidity venues (whose
/// header state changes less per block) carry ~0.95.
pub fn confidence_for_venue(venue: Venue) -> f64 {
    match venue {
        Venue::PumpSwap | Venue::RaydiumV4 => 0.9,
        Venue::RaydiumClmm | Venue::MeteoraDlmm => 0.95,
    }
}

/// A swap decoded out of one pending-transaction instruction. Turning
/// raw instruction bytes into `amount_in`/direction is a feed-layer
/// concern, so this is the boundary the detector accepts.
#[derive(Debug, Clone, Copy)]
pub struct SwapIntent {
    pub pool: Pubkey,
    pub amount_in: u64,
    /// `true` moves the canonically-lower mint into the canonically-
    /// higher mint (the same sense as `zero_for_one`/`xToY`).
    pub low_to_high: bool,
    pub exact_out: Option<ExactOut>,
}

#[derive(Debug, Clone, Copy)]
pub struct ExactOut {
    pub desired_out: u64,
    pub max_in: u64,
}

/// Simulates `intent` against the cached pool header, returning the
/// resulting speculative delta. Never mutates the cache or the store.
pub fn simulate_pending_swap(
    cache: &HotPathCache,
    intent: &SwapIntent,
    venue: Venue,
    source_signature: Signature,
    seen_slot: u64,
) -> Result<SpeculativeDelta, SimulationError> {
    let pool = cache.get_pool(&intent.pool).ok_or(SimulationError::VaultReadMissing)?;

    let (mint_in, mint_out, amount_out) = match &pool {
        CachedPool::PumpSwap(f) => {
            let natural_low_is_base = f.cp.base_mint <= f.cp.quote_mint;
            let base_to_quote = natural_low_is_base == intent.low_to_high;
            if base_to_quote {
                let r = pumpswap::simulate_sell(
                    f.cp.base_reserve,
                    f.cp.quote_reserve,
                    intent.amount_in,
                    f.lp_fee_bps,
                    f.protocol_fee_bps,
                )?;
                (f.cp.base_mint, f.cp.quote_mint, r.amount_out)
            } else {
                let r = pumpswap::simulate_buy(
                    f.cp.quote_reserve,
                    f.cp.base_reserve,
                    intent.amount_in,
                    f.lp_fee_bps,
                    f.protocol_fee_bps,
                )?;
                (f.cp.quote_mint, f.cp.base_mint, r.amount_out)
            }
        }
        CachedPool::RaydiumV4(f) => {
            let natural_low_is_base = f.cp.base_mint <= f.cp.quote_mint;
            let base_to_quote = natural_low_is_base == intent.low_to_high;
            let (in_reserve, out_reserve, mint_in, mint_out) = if base_to_quote {
                (f.cp.base_reserve, f.cp.quote_reserve, f.cp.base_mint, f.cp.quote_mint)
            } else {
                (f.cp.quote_reserve, f.cp.base_reserve, f.cp.quote_mint, f.cp.base_mint)
            };
            let r = raydium_v4::simulate(in_reserve, out_reserve, intent.amount_in, f.fee_numerator, f.fee_denominator)?;
            (mint_in, mint_out, r.amount_out)
        }
        CachedPool::RaydiumClmm(f) => {
            let natural_low_is_0 = f.token_mint_0 <= f.token_mint_1;
            let zero_for_one = natural_low_is_0 == intent.low_to_high;
            let ticks = cache.tick_list(&intent.pool).ok_or(SimulationError::VaultReadMissing)?;
            let r = raydium_clmm::simulate_swap(
                f.sqrt_price_x64,
                f.tick_current,
                f.liquidity,
                f.fee_rate,
                ticks.as_slice(),
                intent.amount_in,
                zero_for_one,
                None,
            )?;
            let (mint_in, mint_out) = if zero_for_one {
                (f.token_mint_0, f.token_mint_1)
            } else {
                (f.token_mint_1, f.token_mint_0)
            };
            (mint_in, mint_out, r.amount_out)
        }
        CachedPool::MeteoraDlmm(f) => {
            let natural_low_is_x = f.token_x_mint <= f.token_y_mint;
            let x_to_y = natural_low_is_x == intent.low_to_high;
            let bins = cache.bin_map(&intent.pool).ok_or(SimulationError::VaultReadMissing)?;
            let direction = if x_to_y { meteora_dlmm::Direction::XToY } else { meteora_dlmm::Direction::YToX };
            let r = meteora_dlmm::simulate_swap(
                f.active_id,
                f.bin_step,
                f.base_factor,
                f.variable_fee_control,
                f.volatility_accumulator,
                f.protocol_share,
                bins.as_map(),
                intent.amount_in,
                direction,
                meteora_dlmm::FeeMode::Output,
            )?;
            let (mint_in, mint_out) = if x_to_y {
                (f.token_x_mint, f.token_y_mint)
            } else {
                (f.token_y_mint, f.token_x_mint)
            };
            (mint_in, mint_out, r.amount_out)
        }
    };

    let mut mint_deltas = HashMap::new();
    mint_deltas.insert(mint_in, intent.amount_in as i128);
    mint_deltas.insert(mint_out, -(amount_out as i128));

    Ok(SpeculativeDelta {
        source_signature,
        account_data: HashMap::new(),
        mint_deltas,
        confidence: confidence_for_venue(venue),
        expiry_slot: seen_slot + 5,
    })
}

/// Exact-out solve for a PumpSwap buy with a known max-in: binary search
/// over `[0, max_in]` for the smallest input that yields `>= desired_out`,
/// using the simulator itself as the oracle.
pub fn solve_exact_in_for_desired_out(
    quote_reserve: u64,
    base_reserve: u64,
    lp_bps: u64,
    protocol_bps: u64,
    desired_out: u64,
    max_in: u64,
) -> Result<u64, SimulationError> {
    let mut lo = 0u64;
    let mut hi = max_in;
    for _ in 0..64 {
        if lo >= hi {
            break;
        }
        let mid = lo + (hi - lo) / 2;
        let out = pumpswap::simulate_buy(quote_reserve, base_reserve, mid, lp_bps, protocol_bps)?.amount_out;
        if out >= desired_out {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    // `lo` may still undershoot by one unit of rounding; nudge up once if so.
    if pumpswap::simulate_buy(quote_reserve, base_reserve, lo, lp_bps, protocol_bps)?.amount_out < desired_out && lo < max_in {
        lo += 1;
    }
    Ok(lo)
}

/// Runs backrun detection for every affected `SwapIntent` of one pending
/// transaction: simulates the swap (skips intents whose pool the tx does
/// not actually write, or whose venue is disabled) and probes the
/// affected pool's mint pair for a cross-venue path.
pub fn detect(
    detector: &Detector,
    tx: &PendingTx,
    intents: &[SwapIntent],
    pools_by_mint_pair: &HashMap<(Pubkey, Pubkey), Vec<Pubkey>>,
) -> Vec<(SpeculativeDelta, Option<Opportunity>)> {
    let mut results = Vec::new();

    for intent in intents {
        if !tx.writes.contains(&intent.pool) {
            continue;
        }
        let Some(pool) = detector.cache.get_pool(&intent.pool) else {
            continue;
        };
        let venue = pool.venue();
        if !detector.config.is_enabled(venue) {
            continue;
        }

        let delta = match simulate_pending_swap(detector.cache, intent, venue, tx.signature, tx.seen_slot) {
            Ok(d) => d,
            Err(err) => {
                log::debug!("skipping backrun simulation for pool {}: {}", intent.pool, err);
                continue;
            }
        };

        let opportunity = pools_by_mint_pair
            .get(&pool.mint_pair())
            .and_then(|pools| cross_venue::detect(detector, pools, intent.amount_in, tx.seen_slot))
            .map(|mut op| {
                op.kind = OpportunityKind::Backrun;
                op
            });

        if let Some(op) = &opportunity {
            log::info!(
                "backrun opportunity {} on {:?}: {} lamports profit ({} bps)",
                op.id, op.path, op.expected_profit, op.profit_bps
            );
        }

        results.push((delta, opportunity));
    }

    results
}
