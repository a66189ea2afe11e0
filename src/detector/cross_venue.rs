//! Cross-venue spread detection: group pools by unordered mint pair,
//! compare spot prices across venues, and price an actual
//! buy-low/sell-high round trip using the same simulators the backrun
//! path uses — there is no separate math path.

use std::collections::HashMap;

use solana_sdk::pubkey::Pubkey;

use crate::cache::{CachedPool, HotPathCache};
use crate::config::Venue;
use crate::detector::{Detector, Opportunity, OpportunityKind, SwapLeg};
use crate::dex::{meteora_dlmm, pumpswap, raydium_clmm, raydium_v4};
use crate::error::{MathError, SimulationError};
use crate::math::fixed::{mul_div_floor, U256};

const Q64: u128 = 1u128 << 64;

/// Groups the given pool keys by their unordered mint pair; pairs with
/// fewer than two registered pools cannot be cross-venue candidates.
pub fn group_by_mint_pair(cache: &HotPathCache, pool_keys: &[Pubkey]) -> HashMap<(Pubkey, Pubkey), Vec<Pubkey>> {
    let mut groups: HashMap<(Pubkey, Pubkey), Vec<Pubkey>> = HashMap::new();
    for &key in pool_keys {
        if let Some(pool) = cache.get_pool(&key) {
            groups.entry(pool.mint_pair()).or_default().push(key);
        }
    }
    groups.retain(|_, pools| pools.len() >= 2);
    groups
}

fn invert_q64(price: u128) -> Result<u128, SimulationError> {
    if price == 0 {
        return Err(SimulationError::InvalidReserves);
    }
    Ok(mul_div_floor(Q64, Q64, price)?)
}

/// Puts a `price_of_b_per_a` quote into canonical order: price of the
/// lexicographically-larger mint, per unit of the smaller one.
fn canonicalize(mint_a: Pubkey, mint_b: Pubkey, price_b_per_a: u128) -> Result<u128, SimulationError> {
    if mint_a <= mint_b {
        Ok(price_b_per_a)
    } else {
        invert_q64(price_b_per_a)
    }
}

/// Spot price in Q64.64, canonicalized so prices across venues on the
/// same mint pair are directly comparable.
pub fn spot_price_q64(pool: &CachedPool) -> Result<u128, SimulationError> {
    match pool {
        CachedPool::PumpSwap(f) => cp_price(f.cp.base_mint, f.cp.quote_mint, f.cp.base_reserve, f.cp.quote_reserve),
        CachedPool::RaydiumV4(f) => cp_price(f.cp.base_mint, f.cp.quote_mint, f.cp.base_reserve, f.cp.quote_reserve),
        CachedPool::RaydiumClmm(f) => clmm_price(f.token_mint_0, f.token_mint_1, f.sqrt_price_x64),
        CachedPool::MeteoraDlmm(f) => dlmm_price(f.token_x_mint, f.token_y_mint, f.active_id, f.bin_step),
    }
}

fn cp_price(base_mint: Pubkey, quote_mint: Pubkey, base_reserve: u64, quote_reserve: u64) -> Result<u128, SimulationError> {
    if base_reserve == 0 {
        return Err(SimulationError::InvalidReserves);
    }
    let price = mul_div_floor(quote_reserve as u128, Q64, base_reserve as u128)?;
    canonicalize(base_mint, quote_mint, price)
}

fn clmm_price(mint_0: Pubkey, mint_1: Pubkey, sqrt_price_x64: u128) -> Result<u128, SimulationError> {
    let squared = U256::from(sqrt_price_x64) * U256::from(sqrt_price_x64);
    let shifted = squared >> 64;
    if shifted > U256::from(u128::MAX) {
        return Err(SimulationError::Math(MathError::Overflow));
    }
    canonicalize(mint_0, mint_1, shifted.as_u128())
}

fn dlmm_price(mint_x: Pubkey, mint_y: Pubkey, active_id: i32, bin_step: u16) -> Result<u128, SimulationError> {
    let price = meteora_dlmm::price_at_bin(active_id, bin_step)?;
    canonicalize(mint_x, mint_y, price)
}

/// A detected standing spread between two pools on the same mint pair
/// but different venues.
#[derive(Debug, Clone, Copy)]
pub struct SpreadCandidate {
    pub cheap_pool: Pubkey,
    pub cheap_venue: Venue,
    pub expensive_pool: Pubkey,
    pub expensive_venue: Venue,
    pub spread_bps: u64,
}

/// Prices every pool, sorts, and checks that the min/max pair spans two
/// different venues with spread `>= min_spread_bps`.
pub fn find_spread(cache: &HotPathCache, pool_keys: &[Pubkey], min_spread_bps: u32) -> Option<SpreadCandidate> {
    let mut priced: Vec<(Pubkey, Venue, u128)> = pool_keys
        .iter()
        .filter_map(|&key| {
            let pool = cache.get_pool(&key)?;
            let price = spot_price_q64(&pool).ok()?;
            Some((key, pool.venue(), price))
        })
        .collect();
    if priced.len() < 2 {
        return None;
    }
    priced.sort_by_key(|&(_, _, price)| price);

    let (cheap_pool, cheap_venue, cheap_price) = priced[0];
    let (expensive_pool, expensive_venue, expensive_price) = *priced.last().unwrap();
    if cheap_venue == expensive_venue || cheap_price == 0 || expensive_price <= cheap_price {
        return None;
    }

    let spread_bps = (((expensive_price - cheap_price) as u128 * 10_000) / cheap_price) as u64;
    if spread_bps < min_spread_bps as u64 {
        return None;
    }

    Some(SpreadCandidate {
        cheap_pool,
        cheap_venue,
        expensive_pool,
        expensive_venue,
        spread_bps,
    })
}

/// Simulates moving `amount_in` of the canonically-lower mint into the
/// canonically-higher mint (`low_to_high = true`) or the reverse, on the
/// given pool, using the same §4.3–4.5 simulator the pool's venue uses
/// elsewhere in the crate.
fn simulate_leg(
    cache: &HotPathCache,
    pool_key: &Pubkey,
    pool: &CachedPool,
    amount_in: u64,
    low_to_high: bool,
) -> Result<u64, SimulationError> {
    match pool {
        CachedPool::PumpSwap(f) => {
            let natural_low_is_base = f.cp.base_mint <= f.cp.quote_mint;
            let base_to_quote = natural_low_is_base == low_to_high;
            if base_to_quote {
                Ok(pumpswap::simulate_sell(f.cp.base_reserve, f.cp.quote_reserve, amount_in, f.lp_fee_bps, f.protocol_fee_bps)?
                    .amount_out)
            } else {
                Ok(pumpswap::simulate_buy(f.cp.quote_reserve, f.cp.base_reserve, amount_in, f.lp_fee_bps, f.protocol_fee_bps)?
                    .amount_out)
            }
        }
        CachedPool::RaydiumV4(f) => {
            let natural_low_is_base = f.cp.base_mint <= f.cp.quote_mint;
            let base_to_quote = natural_low_is_base == low_to_high;
            let (in_reserve, out_reserve) = if base_to_quote {
                (f.cp.base_reserve, f.cp.quote_reserve)
            } else {
                (f.cp.quote_reserve, f.cp.base_reserve)
            };
            Ok(raydium_v4::simulate(in_reserve, out_reserve, amount_in, f.fee_numerator, f.fee_denominator)?.amount_out)
        }
        CachedPool::RaydiumClmm(f) => {
            let natural_low_is_0 = f.token_mint_0 <= f.token_mint_1;
            let zero_for_one = natural_low_is_0 == low_to_high;
            let ticks = cache.tick_list(pool_key).ok_or(SimulationError::VaultReadMissing)?;
            let result = raydium_clmm::simulate_swap(
                f.sqrt_price_x64,
                f.tick_current,
                f.liquidity,
                f.fee_rate,
                ticks.as_slice(),
                amount_in,
                zero_for_one,
                None,
            )?;
            Ok(result.amount_out)
        }
        CachedPool::MeteoraDlmm(f) => {
            let natural_low_is_x = f.token_x_mint <= f.token_y_mint;
            let x_to_y = natural_low_is_x == low_to_high;
            let bins = cache.bin_map(pool_key).ok_or(SimulationError::VaultReadMissing)?;
            let direction = if x_to_y { meteora_dlmm::Direction::XToY } else { meteora_dlmm::Direction::YToX };
            let result = meteora_dlmm::simulate_swap(
                f.active_id,
                f.bin_step,
                f.base_factor,
                f.variable_fee_control,
                f.volatility_accumulator,
                f.protocol_share,
                bins.as_map(),
                amount_in,
                direction,
                meteora_dlmm::FeeMode::Output,
            )?;
            Ok(result.amount_out)
        }
    }
}

/// Finds a spread among `pool_keys`, prices the buy-low/sell-high round
/// trip with `input_amount` of the canonically-lower mint, and emits an
/// opportunity if every viability gate passes.
pub fn detect(detector: &Detector, pool_keys: &[Pubkey], input_amount: u64, detected_at_slot: u64) -> Option<Opportunity> {
    let candidate = find_spread(detector.cache, pool_keys, detector.config.min_spread_bps)?;

    // Sell the low mint where it's dearest (the expensive pool pays more
    // high-mint per low-mint), then buy it back where it's cheapest.
    let expensive_pool = detector.cache.get_pool(&candidate.expensive_pool)?;
    let high_mint_out = simulate_leg(detector.cache, &candidate.expensive_pool, &expensive_pool, input_amount, true).ok()?;
    if high_mint_out == 0 {
        return None;
    }

    let cheap_pool = detector.cache.get_pool(&candidate.cheap_pool)?;
    let low_mint_out = simulate_leg(detector.cache, &candidate.cheap_pool, &cheap_pool, high_mint_out, false).ok()?;

    let cost = input_amount as i64 + detector.config.gas_budget_lamports as i64 + detector.config.tip_budget_lamports as i64;
    let expected_profit = low_mint_out as i64 - cost;
    let profit_bps = if input_amount == 0 {
        0
    } else {
        (expected_profit.saturating_mul(10_000)) / input_amount as i64
    };

    let opportunity = Opportunity {
        id: detector.next_opportunity_id(),
        kind: OpportunityKind::CrossVenueArb,
        path: vec![
            SwapLeg {
                pool: candidate.expensive_pool,
                venue: candidate.expensive_venue,
                amount_in: input_amount,
                amount_out: high_mint_out,
            },
            SwapLeg {
                pool: candidate.cheap_pool,
                venue: candidate.cheap_venue,
                amount_in: high_mint_out,
                amount_out: low_mint_out,
            },
        ],
        input_amount,
        expected_output: low_mint_out,
        expected_profit,
        profit_bps,
        confidence: 0.9,
        detected_at: detected_at_slot,
        expiry_slot: detected_at_slot + detector.config.expiry_slot_buffer,
    };

    if crate::detector::passes_viability_gates(&opportunity, detector.config) {
        log::info!(
            "cross-venue opportunity {} between {:?} and {:?}: {} bps spread, {} lamports profit",
            opportunity.id, candidate.cheap_venue, candidate.expensive_venue, candidate.spread_bps, opportunity.expected_profit
        );
        Some(opportunity)
    } else {
        log::debug!(
            "cross-venue spread {} bps between {:?}/{:?} failed viability gates",
            candidate.spread_bps, candidate.cheap_venue, candidate.expensive_venue
        );
        None
    }
}
