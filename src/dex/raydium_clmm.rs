//! Raydium CLMM (concentrated-liquidity) tick-traversing simulator.
//!
//! The step math (`compute_swap_step_exact_in`, the `getAmount0/1Delta`
//! and `getNextSqrtPriceFromAmountX` helpers) follows the canonical
//! Uniswap-V3-style swap loop, adapted to this crate's Q64.64
//! sqrt-price convention; its control structure mirrors `swap_internal`
//! in the upstream CLMM program (`SwapState`/`StepComputations`), just
//! operating on a pre-aggregated tick list instead of loading tick-array
//! accounts on demand.

use crate::error::{MathError, SimulationError};
use crate::math::{mul_div_ceil, mul_div_floor, sqrt_price_at_tick, tick_at_sqrt_price, MAX_TICK, MIN_TICK};

pub const FEE_DENOM: u128 = 1_000_000;
const STEP_CAP: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    pub consumed_in: u128,
    pub amount_out: u128,
    pub fee: u128,
    pub sqrt_price_next: u128,
    pub reached_target: bool,
}

/// A single step of the CLMM swap loop: swap `amount_remaining` (gross,
/// fee-inclusive) from `sqrt_current` toward `sqrt_target` under
/// constant `liquidity`.
pub fn compute_swap_step_exact_in(
    sqrt_current: u128,
    sqrt_target: u128,
    liquidity: u128,
    amount_remaining: u64,
    fee_rate: u32,
    zero_for_one: bool,
) -> Result<StepResult, SimulationError> {
    let fee_rate = fee_rate as u128;
    if fee_rate >= FEE_DENOM as u128 {
        return Err(SimulationError::DegenerateFeeRate(fee_rate as u64));
    }

    let remaining_less_fee =
        mul_div_floor(amount_remaining as u128, FEE_DENOM - fee_rate, FEE_DENOM)?;

    let delta_in = if zero_for_one {
        get_amount0_delta(sqrt_target, sqrt_current, liquidity, true)?
    } else {
        get_amount1_delta(sqrt_current, sqrt_target, liquidity, true)?
    };

    let (consumed_in, sqrt_price_next, fee, reached_target) = if remaining_less_fee >= delta_in {
        let fee = div_ceil_u128(delta_in * fee_rate, FEE_DENOM - fee_rate);
        (delta_in, sqrt_target, fee, true)
    } else {
        let sqrt_price_next = if zero_for_one {
            next_sqrt_price_from_amount0_rounding_up(sqrt_current, liquidity, remaining_less_fee, true)?
        } else {
            next_sqrt_price_from_amount1_rounding_down(sqrt_current, liquidity, remaining_less_fee, true)?
        };
        let fee = (amount_remaining as u128) - remaining_less_fee;
        (remaining_less_fee, sqrt_price_next, fee, false)
    };

    let amount_out = if zero_for_one {
        get_amount1_delta(sqrt_price_next, sqrt_current, liquidity, false)?
    } else {
        get_amount0_delta(sqrt_current, sqrt_price_next, liquidity, false)?
    };

    Ok(StepResult {
        consumed_in,
        amount_out,
        fee,
        sqrt_price_next,
        reached_target,
    })
}

fn div_ceil_u128(a: u128, d: u128) -> u128 {
    (a + d - 1) / d
}

fn get_amount0_delta(
    sqrt_a: u128,
    sqrt_b: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, MathError> {
    let (lo, hi) = if sqrt_a <= sqrt_b { (sqrt_a, sqrt_b) } else { (sqrt_b, sqrt_a) };
    if lo == hi {
        return Ok(0);
    }
    let numerator1 = liquidity.checked_shl(64).ok_or(MathError::Overflow)?;
    let numerator2 = hi - lo;
    if round_up {
        let step = mul_div_ceil(numerator1, numerator2, hi)?;
        Ok(div_ceil_u128(step, lo))
    } else {
        let step = mul_div_floor(numerator1, numerator2, hi)?;
        Ok(step / lo)
    }
}

fn get_amount1_delta(
    sqrt_a: u128,
    sqrt_b: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, MathError> {
    let (lo, hi) = if sqrt_a <= sqrt_b { (sqrt_a, sqrt_b) } else { (sqrt_b, sqrt_a) };
    let diff = hi - lo;
    if round_up {
        mul_div_ceil(liquidity, diff, 1u128 << 64)
    } else {
        mul_div_floor(liquidity, diff, 1u128 << 64)
    }
}

fn next_sqrt_price_from_amount0_rounding_up(
    sqrt_price: u128,
    liquidity: u128,
    amount: u128,
    add: bool,
) -> Result<u128, MathError> {
    if amount == 0 {
        return Ok(sqrt_price);
    }
    let numerator1 = liquidity.checked_shl(64).ok_or(MathError::Overflow)?;
    let product = amount.checked_mul(sqrt_price).ok_or(MathError::Overflow)?;
    let denominator = if add {
        numerator1.checked_add(product).ok_or(MathError::Overflow)?
    } else {
        numerator1.checked_sub(product).ok_or(MathError::Overflow)?
    };
    mul_div_ceil(numerator1, sqrt_price, denominator)
}

fn next_sqrt_price_from_amount1_rounding_down(
    sqrt_price: u128,
    liquidity: u128,
    amount: u128,
    add: bool,
) -> Result<u128, MathError> {
    if add {
        let quotient = mul_div_floor(amount, 1u128 << 64, liquidity)?;
        sqrt_price.checked_add(quotient).ok_or(MathError::Overflow)
    } else {
        let quotient = mul_div_ceil(amount, 1u128 << 64, liquidity)?;
        sqrt_price.checked_sub(quotient).ok_or(MathError::Overflow)
    }
}

/// Greatest (for `zero_for_one`) or least (otherwise) initialized tick
/// relative to `tick_current`, found by binary search over the
/// ascending-sorted aggregated tick list.
fn next_initialized_tick(ticks: &[(i32, i128)], tick_current: i32, zero_for_one: bool) -> Option<(i32, i128)> {
    let idx = ticks.partition_point(|&(t, _)| t <= tick_current);
    if zero_for_one {
        if idx == 0 { None } else { Some(ticks[idx - 1]) }
    } else if idx >= ticks.len() {
        None
    } else {
        Some(ticks[idx])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapResult {
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee_amount: u64,
    pub sqrt_price_after: u128,
    pub tick_after: i32,
    pub liquidity_after: u128,
    pub ticks_crossed: u32,
}

/// Full exact-input swap across the tick-traversing loop described in
/// the kernel design, using a pre-aggregated `(tick_index,
/// liquidity_net)` list sorted ascending by tick index.
pub fn simulate_swap(
    sqrt_price_x64: u128,
    tick_current: i32,
    liquidity: u128,
    fee_rate: u32,
    ticks: &[(i32, i128)],
    amount_in: u64,
    zero_for_one: bool,
    sqrt_price_limit: Option<u128>,
) -> Result<SwapResult, SimulationError> {
    if amount_in == 0 {
        return Ok(SwapResult {
            amount_in: 0,
            amount_out: 0,
            fee_amount: 0,
            sqrt_price_after: sqrt_price_x64,
            tick_after: tick_current,
            liquidity_after: liquidity,
            ticks_crossed: 0,
        });
    }

    let default_limit = if zero_for_one {
        sqrt_price_at_tick(MIN_TICK)?
    } else {
        sqrt_price_at_tick(MAX_TICK)?
    };
    let limit = sqrt_price_limit.unwrap_or(default_limit);

    let mut sqrt_price = sqrt_price_x64;
    let mut tick = tick_current;
    let mut liquidity = liquidity;
    let mut remaining = amount_in as u128;
    let mut out: u128 = 0;
    let mut fee_accum: u128 = 0;
    let mut ticks_crossed = 0u32;
    let mut steps = 0u32;

    while remaining > 0 && liquidity > 0 && steps < STEP_CAP {
        let at_limit = if zero_for_one { sqrt_price <= limit } else { sqrt_price >= limit };
        if at_limit {
            break;
        }
        steps += 1;

        let next_tick = next_initialized_tick(ticks, tick, zero_for_one);
        let bound_sqrt = match next_tick {
            Some((t, _)) => sqrt_price_at_tick(t)?,
            None => default_limit,
        };
        let sqrt_target = if zero_for_one { bound_sqrt.max(limit) } else { bound_sqrt.min(limit) };
        let tick_is_target = next_tick.is_some() && sqrt_target == bound_sqrt;

        let remaining_u64 = remaining.min(u64::MAX as u128) as u64;
        let step = compute_swap_step_exact_in(sqrt_price, sqrt_target, liquidity, remaining_u64, fee_rate, zero_for_one)?;

        let consumed_total = step.consumed_in + step.fee;
        if consumed_total > remaining {
            return Err(SimulationError::StepConsumedExceedsRemaining {
                consumed: consumed_total,
                remaining,
            });
        }
        remaining -= consumed_total;
        out += step.amount_out;
        fee_accum += step.fee;
        sqrt_price = step.sqrt_price_next;

        if step.reached_target && tick_is_target {
            let (crossed_tick, liquidity_net) = next_tick.unwrap();
            ticks_crossed += 1;
            if zero_for_one {
                let new_liquidity = liquidity as i128 - liquidity_net;
                if new_liquidity < 0 {
                    return Err(SimulationError::LiquidityUnderflow);
                }
                liquidity = new_liquidity as u128;
                tick = crossed_tick - 1;
            } else {
                let new_liquidity = liquidity as i128 + liquidity_net;
                if new_liquidity < 0 {
                    return Err(SimulationError::LiquidityUnderflow);
                }
                liquidity = new_liquidity as u128;
                tick = crossed_tick;
            }
        } else {
            tick = tick_at_sqrt_price(sqrt_price)?;
            break;
        }
    }

    Ok(SwapResult {
        amount_in: (amount_in as u128 - remaining) as u64,
        amount_out: out as u64,
        fee_amount: fee_accum as u64,
        sqrt_price_after: sqrt_price,
        tick_after: tick,
        liquidity_after: liquidity,
        ticks_crossed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_amount_swap_is_a_no_op() {
        let result = simulate_swap(1u128 << 64, 0, 10u128.pow(12), 500, &[], 0, true, None).unwrap();
        assert_eq!(result.amount_out, 0);
        assert_eq!(result.sqrt_price_after, 1u128 << 64);
    }

    #[test]
    fn single_range_step_no_tick_cross_matches_scenario() {
        let liquidity = 10u128.pow(12);
        let sqrt_price = 1u128 << 64;
        let result = simulate_swap(sqrt_price, 0, liquidity, 500, &[], 1_000_000, true, None).unwrap();
        assert_eq!(result.amount_in, 1_000_000);
        assert_eq!(result.ticks_crossed, 0);
    }

    #[test]
    fn crossing_one_initialized_tick_matches_scenario() {
        let liquidity = 10u128.pow(12);
        let sqrt_price = 1u128 << 64;
        let ticks = vec![(-10i32, 500_000_000_000i128)];
        let result = simulate_swap(sqrt_price, 0, liquidity, 100, &ticks, 5_000_000_000, true, None).unwrap();
        assert_eq!(result.ticks_crossed, 1);
        assert_eq!(result.liquidity_after, 500_000_000_000);
        assert_eq!(result.tick_after, -11);
    }

    #[test]
    fn fee_rate_at_denominator_is_rejected() {
        let err = compute_swap_step_exact_in(1u128 << 64, (1u128 << 64) - 1, 10u128.pow(12), 1000, 1_000_000, true);
        assert_eq!(err, Err(SimulationError::DegenerateFeeRate(1_000_000)));
    }
}
