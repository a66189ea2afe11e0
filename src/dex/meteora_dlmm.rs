//! Meteora DLMM discrete bin-traversing simulator: dynamic base +
//! variable fee, a Q64.64 bin-price cursor, and a capped bin-by-bin
//! walk starting from the active bin.

use std::collections::BTreeMap;

use crate::error::SimulationError;
use crate::math::{mul_div_floor, pow_q64};

/// Fee-numerator denominator (10^17); the fee is capped at 10% of it.
pub const FEE_DENOM: u128 = 100_000_000_000_000_000;
const FEE_CAP: u128 = 10_000_000_000_000_000;
const BIN_CAP: u32 = 512;

/// `base_factor · bin_step · 10^9 + variable_fee_control ·
/// (volatility_accumulator · bin_step)^2`, capped at 10% of `FEE_DENOM`.
pub fn fee_numerator(base_factor: u16, bin_step: u16, variable_fee_control: u32, volatility_accumulator: u32) -> u128 {
    let base_fee = base_factor as u128 * bin_step as u128 * 1_000_000_000u128;
    let vol_times_step = volatility_accumulator as u128 * bin_step as u128;
    let var_fee = variable_fee_control as u128 * vol_times_step * vol_times_step;
    (base_fee + var_fee).min(FEE_CAP)
}

/// `(1 + bin_step / 10000)` as a Q64.64 value: the per-bin price basis.
fn basis_q64(bin_step: u16) -> Result<u128, SimulationError> {
    let one = 1u128 << 64;
    let increment = mul_div_floor(one, bin_step as u128, 10_000)?;
    Ok(one + increment)
}

/// Price at `bin_id` in Q64.64: `(1 + bin_step/10000)^bin_id`.
pub fn price_at_bin(bin_id: i32, bin_step: u16) -> Result<u128, SimulationError> {
    let basis = basis_q64(bin_step)?;
    if bin_id >= 0 {
        Ok(pow_q64(basis, bin_id as u32)?)
    } else {
        let positive = pow_q64(basis, bin_id.unsigned_abs())?;
        let one = 1u128 << 64;
        Ok(mul_div_floor(one, one, positive)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    XToY,
    YToX,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeMode {
    Output,
    Input,
}

impl Default for FeeMode {
    fn default() -> Self {
        FeeMode::Output
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DlmmSwapResult {
    pub amount_in: u64,
    pub amount_out: u64,
    pub protocol_fee: u64,
    pub lp_fee: u64,
    pub bins_traversed: u32,
}

/// Bin-by-bin exact-input swap starting at `active_id`. `bins` maps
/// `bin_id -> (amount_x, amount_y)` for bins holding positive liquidity
/// on at least one side; bins absent from the map are treated as empty.
pub fn simulate_swap(
    active_id: i32,
    bin_step: u16,
    base_factor: u16,
    variable_fee_control: u32,
    volatility_accumulator: u32,
    protocol_share: u16,
    bins: &BTreeMap<i32, (u64, u64)>,
    amount_in: u64,
    direction: Direction,
    fee_mode: FeeMode,
) -> Result<DlmmSwapResult, SimulationError> {
    let fee_numer = fee_numerator(base_factor, bin_step, variable_fee_control, volatility_accumulator);
    let basis = basis_q64(bin_step)?;

    let mut bin_id = active_id;
    let mut price = price_at_bin(active_id, bin_step)?;
    let mut remaining = amount_in as u128;
    let mut total_out: u128 = 0;
    let mut total_fee: u128 = 0;
    let mut bins_traversed = 0u32;

    while remaining > 0 && bins_traversed < BIN_CAP {
        let (x, y) = bins.get(&bin_id).copied().unwrap_or((0, 0));
        let output_liquidity = match direction {
            Direction::XToY => y,
            Direction::YToX => x,
        } as u128;

        if output_liquidity == 0 {
            advance(&mut bin_id, &mut price, basis, direction)?;
            bins_traversed += 1;
            continue;
        }

        let max_in = match direction {
            Direction::XToY => ((y as u128 + 1) * (1u128 << 64) - 1) / price,
            Direction::YToX => (((x as u128 + 1) * price) - 1) >> 64,
        };
        let in_consumed = remaining.min(max_in);

        let out_before_fee = match direction {
            Direction::XToY => mul_div_floor(in_consumed, price, 1u128 << 64)?,
            Direction::YToX => mul_div_floor(in_consumed, 1u128 << 64, price)?,
        };

        let (fee, out_to_user) = match fee_mode {
            FeeMode::Output => {
                let fee = mul_div_floor(out_before_fee, fee_numer, FEE_DENOM)?;
                (fee, out_before_fee - fee)
            }
            FeeMode::Input => {
                let fee = mul_div_floor(in_consumed, fee_numer, FEE_DENOM)?;
                let in_after_fee = in_consumed - fee;
                let out = match direction {
                    Direction::XToY => mul_div_floor(in_after_fee, price, 1u128 << 64)?,
                    Direction::YToX => mul_div_floor(in_after_fee, 1u128 << 64, price)?,
                };
                (fee, out)
            }
        };

        if out_to_user > output_liquidity {
            return Err(SimulationError::AggregatedBinUnderflow);
        }

        total_out += out_to_user;
        total_fee += fee;
        remaining -= in_consumed;

        if in_consumed == max_in && remaining > 0 {
            advance(&mut bin_id, &mut price, basis, direction)?;
            bins_traversed += 1;
        }
    }

    let protocol_fee = mul_div_floor(total_fee, protocol_share as u128, 10_000)?;
    let lp_fee = total_fee - protocol_fee;

    Ok(DlmmSwapResult {
        amount_in: (amount_in as u128 - remaining) as u64,
        amount_out: total_out as u64,
        protocol_fee: protocol_fee as u64,
        lp_fee: lp_fee as u64,
        bins_traversed,
    })
}

fn advance(bin_id: &mut i32, price: &mut u128, basis: u128, direction: Direction) -> Result<(), SimulationError> {
    match direction {
        Direction::XToY => {
            *bin_id += 1;
            *price = mul_div_floor(*price, basis, 1u128 << 64)?;
        }
        Direction::YToX => {
            *bin_id -= 1;
            *price = mul_div_floor(*price, 1u128 << 64, basis)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_bin_step_matches_scenario() {
        let mut bins = BTreeMap::new();
        bins.insert(0, (0u64, 1_000_000_000u64));

        let result = simulate_swap(0, 25, 5000, 0, 0, 2000, &bins, 1_000_000, Direction::XToY, FeeMode::Output).unwrap();

        assert_eq!(result.amount_out, 998_750);
        assert_eq!(result.bins_traversed, 0);
        assert_eq!(result.protocol_fee + result.lp_fee, 1250);
    }

    #[test]
    fn fee_numerator_matches_scenario() {
        let numer = fee_numerator(5000, 25, 0, 0);
        assert_eq!(numer, 125_000_000_000_000);
    }

    #[test]
    fn empty_bins_return_zero_after_capped_traversal() {
        let bins = BTreeMap::new();
        let result = simulate_swap(0, 25, 5000, 0, 0, 2000, &bins, 1_000_000, Direction::XToY, FeeMode::Output).unwrap();
        assert_eq!(result.amount_out, 0);
        assert_eq!(result.bins_traversed, BIN_CAP);
    }

    #[test]
    fn zero_amount_in_yields_zero_out() {
        let mut bins = BTreeMap::new();
        bins.insert(0, (0u64, 1_000_000_000u64));
        let result = simulate_swap(0, 25, 5000, 0, 0, 2000, &bins, 0, Direction::XToY, FeeMode::Output).unwrap();
        assert_eq!(result.amount_out, 0);
        assert_eq!(result.bins_traversed, 0);
    }
}
