//! PumpSwap constant-product simulator.
//!
//! Two-sided fee placement: fee-on-output for a sell (base -> quote),
//! fee-on-input with a ceiling correction for a buy (quote -> base).
//! The two directions are not algebraic mirrors of each other under
//! floor division, so each has its own formula.

use crate::error::SimulationError;

pub const FEE_DENOM: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpAmmResult {
    pub amount_out: u64,
    pub fee: u64,
    pub new_in_reserve: u64,
    pub new_out_reserve: u64,
}

/// Sell: base -> quote. Fee is taken on the gross output.
pub fn simulate_sell(
    in_reserve: u64,
    out_reserve: u64,
    amount_in: u64,
    lp_bps: u64,
    protocol_bps: u64,
) -> Result<CpAmmResult, SimulationError> {
    if in_reserve == 0 || out_reserve == 0 {
        return Err(SimulationError::InvalidReserves);
    }
    let fee_bps = lp_bps + protocol_bps;

    let gross_out = mul_div_u64(out_reserve, amount_in, in_reserve + amount_in);
    let fee = mul_div_u64(gross_out, fee_bps, FEE_DENOM);
    let amount_out = gross_out - fee;

    Ok(CpAmmResult {
        amount_out,
        fee,
        new_in_reserve: in_reserve + amount_in,
        new_out_reserve: out_reserve - gross_out,
    })
}

/// Buy: quote -> base. Fee is taken on the input, with a ceiling
/// correction so that `net_in`'s implied fee never exceeds the actual
/// amount transferred in.
pub fn simulate_buy(
    quote_reserve: u64,
    base_reserve: u64,
    amount_in: u64,
    lp_bps: u64,
    protocol_bps: u64,
) -> Result<CpAmmResult, SimulationError> {
    if quote_reserve == 0 || base_reserve == 0 {
        return Err(SimulationError::InvalidReserves);
    }
    let fee_bps = lp_bps + protocol_bps;

    let mut net_in = mul_div_u64(amount_in, FEE_DENOM, FEE_DENOM + fee_bps);
    let implied_fee = div_ceil_u64(net_in * fee_bps, FEE_DENOM);
    if implied_fee + net_in < amount_in {
        net_in += 1;
    }

    let amount_out = mul_div_u64(base_reserve, net_in, quote_reserve + net_in);
    let fee = amount_in - net_in;

    Ok(CpAmmResult {
        amount_out,
        fee,
        new_in_reserve: quote_reserve + net_in,
        new_out_reserve: base_reserve - amount_out,
    })
}

fn mul_div_u64(a: u64, b: u64, d: u64) -> u64 {
    ((a as u128 * b as u128) / d as u128) as u64
}

fn div_ceil_u64(a: u64, d: u64) -> u64 {
    (a + d - 1) / d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sell_fee_30_bps_matches_scenario() {
        let result = simulate_sell(1_000_000, 10_000_000, 100_000, 20, 10).unwrap();
        assert_eq!(result.fee, 2_727);
        assert_eq!(result.amount_out, 906_363);
    }

    #[test]
    fn buy_with_zero_fee_matches_plain_constant_product() {
        let result = simulate_buy(5_000_000, 1_000_000, 50_000, 0, 0).unwrap();
        let expected = mul_div_u64(1_000_000, 50_000, 5_000_000 + 50_000);
        assert_eq!(result.amount_out, expected);
        assert_eq!(result.fee, 0);
    }

    #[test]
    fn zero_reserves_are_rejected() {
        assert_eq!(
            simulate_sell(0, 10, 1, 20, 10),
            Err(SimulationError::InvalidReserves)
        );
    }
}
