//! Raydium V4 constant-product simulator.
//!
//! Fee is taken on the input *before* the constant-product step, unlike
//! PumpSwap's sell leg. The algebraic shortcut that folds the fee into a
//! single division is deliberately not used here: it rounds differently
//! from the on-chain program for small `amount_in`, and this simulator
//! must reproduce on-chain output bit-exactly.

use crate::error::SimulationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpAmmResult {
    pub amount_out: u64,
    pub fee: u64,
    pub new_in_reserve: u64,
    pub new_out_reserve: u64,
}

pub fn simulate(
    in_reserve: u64,
    out_reserve: u64,
    amount_in: u64,
    fee_numerator: u64,
    fee_denominator: u64,
) -> Result<CpAmmResult, SimulationError> {
    if in_reserve == 0 || out_reserve == 0 {
        return Err(SimulationError::InvalidReserves);
    }
    if fee_denominator == 0 {
        return Err(SimulationError::InvalidReserves);
    }

    let fee = ((amount_in as u128 * fee_numerator as u128) / fee_denominator as u128) as u64;
    let net_in = amount_in - fee;

    let amount_out =
        ((out_reserve as u128 * net_in as u128) / (in_reserve as u128 + net_in as u128)) as u64;

    Ok(CpAmmResult {
        amount_out,
        fee,
        new_in_reserve: in_reserve + net_in,
        new_out_reserve: out_reserve - amount_out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_fee_25_bps_matches_scenario() {
        let result = simulate(5_000_000, 1_000_000, 50_000, 25, 10_000).unwrap();
        assert_eq!(result.fee, 125);
        assert_eq!(result.amount_out, 9_876);
    }

    #[test]
    fn zero_amount_in_yields_zero_out() {
        let result = simulate(5_000_000, 1_000_000, 0, 25, 10_000).unwrap();
        assert_eq!(result.amount_out, 0);
        assert_eq!(result.fee, 0);
    }

    #[test]
    fn zero_reserve_is_rejected() {
        assert_eq!(
            simulate(0, 1_000_000, 1, 25, 10_000),
            Err(SimulationError::InvalidReserves)
        );
    }
}
