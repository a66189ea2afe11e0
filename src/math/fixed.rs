//! Q64.64 helpers: 256-bit mul-div and repeated-squaring power.

use crate::error::MathError;
use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer, wide enough to hold a u128 * u128 product.
    pub struct U256(4);
}

/// `floor(a * b / d)`, computed via a 256-bit intermediate product.
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> Result<u128, MathError> {
    if d == 0 {
        return Err(MathError::DivByZero);
    }
    let product = U256::from(a) * U256::from(b);
    let result = product / U256::from(d);
    u256_to_u128(result)
}

/// `ceil(a * b / d)`, computed via a 256-bit intermediate product.
pub fn mul_div_ceil(a: u128, b: u128, d: u128) -> Result<u128, MathError> {
    if d == 0 {
        return Err(MathError::DivByZero);
    }
    let product = U256::from(a) * U256::from(b);
    let denom = U256::from(d);
    let result = (product + denom - U256::from(1u8)) / denom;
    u256_to_u128(result)
}

fn u256_to_u128(v: U256) -> Result<u128, MathError> {
    if v > U256::from(u128::MAX) {
        return Err(MathError::Overflow);
    }
    Ok(v.as_u128())
}

/// `base_q64 ^ exp`, a Q64.64 value raised to an integer power via
/// repeated squaring, used for the DLMM bin-price ladder
/// `(1 + bin_step / 10000) ^ bin_id`.
pub fn pow_q64(base_q64: u128, mut exp: u32) -> Result<u128, MathError> {
    const ONE_Q64: u128 = 1u128 << 64;
    let mut result: u128 = ONE_Q64;
    let mut base = base_q64;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_div_floor(result, base, ONE_Q64)?;
        }
        base = mul_div_floor(base, base, ONE_Q64)?;
        exp >>= 1;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_floor_basic() {
        assert_eq!(mul_div_floor(10_000_000, 100_000, 1_100_000).unwrap(), 909_090);
    }

    #[test]
    fn mul_div_ceil_rounds_up_on_remainder() {
        assert_eq!(mul_div_ceil(1, 1, 3).unwrap(), 1);
        assert_eq!(mul_div_floor(1, 1, 3).unwrap(), 0);
        assert_eq!(mul_div_ceil(3, 1, 3).unwrap(), 1);
    }

    #[test]
    fn mul_div_div_by_zero() {
        assert_eq!(mul_div_floor(1, 1, 0), Err(MathError::DivByZero));
    }

    #[test]
    fn pow_q64_identity_for_exp_zero() {
        let base = 2u128 << 64;
        assert_eq!(pow_q64(base, 0).unwrap(), 1u128 << 64);
    }

    #[test]
    fn pow_q64_matches_repeated_multiplication() {
        let one_q64 = 1u128 << 64;
        // 1.0001^4 computed two ways should agree.
        let base = one_q64 + one_q64 / 10_000; // 1.0001 in Q64.64
        let via_pow = pow_q64(base, 4).unwrap();

        let mut via_mul = one_q64;
        for _ in 0..4 {
            via_mul = mul_div_floor(via_mul, base, one_q64).unwrap();
        }
        assert_eq!(via_pow, via_mul);
    }
}
