//! Tick <-> sqrt-price conversion, the canonical Uniswap V3 constant-
//! multiplier ladder adapted to a Q64.64 (rather than Q96) sqrt-price
//! representation, as used by tick-spaced concentrated-liquidity venues.

use crate::error::MathError;
use crate::math::fixed::U256;

pub const MIN_TICK: i32 = -443_636;
pub const MAX_TICK: i32 = 443_636;

/// `sqrt(1.0001^tick)` as a Q64.64 value.
///
/// Builds a Q128.128 intermediate by multiplying in a fixed ladder of
/// precomputed constants selected by the bits of `|tick|`, inverts for
/// negative ticks, then rounds the Q128 intermediate down to Q64.64,
/// rounding up whenever the discarded low 64 bits are nonzero.
pub fn sqrt_price_at_tick(tick: i32) -> Result<u128, MathError> {
    if tick < MIN_TICK || tick > MAX_TICK {
        return Err(MathError::TickOutOfRange(tick));
    }

    let abs_tick = tick.unsigned_abs();

    let mut ratio: U256 = if abs_tick & 0x1 != 0 {
        U256::from(0xfffcb933bd6fad37aa2d162d1a594001u128)
    } else {
        U256::from(1u128) << 128
    };

    const LADDER: [(u32, u128); 19] = [
        (0x2, 0xfff97272373d413259a46990580e213a),
        (0x4, 0xfff2e50f5f656932ef12357cf3c7fdcc),
        (0x8, 0xffe5caca7e10e4e61c3624eaa0941cd0),
        (0x10, 0xffcb9843d60f6159c9db58835c926644),
        (0x20, 0xff973b41fa98c081472e6896dfb254c0),
        (0x40, 0xff2ea16466c96a3843ec78b326b52861),
        (0x80, 0xfe5dee046a99a2a811c461f1969c3053),
        (0x100, 0xfcbe86c7900a88aedcffc83b479aa3a4),
        (0x200, 0xf987a7253ac413176f2b074cf7815e54),
        (0x400, 0xf3392b0822b70005940c7a398e4b70f3),
        (0x800, 0xe7159475a2c29b7443b29c7fa6e889d9),
        (0x1000, 0xd097f3bdfd2022b8845ad8f792aa5825),
        (0x2000, 0xa9f746462d870fdf8a65dc1f90e061e5),
        (0x4000, 0x70d869a156d2a1b890bb3df62baf32f7),
        (0x8000, 0x31be135f97d08fd981231505542fcfa6),
        (0x10000, 0x9aa508b5b7a84e1c677de54f3e99bc9),
        (0x20000, 0x5d6af8dedb81196699c329225ee604),
        (0x40000, 0x2216e584f5fa1ea926041bedfe98),
        (0x80000, 0x48a170391f7dc42444e8fa2),
    ];

    for (mask, constant) in LADDER {
        if abs_tick & mask != 0 {
            ratio = (ratio * U256::from(constant)) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.64, rounding up on a nonzero remainder.
    let shifted = ratio >> 64;
    let remainder = ratio - (shifted << 64);
    let rounded = if remainder.is_zero() {
        shifted
    } else {
        shifted + U256::from(1u8)
    };

    if rounded > U256::from(u128::MAX) {
        return Err(MathError::Overflow);
    }
    Ok(rounded.as_u128())
}

/// Greatest tick `t` such that `sqrt_price_at_tick(t) <= sqrt_price`.
///
/// Binary search over the monotonically increasing `sqrt_price_at_tick`
/// ladder; `sqrt_price` must lie within `[sqrt_price_at_tick(MIN_TICK),
/// sqrt_price_at_tick(MAX_TICK)]`.
pub fn tick_at_sqrt_price(sqrt_price: u128) -> Result<i32, MathError> {
    let lo_price = sqrt_price_at_tick(MIN_TICK)?;
    let hi_price = sqrt_price_at_tick(MAX_TICK)?;
    if sqrt_price < lo_price || sqrt_price > hi_price {
        return Err(MathError::SqrtPriceOutOfRange(sqrt_price));
    }

    let mut lo = MIN_TICK;
    let mut hi = MAX_TICK;
    while lo < hi {
        // Bias the midpoint high so the loop converges on the greatest
        // tick satisfying the predicate rather than oscillating.
        let mid = lo + (hi - lo + 1) / 2;
        let mid_price = sqrt_price_at_tick(mid)?;
        if mid_price <= sqrt_price {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Ok(lo)
}
