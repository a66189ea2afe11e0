//! Fixed-point arithmetic shared by every venue simulator.
//!
//! Everything here operates on unsigned 128-bit values with 256-bit
//! intermediates; no floating point is permitted on this path (the
//! swap simulators downstream are meant to run allocation-free and
//! bit-exact with on-chain math).

pub mod fixed;
pub mod tick;

pub use fixed::{mul_div_ceil, mul_div_floor, pow_q64};
pub use tick::{sqrt_price_at_tick, tick_at_sqrt_price, MAX_TICK, MIN_TICK};
