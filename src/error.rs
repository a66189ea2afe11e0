//! Crate-wide error taxonomy.
//!
//! Each enum corresponds to one of the error groups named in the kernel
//! design: decode errors are surfaced at the ingestion boundary and the
//! offending update is dropped; stale-state errors mean the cache lags
//! the pool header and the simulation is skipped; math-invariant errors
//! are programmer errors that abort a single simulation without
//! panicking the process.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected at least {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    #[error("unrecognized discriminator {0:02x?}")]
    BadDiscriminator([u8; 8]),
    #[error("field `{field}` out of range: {value}")]
    FieldOutOfRange { field: &'static str, value: i64 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("division by zero")]
    DivByZero,
    #[error("tick {0} outside valid range [-443636, 443636]")]
    TickOutOfRange(i32),
    #[error("sqrt price {0} outside the valid domain")]
    SqrtPriceOutOfRange(u128),
    #[error("256-bit intermediate overflowed during mul-div")]
    Overflow,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error(transparent)]
    Math(#[from] MathError),
    #[error("liquidity underflowed below zero while crossing a tick")]
    LiquidityUnderflow,
    #[error("bin reserves would go negative; aggregated bin map is stale")]
    AggregatedBinUnderflow,
    #[error("step consumed {consumed} which exceeds the {remaining} remaining")]
    StepConsumedExceedsRemaining { consumed: u128, remaining: u128 },
    #[error("pool vault data required for simulation is missing from the store")]
    VaultReadMissing,
    #[error("invalid pool reserves (zero reserve on one side)")]
    InvalidReserves,
    #[error("fee rate {0} is not exercised by any known venue (>= the fee denominator)")]
    DegenerateFeeRate(u64),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown program key: {0}")]
    UnknownProgramKey(String),
    #[error("venue {0} is disabled by configuration")]
    VenueDisabled(&'static str),
}
