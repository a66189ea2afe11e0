//! Per-venue swap simulators. Each module takes
//! decoded pool state and produces the exact output a swap would yield
//! against confirmed (or speculative) reserves, with no RPC or
//! transaction-building surface — that belongs to a higher layer.

pub mod pumpswap;
pub mod raydium_v4;
pub mod raydium_clmm;
pub mod meteora_dlmm;
