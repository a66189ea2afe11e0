//! PumpSwap pool and global-fee-config decoding.
//!
//! PumpSwap does not embed its fee schedule in the pool account; per
//! the pool's paired `GlobalConfig` account is the single authoritative
//! fee source (market-cap tiering and other heuristics some indexers
//! apply are not reproduced here).

use solana_sdk::pubkey::Pubkey;

use crate::decode::{check_discriminator, check_len, discriminator, read_pubkey, read_u16, read_u64, size};
use crate::error::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpswapPool {
    pub pool_bump: u8,
    pub index: u16,
    pub creator: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub lp_mint: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub lp_supply: u64,
}

const POOL_BUMP_OFFSET: usize = 8;
const INDEX_OFFSET: usize = 9;
const CREATOR_OFFSET: usize = 11;
const BASE_MINT_OFFSET: usize = 43;
const QUOTE_MINT_OFFSET: usize = 75;
const LP_MINT_OFFSET: usize = 107;
const BASE_VAULT_OFFSET: usize = 139;
const QUOTE_VAULT_OFFSET: usize = 171;
const LP_SUPPLY_OFFSET: usize = 203;

pub fn decode_pool(data: &[u8]) -> Result<PumpswapPool, DecodeError> {
    check_discriminator(data, discriminator::PUMPSWAP_POOL)?;
    check_len(data, size::PUMPSWAP_POOL)?;

    Ok(PumpswapPool {
        pool_bump: data[POOL_BUMP_OFFSET],
        index: read_u16(data, INDEX_OFFSET),
        creator: read_pubkey(data, CREATOR_OFFSET),
        base_mint: read_pubkey(data, BASE_MINT_OFFSET),
        quote_mint: read_pubkey(data, QUOTE_MINT_OFFSET),
        lp_mint: read_pubkey(data, LP_MINT_OFFSET),
        base_vault: read_pubkey(data, BASE_VAULT_OFFSET),
        quote_vault: read_pubkey(data, QUOTE_VAULT_OFFSET),
        lp_supply: read_u64(data, LP_SUPPLY_OFFSET),
    })
}

/// Fee parameters read from the pool's paired `GlobalConfig` account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalConfig {
    pub lp_fee_bps: u64,
    pub protocol_fee_bps: u64,
}

const GLOBAL_CONFIG_ADMIN_OFFSET: usize = 8;
const GLOBAL_CONFIG_LP_FEE_OFFSET: usize = GLOBAL_CONFIG_ADMIN_OFFSET + 32;
const GLOBAL_CONFIG_PROTOCOL_FEE_OFFSET: usize = GLOBAL_CONFIG_LP_FEE_OFFSET + 8;
const GLOBAL_CONFIG_MIN_LEN: usize = GLOBAL_CONFIG_PROTOCOL_FEE_OFFSET + 8;

pub fn decode_global_config(data: &[u8]) -> Result<GlobalConfig, DecodeError> {
    check_len(data, GLOBAL_CONFIG_MIN_LEN)?;
    Ok(GlobalConfig {
        lp_fee_bps: read_u64(data, GLOBAL_CONFIG_LP_FEE_OFFSET),
        protocol_fee_bps: read_u64(data, GLOBAL_CONFIG_PROTOCOL_FEE_OFFSET),
    })
}
