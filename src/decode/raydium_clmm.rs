//! Raydium CLMM pool, AmmConfig, and tick-array decoding, plus the
//! tick-array PDA derivation.

use solana_sdk::pubkey::Pubkey;

use crate::decode::{
    check_discriminator, check_len, discriminator, read_i128, read_i32, read_pubkey, read_u128,
    read_u16, read_u32, size,
};
use crate::error::DecodeError;
use crate::math::{MAX_TICK, MIN_TICK};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClmmPool {
    pub amm_config: Pubkey,
    pub token_mint_0: Pubkey,
    pub token_mint_1: Pubkey,
    pub token_vault_0: Pubkey,
    pub token_vault_1: Pubkey,
    pub tick_spacing: u16,
    pub liquidity: u128,
    pub sqrt_price_x64: u128,
    pub tick_current: i32,
}

const AMM_CONFIG_OFFSET: usize = 9;
const TOKEN_MINT_0_OFFSET: usize = 73;
const TOKEN_MINT_1_OFFSET: usize = 105;
const TOKEN_VAULT_0_OFFSET: usize = 137;
const TOKEN_VAULT_1_OFFSET: usize = 169;
const TICK_SPACING_OFFSET: usize = 235;
const LIQUIDITY_OFFSET: usize = 237;
const SQRT_PRICE_X64_OFFSET: usize = 253;
const TICK_CURRENT_OFFSET: usize = 269;

pub fn decode_pool(data: &[u8]) -> Result<ClmmPool, DecodeError> {
    check_discriminator(data, discriminator::RAYDIUM_CLMM_POOL)?;
    check_len(data, size::RAYDIUM_CLMM_POOL)?;

    let tick_current = read_i32(data, TICK_CURRENT_OFFSET);
    if tick_current < MIN_TICK || tick_current > MAX_TICK {
        return Err(DecodeError::FieldOutOfRange {
            field: "tick_current",
            value: tick_current as i64,
        });
    }

    Ok(ClmmPool {
        amm_config: read_pubkey(data, AMM_CONFIG_OFFSET),
        token_mint_0: read_pubkey(data, TOKEN_MINT_0_OFFSET),
        token_mint_1: read_pubkey(data, TOKEN_MINT_1_OFFSET),
        token_vault_0: read_pubkey(data, TOKEN_VAULT_0_OFFSET),
        token_vault_1: read_pubkey(data, TOKEN_VAULT_1_OFFSET),
        tick_spacing: read_u16(data, TICK_SPACING_OFFSET),
        liquidity: read_u128(data, LIQUIDITY_OFFSET),
        sqrt_price_x64: read_u128(data, SQRT_PRICE_X64_OFFSET),
        tick_current,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmmConfig {
    pub index: u16,
    pub protocol_fee_rate: u32,
    pub trade_fee_rate: u32,
    pub tick_spacing: u16,
    pub fund_fee_rate: u32,
}

const CONFIG_INDEX_OFFSET: usize = 9;
const CONFIG_PROTOCOL_FEE_RATE_OFFSET: usize = 43;
const CONFIG_TRADE_FEE_RATE_OFFSET: usize = 47;
const CONFIG_TICK_SPACING_OFFSET: usize = 51;
const CONFIG_FUND_FEE_RATE_OFFSET: usize = 53;

pub fn decode_amm_config(data: &[u8]) -> Result<AmmConfig, DecodeError> {
    check_discriminator(data, discriminator::RAYDIUM_CLMM_AMM_CONFIG)?;
    check_len(data, size::RAYDIUM_CLMM_AMM_CONFIG)?;

    Ok(AmmConfig {
        index: read_u16(data, CONFIG_INDEX_OFFSET),
        protocol_fee_rate: read_u32(data, CONFIG_PROTOCOL_FEE_RATE_OFFSET),
        trade_fee_rate: read_u32(data, CONFIG_TRADE_FEE_RATE_OFFSET),
        tick_spacing: read_u16(data, CONFIG_TICK_SPACING_OFFSET),
        fund_fee_rate: read_u32(data, CONFIG_FUND_FEE_RATE_OFFSET),
    })
}

/// One initialized tick within a tick array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEntry {
    pub tick: i32,
    pub liquidity_net: i128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickArray {
    pub pool_id: Pubkey,
    pub start_tick_index: i32,
    pub initialized_tick_count: u8,
    pub ticks: Vec<TickEntry>,
}

const TICK_ARRAY_POOL_ID_OFFSET: usize = 0;
const TICK_ARRAY_START_TICK_OFFSET: usize = 32;
const TICK_ARRAY_INIT_COUNT_OFFSET: usize = 36;

const TICK_ENTRY_TICK_OFFSET: usize = 0;
const TICK_ENTRY_LIQUIDITY_NET_OFFSET: usize = 4;

pub fn decode_tick_array(data: &[u8]) -> Result<TickArray, DecodeError> {
    check_discriminator(data, discriminator::RAYDIUM_CLMM_TICK_ARRAY)?;
    check_len(data, size::RAYDIUM_CLMM_TICK_ARRAY)?;

    let header = &data[8..];
    let pool_id = read_pubkey(header, TICK_ARRAY_POOL_ID_OFFSET);
    let start_tick_index = read_i32(header, TICK_ARRAY_START_TICK_OFFSET);
    let initialized_tick_count = header[TICK_ARRAY_INIT_COUNT_OFFSET];

    let body_start = 8 + size::RAYDIUM_CLMM_TICK_ARRAY_HEADER;
    let mut ticks = Vec::new();
    for i in 0..size::RAYDIUM_CLMM_TICKS_PER_ARRAY {
        let entry_start = body_start + i * size::RAYDIUM_CLMM_TICK_ENTRY;
        let entry = &data[entry_start..entry_start + size::RAYDIUM_CLMM_TICK_ENTRY];
        let liquidity_net = read_i128(entry, TICK_ENTRY_LIQUIDITY_NET_OFFSET);
        if liquidity_net == 0 {
            continue;
        }
        let tick = read_i32(entry, TICK_ENTRY_TICK_OFFSET);
        ticks.push(TickEntry { tick, liquidity_net });
    }

    Ok(TickArray {
        pool_id,
        start_tick_index,
        initialized_tick_count,
        ticks,
    })
}

/// CLMM tick-array PDA: seeds are `"tick_array"`, the pool key, and the
/// start-tick-index as a 4-byte *big-endian* signed integer. Little-endian
/// derivations produce addresses that don't match the on-chain program.
pub fn tick_array_address(program_id: &Pubkey, pool_key: &Pubkey, start_tick_index: i32) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            b"tick_array",
            pool_key.as_ref(),
            &start_tick_index.to_be_bytes(),
        ],
        program_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_pool(tick_current: i32) -> Vec<u8> {
        let mut data = vec![0u8; size::RAYDIUM_CLMM_POOL];
        data[0..8].copy_from_slice(&discriminator::RAYDIUM_CLMM_POOL);
        data[TICK_SPACING_OFFSET..TICK_SPACING_OFFSET + 2].copy_from_slice(&60u16.to_le_bytes());
        data[LIQUIDITY_OFFSET..LIQUIDITY_OFFSET + 16].copy_from_slice(&(10u128.pow(12)).to_le_bytes());
        data[SQRT_PRICE_X64_OFFSET..SQRT_PRICE_X64_OFFSET + 16]
            .copy_from_slice(&(1u128 << 64).to_le_bytes());
        data[TICK_CURRENT_OFFSET..TICK_CURRENT_OFFSET + 4].copy_from_slice(&tick_current.to_le_bytes());
        data
    }

    #[test]
    fn decodes_pool_fields() {
        let data = synthetic_pool(0);
        let pool = decode_pool(&data).unwrap();
        assert_eq!(pool.tick_spacing, 60);
        assert_eq!(pool.liquidity, 10u128.pow(12));
        assert_eq!(pool.sqrt_price_x64, 1u128 << 64);
        assert_eq!(pool.tick_current, 0);
    }

    #[test]
    fn rejects_tick_current_out_of_range() {
        let data = synthetic_pool(MAX_TICK + 1);
        assert!(matches!(
            decode_pool(&data),
            Err(DecodeError::FieldOutOfRange { field: "tick_current", .. })
        ));
    }

    #[test]
    fn decodes_amm_config() {
        let mut data = vec![0u8; size::RAYDIUM_CLMM_AMM_CONFIG];
        data[0..8].copy_from_slice(&discriminator::RAYDIUM_CLMM_AMM_CONFIG);
        data[CONFIG_TRADE_FEE_RATE_OFFSET..CONFIG_TRADE_FEE_RATE_OFFSET + 4]
            .copy_from_slice(&500u32.to_le_bytes());
        let cfg = decode_amm_config(&data).unwrap();
        assert_eq!(cfg.trade_fee_rate, 500);
    }

    #[test]
    fn decodes_tick_array_skipping_zero_liquidity_entries() {
        let mut data = vec![0u8; size::RAYDIUM_CLMM_TICK_ARRAY];
        data[0..8].copy_from_slice(&discriminator::RAYDIUM_CLMM_TICK_ARRAY);
        let body_start = 8 + size::RAYDIUM_CLMM_TICK_ARRAY_HEADER;
        let entry_start = body_start + size::RAYDIUM_CLMM_TICK_ENTRY; // entry index 1
        data[entry_start..entry_start + 4].copy_from_slice(&(-10i32).to_le_bytes());
        data[entry_start + TICK_ENTRY_LIQUIDITY_NET_OFFSET
            ..entry_start + TICK_ENTRY_LIQUIDITY_NET_OFFSET + 16]
            .copy_from_slice(&(500_000_000_000i128).to_le_bytes());

        let array = decode_tick_array(&data).unwrap();
        assert_eq!(array.ticks.len(), 1);
        assert_eq!(array.ticks[0].tick, -10);
        assert_eq!(array.ticks[0].liquidity_net, 500_000_000_000);
    }

    #[test]
    fn tick_array_pda_uses_big_endian_tick() {
        let program_id = Pubkey::new_unique();
        let pool_key = Pubkey::new_unique();
        let (be_addr, _) = tick_array_address(&program_id, &pool_key, -10);
        let (le_addr, _) = Pubkey::find_program_address(
            &[b"tick_array", pool_key.as_ref(), &(-10i32).to_le_bytes()],
            &program_id,
        );
        assert_ne!(be_addr, le_addr);
    }
}
