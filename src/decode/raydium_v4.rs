//! Raydium V4 (`AmmInfo`) pool decoding. This layout predates Anchor
//! discriminators; account type is distinguished by owner program and
//! exact byte length (752 bytes) only.

use solana_sdk::pubkey::Pubkey;

use crate::decode::{check_len, read_pubkey, read_u64, size};
use crate::error::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaydiumV4Pool {
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub trade_fee_numerator: u64,
    pub trade_fee_denominator: u64,
}

const TRADE_FEE_NUMERATOR_OFFSET: usize = 144;
const TRADE_FEE_DENOMINATOR_OFFSET: usize = 152;
const BASE_VAULT_OFFSET: usize = 336;
const QUOTE_VAULT_OFFSET: usize = 368;
const BASE_MINT_OFFSET: usize = 400;
const QUOTE_MINT_OFFSET: usize = 432;

pub fn decode_pool(data: &[u8]) -> Result<RaydiumV4Pool, DecodeError> {
    check_len(data, size::RAYDIUM_V4_POOL)?;

    Ok(RaydiumV4Pool {
        base_mint: read_pubkey(data, BASE_MINT_OFFSET),
        quote_mint: read_pubkey(data, QUOTE_MINT_OFFSET),
        base_vault: read_pubkey(data, BASE_VAULT_OFFSET),
        quote_vault: read_pubkey(data, QUOTE_VAULT_OFFSET),
        trade_fee_numerator: read_u64(data, TRADE_FEE_NUMERATOR_OFFSET),
        trade_fee_denominator: read_u64(data, TRADE_FEE_DENOMINATOR_OFFSET),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_pool() -> Vec<u8> {
        let mut data = vec![0u8; size::RAYDIUM_V4_POOL];
        data[TRADE_FEE_NUMERATOR_OFFSET..TRADE_FEE_NUMERATOR_OFFSET + 8]
            .copy_from_slice(&25u64.to_le_bytes());
        data[TRADE_FEE_DENOMINATOR_OFFSET..TRADE_FEE_DENOMINATOR_OFFSET + 8]
            .copy_from_slice(&10_000u64.to_le_bytes());
        data
    }

    #[test]
    fn decodes_fee_fields() {
        let data = synthetic_pool();
        let pool = decode_pool(&data).unwrap();
        assert_eq!(pool.trade_fee_numerator, 25);
        assert_eq!(pool.trade_fee_denominator, 10_000);
    }

    #[test]
    fn rejects_short_account() {
        let data = vec![0u8; 100];
        assert!(matches!(decode_pool(&data), Err(DecodeError::WrongLength { .. })));
    }
}
