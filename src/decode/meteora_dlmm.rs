//! Meteora DLMM `LbPair` and bin-array decoding, plus the bin-array PDA
//! derivation.

use solana_sdk::pubkey::Pubkey;

use crate::decode::{
    check_discriminator, check_len, discriminator, read_i32, read_pubkey, read_u16, read_u32,
    read_u64, size,
};
use crate::error::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LbPair {
    pub active_id: i32,
    pub bin_step: u16,
    pub base_factor: u16,
    pub protocol_share: u16,
    pub variable_fee_control: u32,
    pub volatility_accumulator: u32,
    pub token_x_mint: Pubkey,
    pub token_y_mint: Pubkey,
    pub reserve_x: Pubkey,
    pub reserve_y: Pubkey,
}

const BASE_FACTOR_OFFSET: usize = 8;
const VARIABLE_FEE_CONTROL_OFFSET: usize = 16;
const PROTOCOL_SHARE_OFFSET: usize = 32;
const VOLATILITY_ACCUMULATOR_OFFSET: usize = 40;
const ACTIVE_ID_OFFSET: usize = 68;
const BIN_STEP_OFFSET: usize = 72;
const TOKEN_X_MINT_OFFSET: usize = 80;
const TOKEN_Y_MINT_OFFSET: usize = 112;
const RESERVE_X_OFFSET: usize = 144;
const RESERVE_Y_OFFSET: usize = 176;

const BIN_STEP_MIN: u16 = 1;
const BIN_STEP_MAX: u16 = 500;

pub fn decode_lb_pair(data: &[u8]) -> Result<LbPair, DecodeError> {
    check_discriminator(data, discriminator::METEORA_DLMM_LB_PAIR)?;
    check_len(data, size::METEORA_DLMM_LB_PAIR)?;

    let bin_step = read_u16(data, BIN_STEP_OFFSET);
    if bin_step < BIN_STEP_MIN || bin_step > BIN_STEP_MAX {
        return Err(DecodeError::FieldOutOfRange {
            field: "bin_step",
            value: bin_step as i64,
        });
    }

    Ok(LbPair {
        active_id: read_i32(data, ACTIVE_ID_OFFSET),
        bin_step,
        base_factor: read_u16(data, BASE_FACTOR_OFFSET),
        protocol_share: read_u16(data, PROTOCOL_SHARE_OFFSET),
        variable_fee_control: read_u32(data, VARIABLE_FEE_CONTROL_OFFSET),
        volatility_accumulator: read_u32(data, VOLATILITY_ACCUMULATOR_OFFSET),
        token_x_mint: read_pubkey(data, TOKEN_X_MINT_OFFSET),
        token_y_mint: read_pubkey(data, TOKEN_Y_MINT_OFFSET),
        reserve_x: read_pubkey(data, RESERVE_X_OFFSET),
        reserve_y: read_pubkey(data, RESERVE_Y_OFFSET),
    })
}

/// One bin's reserves within a bin array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinEntry {
    pub bin_id: i32,
    pub amount_x: u64,
    pub amount_y: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinArray {
    pub lb_pair: Pubkey,
    pub index: i64,
    pub bins: Vec<BinEntry>,
}

const BIN_ARRAY_LB_PAIR_OFFSET: usize = 0;
const BIN_ARRAY_INDEX_OFFSET: usize = 32;

const BIN_ENTRY_AMOUNT_X_OFFSET: usize = 0;
const BIN_ENTRY_AMOUNT_Y_OFFSET: usize = 8;

pub fn decode_bin_array(data: &[u8]) -> Result<BinArray, DecodeError> {
    check_discriminator(data, discriminator::METEORA_DLMM_BIN_ARRAY)?;
    check_len(data, size::METEORA_DLMM_BIN_ARRAY_HEADER + size::METEORA_DLMM_BINS_PER_ARRAY
        * size::METEORA_DLMM_BIN_ENTRY + 8)?;

    let header = &data[8..];
    let lb_pair = read_pubkey(header, BIN_ARRAY_LB_PAIR_OFFSET);
    let index = i64::from_le_bytes(
        header[BIN_ARRAY_INDEX_OFFSET..BIN_ARRAY_INDEX_OFFSET + 8]
            .try_into()
            .unwrap(),
    );

    let body_start = 8 + size::METEORA_DLMM_BIN_ARRAY_HEADER;
    let first_bin_id = index * size::METEORA_DLMM_BINS_PER_ARRAY as i64;

    let mut bins = Vec::new();
    for i in 0..size::METEORA_DLMM_BINS_PER_ARRAY {
        let entry_start = body_start + i * size::METEORA_DLMM_BIN_ENTRY;
        let entry = &data[entry_start..entry_start + size::METEORA_DLMM_BIN_ENTRY];
        let amount_x = read_u64(entry, BIN_ENTRY_AMOUNT_X_OFFSET);
        let amount_y = read_u64(entry, BIN_ENTRY_AMOUNT_Y_OFFSET);
        if amount_x == 0 && amount_y == 0 {
            continue;
        }
        bins.push(BinEntry {
            bin_id: (first_bin_id + i as i64) as i32,
            amount_x,
            amount_y,
        });
    }

    Ok(BinArray { lb_pair, index, bins })
}

pub const BINS_PER_ARRAY: i64 = size::METEORA_DLMM_BINS_PER_ARRAY as i64;

/// `floor(bin_id / 70)`, rounding toward negative infinity for negative
/// bin ids (Rust's `/` truncates toward zero, so this needs an explicit
/// correction).
pub fn bin_array_index(bin_id: i32) -> i64 {
    let bin_id = bin_id as i64;
    let q = bin_id / BINS_PER_ARRAY;
    if bin_id % BINS_PER_ARRAY != 0 && (bin_id < 0) != (BINS_PER_ARRAY < 0) {
        q - 1
    } else {
        q
    }
}

/// DLMM bin-array PDA: seeds are `"bin_array"`, the pair key, and the
/// array index as a little-endian signed 64-bit integer.
pub fn bin_array_address(program_id: &Pubkey, pair_key: &Pubkey, index: i64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[b"bin_array", pair_key.as_ref(), &index.to_le_bytes()],
        program_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_lb_pair(bin_step: u16) -> Vec<u8> {
        let mut data = vec![0u8; size::METEORA_DLMM_LB_PAIR];
        data[0..8].copy_from_slice(&discriminator::METEORA_DLMM_LB_PAIR);
        data[BIN_STEP_OFFSET..BIN_STEP_OFFSET + 2].copy_from_slice(&bin_step.to_le_bytes());
        data[BASE_FACTOR_OFFSET..BASE_FACTOR_OFFSET + 2].copy_from_slice(&5000u16.to_le_bytes());
        data
    }

    #[test]
    fn decodes_lb_pair_fields() {
        let data = synthetic_lb_pair(25);
        let pair = decode_lb_pair(&data).unwrap();
        assert_eq!(pair.bin_step, 25);
        assert_eq!(pair.base_factor, 5000);
    }

    #[test]
    fn rejects_bin_step_out_of_range() {
        let data = synthetic_lb_pair(501);
        assert!(matches!(
            decode_lb_pair(&data),
            Err(DecodeError::FieldOutOfRange { field: "bin_step", .. })
        ));
    }

    #[test]
    fn bin_array_index_floors_toward_negative_infinity() {
        assert_eq!(bin_array_index(0), 0);
        assert_eq!(bin_array_index(69), 0);
        assert_eq!(bin_array_index(70), 1);
        assert_eq!(bin_array_index(-1), -1);
        assert_eq!(bin_array_index(-70), -1);
        assert_eq!(bin_array_index(-71), -2);
    }

    #[test]
    fn decodes_bin_array_skipping_empty_bins() {
        let total_len = 8
            + size::METEORA_DLMM_BIN_ARRAY_HEADER
            + size::METEORA_DLMM_BINS_PER_ARRAY * size::METEORA_DLMM_BIN_ENTRY;
        let mut data = vec![0u8; total_len];
        data[0..8].copy_from_slice(&discriminator::METEORA_DLMM_BIN_ARRAY);
        data[8 + BIN_ARRAY_INDEX_OFFSET..8 + BIN_ARRAY_INDEX_OFFSET + 8]
            .copy_from_slice(&0i64.to_le_bytes());

        let body_start = 8 + size::METEORA_DLMM_BIN_ARRAY_HEADER;
        let entry_start = body_start + 3 * size::METEORA_DLMM_BIN_ENTRY;
        data[entry_start..entry_start + 8].copy_from_slice(&0u64.to_le_bytes());
        data[entry_start + 8..entry_start + 16].copy_from_slice(&1_000_000_000u64.to_le_bytes());

        let array = decode_bin_array(&data).unwrap();
        assert_eq!(array.bins.len(), 1);
        assert_eq!(array.bins[0].bin_id, 3);
        assert_eq!(array.bins[0].amount_y, 1_000_000_000);
    }
}
