//! SPL token-account and mint-extension decoding.

use crate::decode::{check_len, read_u64};
use crate::error::DecodeError;

const TOKEN_ACCOUNT_LEN: usize = 165;
const TOKEN_ACCOUNT_AMOUNT_OFFSET: usize = 64;

/// Read the little-endian u64 token amount at offset 64 of a 165-byte
/// SPL-token-account payload.
pub fn read_token_account_amount(data: &[u8]) -> Result<u64, DecodeError> {
    check_len(data, TOKEN_ACCOUNT_LEN)?;
    Ok(read_u64(data, TOKEN_ACCOUNT_AMOUNT_OFFSET))
}

const MINT_BASE_LEN: usize = 82;
const TLV_TRANSFER_FEE_TYPE: u16 = 1;
const TLV_TRANSFER_FEE_LEN: usize = 108;
const TLV_PADDING_TYPE: u16 = 0;
const TLV_PADDING_LEN: usize = 256;
const TLV_HEADER_LEN: usize = 4; // 2-byte type + 2-byte length
const OLDER_BPS_OFFSET: usize = 88;
const NEWER_BPS_OFFSET: usize = 106;

/// Detect a Token-2022 `TransferFeeConfig` extension on a mint payload
/// and return the currently active fee in basis points.
///
/// Scans byte-by-byte from offset 82 rather than sequentially walking
/// TLV records, because padding TLVs of type 0 with a declared length
/// of 256 bytes appear in practice and would desynchronize a strict
/// sequential walk. Returns `None` if no transfer-fee TLV is found.
pub fn transfer_fee_bps(mint_data: &[u8]) -> Option<u16> {
    if mint_data.len() <= MINT_BASE_LEN {
        return None;
    }

    let mut offset = MINT_BASE_LEN;
    while offset + TLV_HEADER_LEN <= mint_data.len() {
        let tlv_type = u16::from_le_bytes(mint_data[offset..offset + 2].try_into().unwrap());
        let tlv_len =
            u16::from_le_bytes(mint_data[offset + 2..offset + 4].try_into().unwrap()) as usize;

        if tlv_type == TLV_TRANSFER_FEE_TYPE && tlv_len == TLV_TRANSFER_FEE_LEN {
            let body_start = offset + TLV_HEADER_LEN;
            let body_end = body_start + TLV_TRANSFER_FEE_LEN;
            if body_end > mint_data.len() {
                return None;
            }
            let older_bps = u16::from_le_bytes(
                mint_data[body_start + OLDER_BPS_OFFSET..body_start + OLDER_BPS_OFFSET + 2]
                    .try_into()
                    .unwrap(),
            );
            let newer_bps = u16::from_le_bytes(
                mint_data[body_start + NEWER_BPS_OFFSET..body_start + NEWER_BPS_OFFSET + 2]
                    .try_into()
                    .unwrap(),
            );
            return Some(older_bps.max(newer_bps));
        }

        if tlv_type == TLV_PADDING_TYPE && tlv_len == TLV_PADDING_LEN {
            offset += 1;
            continue;
        }

        offset += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_amount_at_offset_64() {
        let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
        data[64..72].copy_from_slice(&1_234_567_890u64.to_le_bytes());
        assert_eq!(read_token_account_amount(&data).unwrap(), 1_234_567_890);
    }

    #[test]
    fn rejects_short_token_account() {
        let data = vec![0u8; 100];
        assert!(matches!(
            read_token_account_amount(&data),
            Err(DecodeError::WrongLength { .. })
        ));
    }

    #[test]
    fn no_tlv_means_no_fee() {
        let data = vec![0u8; MINT_BASE_LEN + 4];
        assert_eq!(transfer_fee_bps(&data), None);
    }

    #[test]
    fn finds_transfer_fee_tlv_and_picks_larger_bps() {
        let mut data = vec![0u8; MINT_BASE_LEN];
        let mut tlv = vec![0u8; TLV_HEADER_LEN + TLV_TRANSFER_FEE_LEN];
        tlv[0..2].copy_from_slice(&TLV_TRANSFER_FEE_TYPE.to_le_bytes());
        tlv[2..4].copy_from_slice(&(TLV_TRANSFER_FEE_LEN as u16).to_le_bytes());
        let body_start = TLV_HEADER_LEN;
        tlv[body_start + OLDER_BPS_OFFSET..body_start + OLDER_BPS_OFFSET + 2]
            .copy_from_slice(&50u16.to_le_bytes());
        tlv[body_start + NEWER_BPS_OFFSET..body_start + NEWER_BPS_OFFSET + 2]
            .copy_from_slice(&75u16.to_le_bytes());
        data.extend_from_slice(&tlv);

        assert_eq!(transfer_fee_bps(&data), Some(75));
    }

    #[test]
    fn padding_tlv_does_not_desync_scan() {
        let mut data = vec![0u8; MINT_BASE_LEN];
        // a padding TLV with declared length 256 placed first
        let mut padding_header = vec![0u8; TLV_HEADER_LEN];
        padding_header[2..4].copy_from_slice(&(TLV_PADDING_LEN as u16).to_le_bytes());
        data.extend_from_slice(&padding_header);

        let mut tlv = vec![0u8; TLV_HEADER_LEN + TLV_TRANSFER_FEE_LEN];
        tlv[0..2].copy_from_slice(&TLV_TRANSFER_FEE_TYPE.to_le_bytes());
        tlv[2..4].copy_from_slice(&(TLV_TRANSFER_FEE_LEN as u16).to_le_bytes());
        let body_start = TLV_HEADER_LEN;
        tlv[body_start + NEWER_BPS_OFFSET..body_start + NEWER_BPS_OFFSET + 2]
            .copy_from_slice(&42u16.to_le_bytes());
        data.extend_from_slice(&tlv);

        assert_eq!(transfer_fee_bps(&data), Some(42));
    }
}
