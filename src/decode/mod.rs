//! Raw account-byte decoders.
//!
//! Every decoder here performs a length check, a discriminator check
//! where the layout has one, and field extraction at fixed byte
//! offsets. None of them allocate beyond the record they return, and
//! all of them borrow the input buffer for the duration of the call —
//! the hot-path cache (`crate::cache`) owns the decoded, allocated
//! copies that live beyond a single refresh.

pub mod meteora_dlmm;
pub mod pumpswap;
pub mod raydium_clmm;
pub mod raydium_v4;
pub mod token;

/// 8-byte account-type discriminators, taken from the first 8 bytes of
/// the account payload where the owning program uses Anchor-style
/// discriminators.
pub mod discriminator {
    pub const RAYDIUM_CLMM_POOL: [u8; 8] = [0xf7, 0xed, 0xe3, 0xf5, 0xd7, 0xc3, 0xde, 0x46];
    pub const RAYDIUM_CLMM_AMM_CONFIG: [u8; 8] = [0xda, 0xf4, 0x21, 0x68, 0xcb, 0xcb, 0x2b, 0x6f];
    pub const RAYDIUM_CLMM_TICK_ARRAY: [u8; 8] = [0xc0, 0x9b, 0x55, 0xcd, 0x31, 0xf9, 0x81, 0x2a];
    pub const METEORA_DLMM_LB_PAIR: [u8; 8] = [0x21, 0x0b, 0x31, 0x62, 0xb5, 0x65, 0xb1, 0x0d];
    pub const METEORA_DLMM_BIN_ARRAY: [u8; 8] = [0x5c, 0x8e, 0x5c, 0xdc, 0x05, 0x94, 0x46, 0xb5];
    pub const PUMPSWAP_POOL: [u8; 8] = [0xf1, 0x9a, 0x6d, 0x04, 0x11, 0xb1, 0x6d, 0xbc];
}

/// Account sizes (bytes), from the venue program layouts.
pub mod size {
    pub const RAYDIUM_V4_POOL: usize = 752;
    pub const RAYDIUM_CLMM_POOL: usize = 1544;
    pub const RAYDIUM_CLMM_AMM_CONFIG: usize = 117;
    pub const RAYDIUM_CLMM_TICK_ARRAY_HEADER: usize = 44;
    pub const RAYDIUM_CLMM_TICKS_PER_ARRAY: usize = 60;
    pub const RAYDIUM_CLMM_TICK_ENTRY: usize = 170;
    /// 8-byte discriminator + header + 60 tick entries. The on-chain
    /// layout is documented elsewhere as "~10 240 bytes"; this is the
    /// exact figure the decoder's bounds checks are derived from.
    pub const RAYDIUM_CLMM_TICK_ARRAY: usize =
        8 + RAYDIUM_CLMM_TICK_ARRAY_HEADER + RAYDIUM_CLMM_TICKS_PER_ARRAY * RAYDIUM_CLMM_TICK_ENTRY;
    pub const PUMPSWAP_POOL: usize = 211;
    pub const METEORA_DLMM_LB_PAIR: usize = 904;
    pub const METEORA_DLMM_BIN_ARRAY_HEADER: usize = 56;
    pub const METEORA_DLMM_BINS_PER_ARRAY: usize = 70;
    pub const METEORA_DLMM_BIN_ENTRY: usize = 144;
}

fn check_len(data: &[u8], expected: usize) -> Result<(), crate::error::DecodeError> {
    if data.len() < expected {
        return Err(crate::error::DecodeError::WrongLength {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

fn check_discriminator(
    data: &[u8],
    expected: [u8; 8],
) -> Result<(), crate::error::DecodeError> {
    check_len(data, 8)?;
    let mut actual = [0u8; 8];
    actual.copy_from_slice(&data[0..8]);
    if actual != expected {
        return Err(crate::error::DecodeError::BadDiscriminator(actual));
    }
    Ok(())
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(data[offset..offset + 8].try_into().unwrap())
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
}

fn read_i32(data: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(data[offset..offset + 2].try_into().unwrap())
}

fn read_u128(data: &[u8], offset: usize) -> u128 {
    u128::from_le_bytes(data[offset..offset + 16].try_into().unwrap())
}

fn read_i128(data: &[u8], offset: usize) -> i128 {
    i128::from_le_bytes(data[offset..offset + 16].try_into().unwrap())
}

fn read_pubkey(data: &[u8], offset: usize) -> solana_sdk::pubkey::Pubkey {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&data[offset..offset + 32]);
    solana_sdk::pubkey::Pubkey::new_from_array(bytes)
}
