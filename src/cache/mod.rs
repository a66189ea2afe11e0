//! Hot-path cache: per-venue pool records plus their aggregated
//! tick-list/bin-map reductions, guarded by per-pool locks so CLMM
//! tick-array reaggregation never blocks another pool's simulation.
//!
//! One `DashMap` per cache (keyed by pool pubkey); `parking_lot::Mutex`
//! guards each pool's mutable aggregate state so CLMM tick-array
//! reaggregation never blocks another pool's simulation under
//! contention.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use solana_sdk::pubkey::Pubkey;

#[derive(Debug, Clone)]
pub struct CpAmmFields {
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub base_reserve: u64,
    pub quote_reserve: u64,
    pub slot: u64,
    pub write_version: u64,
    pub dirty: bool,
}

#[derive(Debug, Clone)]
pub struct PumpSwapFields {
    pub cp: CpAmmFields,
    pub lp_fee_bps: u64,
    pub protocol_fee_bps: u64,
}

#[derive(Debug, Clone)]
pub struct RaydiumV4Fields {
    pub cp: CpAmmFields,
    pub fee_numerator: u64,
    pub fee_denominator: u64,
}

#[derive(Debug, Clone)]
pub struct ClmmFields {
    pub token_vault_0: Pubkey,
    pub token_vault_1: Pubkey,
    pub token_mint_0: Pubkey,
    pub token_mint_1: Pubkey,
    pub amm_config: Pubkey,
    pub tick_spacing: u16,
    pub liquidity: u128,
    pub sqrt_price_x64: u128,
    pub tick_current: i32,
    pub fee_rate: u32,
    pub tick_array_keys: Vec<Pubkey>,
    pub slot: u64,
    pub write_version: u64,
}

#[derive(Debug, Clone)]
pub struct DlmmFields {
    pub reserve_x: Pubkey,
    pub reserve_y: Pubkey,
    pub token_x_mint: Pubkey,
    pub token_y_mint: Pubkey,
    pub bin_step: u16,
    pub base_factor: u16,
    pub variable_fee_control: u32,
    pub volatility_accumulator: u32,
    pub protocol_share: u16,
    pub active_id: i32,
    pub bin_array_keys: Vec<Pubkey>,
    pub slot: u64,
    pub write_version: u64,
}

#[derive(Debug, Clone)]
pub enum CachedPool {
    PumpSwap(PumpSwapFields),
    RaydiumV4(RaydiumV4Fields),
    RaydiumClmm(ClmmFields),
    MeteoraDlmm(DlmmFields),
}

impl CachedPool {
    pub fn venue(&self) -> crate::config::Venue {
        use crate::config::Venue;
        match self {
            CachedPool::PumpSwap(_) => Venue::PumpSwap,
            CachedPool::RaydiumV4(_) => Venue::RaydiumV4,
            CachedPool::RaydiumClmm(_) => Venue::RaydiumClmm,
            CachedPool::MeteoraDlmm(_) => Venue::MeteoraDlmm,
        }
    }

    /// Unordered mint pair, sorted so the same pair always hashes the
    /// same way regardless of which side is "base" for this venue.
    pub fn mint_pair(&self) -> (Pubkey, Pubkey) {
        let (a, b) = match self {
            CachedPool::PumpSwap(f) => (f.cp.base_mint, f.cp.quote_mint),
            CachedPool::RaydiumV4(f) => (f.cp.base_mint, f.cp.quote_mint),
            CachedPool::RaydiumClmm(f) => (f.token_mint_0, f.token_mint_1),
            CachedPool::MeteoraDlmm(f) => (f.token_x_mint, f.token_y_mint),
        };
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// Aggregated, de-duplicated tick list for one CLMM pool: `(tick_index,
/// liquidity_net)` pairs, sorted ascending, zero-liquidity ticks dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickList {
    ticks: Vec<(i32, i128)>,
}

impl TickList {
    /// Rebuilds from the full set of currently-held tick arrays, summing
    /// `liquidity_net` across duplicate tick indices defensively.
    pub fn rebuild(sources: impl IntoIterator<Item = (i32, i128)>) -> Self {
        let mut map: BTreeMap<i32, i128> = BTreeMap::new();
        for (tick, liquidity_net) in sources {
            *map.entry(tick).or_insert(0) += liquidity_net;
        }
        let ticks = map.into_iter().filter(|&(_, net)| net != 0).collect();
        Self { ticks }
    }

    pub fn as_slice(&self) -> &[(i32, i128)] {
        &self.ticks
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

/// Aggregated DLMM bin map: `bin_id -> (amount_x, amount_y)` for bins
/// with positive liquidity on at least one side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinMap {
    bins: BTreeMap<i32, (u64, u64)>,
}

impl BinMap {
    /// Rebuilds from the full set of currently-held bin arrays. Bins
    /// from disjoint arrays coexist under their `bin_id`; duplicates
    /// (should arrays overlap) are summed defensively.
    pub fn rebuild(sources: impl IntoIterator<Item = (i32, u64, u64)>) -> Self {
        let mut bins: BTreeMap<i32, (u64, u64)> = BTreeMap::new();
        for (bin_id, x, y) in sources {
            let entry = bins.entry(bin_id).or_insert((0, 0));
            entry.0 += x;
            entry.1 += y;
        }
        bins.retain(|_, &mut (x, y)| x > 0 || y > 0);
        Self { bins }
    }

    pub fn get(&self, bin_id: i32) -> Option<(u64, u64)> {
        self.bins.get(&bin_id).copied()
    }

    pub fn as_map(&self) -> &BTreeMap<i32, (u64, u64)> {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }
}

struct PoolSlot {
    pool: Mutex<CachedPool>,
    tick_list: Mutex<TickList>,
    bin_map: Mutex<BinMap>,
}

pub struct HotPathCache {
    pools: DashMap<Pubkey, Arc<PoolSlot>>,
}

impl HotPathCache {
    pub fn new() -> Self {
        Self {
            pools: DashMap::new(),
        }
    }

    /// Replaces the cached header for `key`, creating the slot if absent.
    /// Leaves any existing tick list / bin map untouched — those refresh
    /// independently on tick-array / bin-array change (§4.7).
    pub fn upsert_pool(&self, key: Pubkey, pool: CachedPool) {
        match self.pools.get(&key) {
            Some(slot) => *slot.pool.lock() = pool,
            None => {
                self.pools.insert(
                    key,
                    Arc::new(PoolSlot {
                        pool: Mutex::new(pool),
                        tick_list: Mutex::new(TickList::default()),
                        bin_map: Mutex::new(BinMap::default()),
                    }),
                );
            }
        }
    }

    pub fn get_pool(&self, key: &Pubkey) -> Option<CachedPool> {
        self.pools.get(key).map(|s| s.pool.lock().clone())
    }

    pub fn rebuild_tick_list(&self, key: &Pubkey, sources: impl IntoIterator<Item = (i32, i128)>) {
        if let Some(slot) = self.pools.get(key) {
            *slot.tick_list.lock() = TickList::rebuild(sources);
        }
    }

    pub fn tick_list(&self, key: &Pubkey) -> Option<TickList> {
        self.pools.get(key).map(|s| s.tick_list.lock().clone())
    }

    pub fn rebuild_bin_map(&self, key: &Pubkey, sources: impl IntoIterator<Item = (i32, u64, u64)>) {
        if let Some(slot) = self.pools.get(key) {
            *slot.bin_map.lock() = BinMap::rebuild(sources);
        }
    }

    pub fn bin_map(&self, key: &Pubkey) -> Option<BinMap> {
        self.pools.get(key).map(|s| s.bin_map.lock().clone())
    }

    pub fn remove(&self, key: &Pubkey) {
        self.pools.remove(key);
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl Default for HotPathCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp_fields() -> CpAmmFields {
        CpAmmFields {
            base_mint: Pubkey::new_unique(),
            quote_mint: Pubkey::new_unique(),
            base_vault: Pubkey::new_unique(),
            quote_vault: Pubkey::new_unique(),
            base_reserve: 1_000_000,
            quote_reserve: 10_000_000,
            slot: 1,
            write_version: 0,
            dirty: false,
        }
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let cache = HotPathCache::new();
        let key = Pubkey::new_unique();
        let pool = CachedPool::PumpSwap(PumpSwapFields {
            cp: cp_fields(),
            lp_fee_bps: 20,
            protocol_fee_bps: 10,
        });
        cache.upsert_pool(key, pool);
        match cache.get_pool(&key).unwrap() {
            CachedPool::PumpSwap(fields) => assert_eq!(fields.lp_fee_bps, 20),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn missing_pool_returns_none() {
        let cache = HotPathCache::new();
        assert!(cache.get_pool(&Pubkey::new_unique()).is_none());
    }

    #[test]
    fn tick_list_dedups_and_drops_zero_liquidity() {
        let list = TickList::rebuild([(10, 500), (10, -500), (20, 100), (-5, 300)]);
        assert_eq!(list.as_slice(), &[(-5, 300), (20, 100)]);
    }

    #[test]
    fn bin_map_sums_duplicates_and_drops_empty_bins() {
        let map = BinMap::rebuild([(0, 100, 0), (0, 0, 50), (1, 0, 0), (-1, 10, 10)]);
        assert_eq!(map.get(0), Some((100, 50)));
        assert_eq!(map.get(1), None);
        assert_eq!(map.get(-1), Some((10, 10)));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn tick_list_rebuild_replaces_prior_aggregate() {
        let cache = HotPathCache::new();
        let key = Pubkey::new_unique();
        cache.upsert_pool(
            key,
            CachedPool::RaydiumClmm(ClmmFields {
                token_vault_0: Pubkey::new_unique(),
                token_vault_1: Pubkey::new_unique(),
                token_mint_0: Pubkey::new_unique(),
                token_mint_1: Pubkey::new_unique(),
                amm_config: Pubkey::new_unique(),
                tick_spacing: 10,
                liquidity: 1_000,
                sqrt_price_x64: 1u128 << 64,
                tick_current: 0,
                fee_rate: 500,
                tick_array_keys: vec![],
                slot: 1,
                write_version: 0,
            }),
        );
        cache.rebuild_tick_list(&key, [(10, 5)]);
        assert_eq!(cache.tick_list(&key).unwrap().len(), 1);
        cache.rebuild_tick_list(&key, [(10, 5), (20, 7)]);
        assert_eq!(cache.tick_list(&key).unwrap().len(), 2);
    }
}
