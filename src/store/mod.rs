//! Confirmed account state: a version-ordered, single-writer/many-reader
//! map keyed by account pubkey.
//!
//! Backed by `dashmap::DashMap<Pubkey, Arc<AccountRecord>>`, generalizing
//! the single-key lookup caches in `utils::pool_tracker`/
//! `utils::token_tracker` into the version-ordered store the detector
//! needs. Each record is published as a whole new `Arc`, so readers
//! never observe a torn update.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use solana_sdk::pubkey::Pubkey;

/// One confirmed account, as last observed from the block feed.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub data: Arc<[u8]>,
    pub owner: Pubkey,
    pub lamports: u64,
    pub slot: u64,
    pub write_version: u64,
    pub executable: bool,
    pub rent_epoch: u64,
    pub deleted: bool,
}

impl AccountRecord {
    fn version(&self) -> (u64, u64) {
        (self.slot, self.write_version)
    }
}

/// One inbound confirmed account update, as delivered by the block feed.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub pubkey: Pubkey,
    pub owner: Pubkey,
    pub data: Arc<[u8]>,
    pub lamports: u64,
    pub executable: bool,
    pub rent_epoch: u64,
    pub slot: u64,
    pub write_version: u64,
}

/// A value-semantic capture of requested keys, buffers shared by reference.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub records: Vec<(Pubkey, Option<Arc<AccountRecord>>)>,
    pub max_slot: u64,
}

/// Decode-drop and stale-write counters, so ingestion failures are
/// observable without forcing a log line on every drop.
#[derive(Default)]
pub struct StoreMetrics {
    pub applied: AtomicU64,
    pub stale_dropped: AtomicU64,
}

pub struct AccountStore {
    accounts: DashMap<Pubkey, Arc<AccountRecord>>,
    interest: Option<DashMap<Pubkey, ()>>,
    pub metrics: StoreMetrics,
}

impl AccountStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            interest: None,
            metrics: StoreMetrics::default(),
        }
    }

    /// Only keys present in `keys` are ever stored; `apply` for any other
    /// key is a no-op. Used to bound memory when only a subset of
    /// tracked pools/vaults is relevant.
    pub fn with_interest_set<I: IntoIterator<Item = Pubkey>>(keys: I) -> Self {
        let interest = DashMap::new();
        for key in keys {
            interest.insert(key, ());
        }
        Self {
            accounts: DashMap::new(),
            interest: Some(interest),
            metrics: StoreMetrics::default(),
        }
    }

    pub fn track(&self, key: Pubkey) {
        if let Some(interest) = &self.interest {
            interest.insert(key, ());
        }
    }

    /// Applies an update if it is newer than the stored record for its
    /// key. Returns `true` if the store was mutated.
    pub fn apply(&self, update: AccountUpdate) -> bool {
        if let Some(interest) = &self.interest {
            if !interest.contains_key(&update.pubkey) {
                return false;
            }
        }

        let deleted = update.lamports == 0 || update.data.is_empty();
        let record = Arc::new(AccountRecord {
            data: update.data,
            owner: update.owner,
            lamports: update.lamports,
            slot: update.slot,
            write_version: update.write_version,
            executable: update.executable,
            rent_epoch: update.rent_epoch,
            deleted,
        });
        let new_version = record.version();

        let mut applied = false;
        self.accounts
            .entry(update.pubkey)
            .and_modify(|existing| {
                if new_version > existing.version() {
                    *existing = Arc::clone(&record);
                    applied = true;
                }
            })
            .or_insert_with(|| {
                applied = true;
                record
            });

        if applied {
            self.metrics.applied.fetch_add(1, Ordering::Relaxed);
        } else {
            log::debug!(
                "dropping stale update for {} at (slot {}, write_version {})",
                update.pubkey, new_version.0, new_version.1
            );
            self.metrics.stale_dropped.fetch_add(1, Ordering::Relaxed);
        }
        applied
    }

    pub fn get(&self, key: &Pubkey) -> Option<Arc<AccountRecord>> {
        self.accounts.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Just the data buffer, for allocation-free hot-path reads.
    pub fn get_data(&self, key: &Pubkey) -> Option<Arc<[u8]>> {
        self.accounts.get(key).map(|r| Arc::clone(&r.value().data))
    }

    pub fn snapshot<I: IntoIterator<Item = Pubkey>>(&self, keys: I) -> Snapshot {
        let mut records = Vec::new();
        let mut max_slot = 0u64;
        for key in keys {
            let record = self.get(&key);
            if let Some(r) = &record {
                max_slot = max_slot.max(r.slot);
            }
            records.push((key, record));
        }
        Snapshot { records, max_slot }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(pubkey: Pubkey, slot: u64, write_version: u64, lamports: u64) -> AccountUpdate {
        AccountUpdate {
            pubkey,
            owner: Pubkey::new_unique(),
            data: Arc::from(vec![1u8, 2, 3]),
            lamports,
            executable: false,
            rent_epoch: 0,
            slot,
            write_version,
        }
    }

    #[test]
    fn newer_version_replaces_older() {
        let store = AccountStore::new();
        let key = Pubkey::new_unique();
        assert!(store.apply(update(key, 10, 0, 100)));
        assert!(store.apply(update(key, 10, 1, 200)));
        assert_eq!(store.get(&key).unwrap().lamports, 200);
    }

    #[test]
    fn stale_version_is_dropped() {
        let store = AccountStore::new();
        let key = Pubkey::new_unique();
        assert!(store.apply(update(key, 10, 5, 100)));
        assert!(!store.apply(update(key, 10, 3, 999)));
        assert!(!store.apply(update(key, 9, 999, 999)));
        assert_eq!(store.get(&key).unwrap().lamports, 100);
        assert_eq!(store.metrics.stale_dropped.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn reapplying_same_update_is_a_noop() {
        let store = AccountStore::new();
        let key = Pubkey::new_unique();
        let u = update(key, 10, 0, 100);
        assert!(store.apply(u.clone()));
        assert!(!store.apply(u));
    }

    #[test]
    fn zero_lamports_is_a_tombstone() {
        let store = AccountStore::new();
        let key = Pubkey::new_unique();
        store.apply(update(key, 1, 0, 0));
        assert!(store.get(&key).unwrap().deleted);
    }

    #[test]
    fn interest_set_drops_untracked_keys() {
        let tracked = Pubkey::new_unique();
        let untracked = Pubkey::new_unique();
        let store = AccountStore::with_interest_set([tracked]);
        assert!(store.apply(update(tracked, 1, 0, 100)));
        assert!(!store.apply(update(untracked, 1, 0, 100)));
        assert!(store.get(&untracked).is_none());
    }

    #[test]
    fn snapshot_reports_max_slot_across_keys() {
        let store = AccountStore::new();
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        store.apply(update(a, 5, 0, 1));
        store.apply(update(b, 9, 0, 1));
        let snap = store.snapshot([a, b]);
        assert_eq!(snap.max_slot, 9);
        assert_eq!(snap.records.len(), 2);
    }
}
