//! Speculative state: the pending-transaction queue and the speculative
//! delta map, kept strictly separate from the confirmed `store` so a
//! prediction can never flow back into confirmed account state.
//!
//! Eviction uses the same TTL-via-`retain` pattern on both structures:
//! pending transactions age out by wall-clock time, speculative deltas
//! by confirmed slot advance.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
    Expired,
}

#[derive(Debug, Clone)]
pub struct DecodedInstruction {
    pub program_id: Pubkey,
    pub discriminator: [u8; 8],
    pub data: Arc<[u8]>,
    pub account_indices: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct PendingTx {
    pub signature: Signature,
    pub seen_slot: u64,
    pub seen_at: Instant,
    pub raw: Arc<[u8]>,
    pub instructions: Vec<DecodedInstruction>,
    pub reads: HashSet<Pubkey>,
    pub writes: HashSet<Pubkey>,
    pub status: TxStatus,
}

struct Inner {
    txs: HashMap<Signature, PendingTx>,
    confirmed_at: HashMap<Signature, Instant>,
    by_write_key: HashMap<Pubkey, Vec<Signature>>,
}

/// Keyed by signature, with a secondary index from write-account key to
/// signature set (`get_pending_writers_to`).
pub struct PendingTxQueue {
    inner: RwLock<Inner>,
    max_age: Duration,
    max_count: usize,
    confirm_grace: Duration,
}

impl PendingTxQueue {
    pub fn new(max_age: Duration, max_count: usize, confirm_grace: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                txs: HashMap::new(),
                confirmed_at: HashMap::new(),
                by_write_key: HashMap::new(),
            }),
            max_age,
            max_count,
            confirm_grace,
        }
    }

    /// `max_pending_age_ms = 5000`, `max_pending_size = 10000`, as the
    /// default eviction policy: a 5s age bound, a 10000-entry cap.
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_millis(5_000), 10_000, Duration::from_secs(2))
    }

    fn remove_locked(inner: &mut Inner, sig: &Signature) {
        if let Some(tx) = inner.txs.remove(sig) {
            for key in &tx.writes {
                if let Some(sigs) = inner.by_write_key.get_mut(key) {
                    sigs.retain(|s| s != sig);
                    if sigs.is_empty() {
                        inner.by_write_key.remove(key);
                    }
                }
            }
        }
        inner.confirmed_at.remove(sig);
    }

    fn evict_aged(inner: &mut Inner, max_age: Duration, now: Instant) {
        let expired: Vec<Signature> = inner
            .txs
            .values()
            .filter(|t| now.duration_since(t.seen_at) >= max_age)
            .map(|t| t.signature)
            .collect();
        for sig in expired {
            Self::remove_locked(inner, &sig);
        }
    }

    /// Evicts aged-out entries, evicts the oldest if at capacity, then
    /// inserts and indexes `tx`.
    pub fn add(&self, tx: PendingTx) {
        let mut inner = self.inner.write();
        let now = Instant::now();
        Self::evict_aged(&mut inner, self.max_age, now);

        if inner.txs.len() >= self.max_count {
            if let Some(oldest) = inner.txs.values().min_by_key(|t| t.seen_at).map(|t| t.signature) {
                Self::remove_locked(&mut inner, &oldest);
            }
        }

        for key in &tx.writes {
            inner.by_write_key.entry(*key).or_default().push(tx.signature);
        }
        inner.txs.insert(tx.signature, tx);
    }

    /// Marks `sig` confirmed; it is retained for `confirm_grace` (for
    /// dedup) and then dropped by `sweep_confirmed`.
    pub fn confirm(&self, sig: &Signature) {
        let mut inner = self.inner.write();
        if let Some(tx) = inner.txs.get_mut(sig) {
            tx.status = TxStatus::Confirmed;
        }
        inner.confirmed_at.insert(*sig, Instant::now());
    }

    /// Removes `sig` immediately.
    pub fn fail(&self, sig: &Signature) {
        let mut inner = self.inner.write();
        Self::remove_locked(&mut inner, sig);
    }

    /// Drops confirmed entries whose grace period has elapsed. Has no
    /// internal timer; callers invoke this periodically.
    pub fn sweep_confirmed(&self) {
        let mut inner = self.inner.write();
        let now = Instant::now();
        let grace = self.confirm_grace;
        let due: Vec<Signature> = inner
            .confirmed_at
            .iter()
            .filter(|(_, at)| now.duration_since(**at) >= grace)
            .map(|(sig, _)| *sig)
            .collect();
        for sig in due {
            Self::remove_locked(&mut inner, &sig);
        }
    }

    /// Pending transactions that write `key`, sorted by seen-time ascending.
    pub fn get_pending_writers_to(&self, key: &Pubkey) -> Vec<PendingTx> {
        let inner = self.inner.read();
        let mut txs: Vec<PendingTx> = inner
            .by_write_key
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(|sig| inner.txs.get(sig).cloned())
            .collect();
        txs.sort_by_key(|t| t.seen_at);
        txs
    }

    pub fn len(&self) -> usize {
        self.inner.read().txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().txs.is_empty()
    }
}

/// A predicted diff against confirmed state, tagged with its source
/// pending transaction and an expiry slot. Never enters `store`.
#[derive(Debug, Clone)]
pub struct SpeculativeDelta {
    pub source_signature: Signature,
    pub account_data: HashMap<Pubkey, Arc<[u8]>>,
    pub mint_deltas: HashMap<Pubkey, i128>,
    pub confidence: f64,
    pub expiry_slot: u64,
}

/// Keyed by source signature. Callers are responsible for removing a
/// transaction's delta alongside `PendingTxQueue::confirm`/`fail`, since
/// the two maps are kept independent by construction.
pub struct SpeculativeDeltaMap {
    deltas: RwLock<HashMap<Signature, SpeculativeDelta>>,
}

impl SpeculativeDeltaMap {
    pub fn new() -> Self {
        Self {
            deltas: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, delta: SpeculativeDelta) {
        self.deltas.write().insert(delta.source_signature, delta);
    }

    pub fn remove(&self, sig: &Signature) -> Option<SpeculativeDelta> {
        self.deltas.write().remove(sig)
    }

    pub fn get(&self, sig: &Signature) -> Option<SpeculativeDelta> {
        self.deltas.read().get(sig).cloned()
    }

    /// Evicts every delta with `expiry_slot <= slot`.
    pub fn set_confirmed_slot(&self, slot: u64) {
        self.deltas.write().retain(|_, d| d.expiry_slot > slot);
    }

    pub fn len(&self) -> usize {
        self.deltas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.read().is_empty()
    }
}

impl Default for SpeculativeDeltaMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn tx(writes: impl IntoIterator<Item = Pubkey>) -> PendingTx {
        PendingTx {
            signature: Signature::new_unique(),
            seen_slot: 1,
            seen_at: Instant::now(),
            raw: Arc::from(vec![]),
            instructions: vec![],
            reads: HashSet::new(),
            writes: writes.into_iter().collect(),
            status: TxStatus::Pending,
        }
    }

    #[test]
    fn add_and_lookup_by_write_key() {
        let queue = PendingTxQueue::new(Duration::from_secs(5), 10, Duration::from_secs(2));
        let key = Pubkey::new_unique();
        let t = tx([key]);
        let sig = t.signature;
        queue.add(t);
        let writers = queue.get_pending_writers_to(&key);
        assert_eq!(writers.len(), 1);
        assert_eq!(writers[0].signature, sig);
    }

    #[test]
    fn aged_out_entries_are_evicted_on_next_add() {
        let queue = PendingTxQueue::new(Duration::from_millis(5), 10, Duration::from_secs(2));
        let key = Pubkey::new_unique();
        queue.add(tx([key]));
        sleep(Duration::from_millis(20));
        queue.add(tx([Pubkey::new_unique()]));
        assert_eq!(queue.get_pending_writers_to(&key).len(), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let queue = PendingTxQueue::new(Duration::from_secs(5), 1, Duration::from_secs(2));
        let first = tx([Pubkey::new_unique()]);
        let first_sig = first.signature;
        queue.add(first);
        sleep(Duration::from_millis(2));
        queue.add(tx([Pubkey::new_unique()]));
        assert_eq!(queue.len(), 1);
        assert!(queue.inner.read().txs.get(&first_sig).is_none());
    }

    #[test]
    fn fail_removes_immediately() {
        let queue = PendingTxQueue::new(Duration::from_secs(5), 10, Duration::from_secs(2));
        let key = Pubkey::new_unique();
        let t = tx([key]);
        let sig = t.signature;
        queue.add(t);
        queue.fail(&sig);
        assert_eq!(queue.len(), 0);
        assert!(queue.get_pending_writers_to(&key).is_empty());
    }

    #[test]
    fn confirm_then_sweep_removes_after_grace() {
        let queue = PendingTxQueue::new(Duration::from_secs(5), 10, Duration::from_millis(5));
        let t = tx([Pubkey::new_unique()]);
        let sig = t.signature;
        queue.add(t);
        queue.confirm(&sig);
        assert_eq!(queue.len(), 1);
        sleep(Duration::from_millis(20));
        queue.sweep_confirmed();
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn writers_are_sorted_by_seen_time_ascending() {
        let queue = PendingTxQueue::new(Duration::from_secs(5), 10, Duration::from_secs(2));
        let key = Pubkey::new_unique();
        let first = tx([key]);
        let first_sig = first.signature;
        queue.add(first);
        sleep(Duration::from_millis(2));
        let second = tx([key]);
        let second_sig = second.signature;
        queue.add(second);

        let writers = queue.get_pending_writers_to(&key);
        assert_eq!(writers[0].signature, first_sig);
        assert_eq!(writers[1].signature, second_sig);
    }

    #[test]
    fn delta_map_evicts_on_confirmed_slot_advance() {
        let map = SpeculativeDeltaMap::new();
        let sig = Signature::new_unique();
        map.insert(SpeculativeDelta {
            source_signature: sig,
            account_data: HashMap::new(),
            mint_deltas: HashMap::new(),
            confidence: 0.9,
            expiry_slot: 105,
        });
        map.set_confirmed_slot(104);
        assert!(map.get(&sig).is_some());
        map.set_confirmed_slot(105);
        assert!(map.get(&sig).is_none());
    }
}
