//! The cache engine: put/get over a pooled, ordered, indexed entry set.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────────┐
//!   │                          Cache<K, V>                              │
//!   │                                                                   │
//!   │   ┌───────────────────────────────────────────────────────────┐   │
//!   │   │               Arc<parking_lot::Mutex<CacheCore>>          │   │
//!   │   └───────────────────────────────────────────────────────────┘   │
//!   │                               │                                   │
//!   │                               ▼                                   │
//!   │   ┌───────────────────────────────────────────────────────────┐   │
//!   │   │                     CacheCore<K, V>                       │   │
//!   │   │                                                           │   │
//!   │   │   FxHashMap<K, EntryHandle>      (index, 2x slack)        │   │
//!   │   │              │                                            │   │
//!   │   │              ▼                                            │   │
//!   │   │   NodePool<K, V>                 (capacity + 1 slots)     │   │
//!   │   │              ▲                                            │   │
//!   │   │              │ links                                      │   │
//!   │   │   OrderList: head ─► [MRU] ◄──► ... ◄──► [LRU] ◄─ tail    │   │
//!   │   │                                                           │   │
//!   │   │   Clock (shared second ticker)   EngineCounters           │   │
//!   │   └───────────────────────────────────────────────────────────┘   │
//!   └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Components
//!
//! | Component          | Description                                      |
//! |--------------------|--------------------------------------------------|
//! | `CacheCore<K, V>`  | Single-threaded core: pool + index + list        |
//! | `Cache<K, V>`      | Thread-safe wrapper, one coarse mutex            |
//! | `RunStatus`        | Created → Initializing → Running → Stopped/Failed|
//! | `ExpireCallback`   | User hook invoked with reclaimed entry batches   |
//!
//! ## Operation Flow
//!
//! ```text
//!   put(k, v), key absent:
//!     1. acquire entry from pool (free-list pop)
//!     2. link at list front, index k → handle
//!     3. over capacity? unlink tail, drop from index, release to pool
//!
//!   put(k, v), key present:
//!     1. acquire replacement entry
//!     2. splice it into the old entry's list position
//!     3. release old entry, repoint index
//!     4. bump replacement to the front (both policies; see below)
//!
//!   get(k):
//!     miss            → misses += 1, None
//!     expired entry   → overtime += 1, None (entry stays resident)
//!     live hit (LRU)  → hits += 1, refresh deadline, bump to front
//!     live hit (FIFO) → hits += 1, order untouched
//! ```
//!
//! A logically expired entry is soft-deleted only: `get` stops returning it
//! but it keeps its slot until capacity eviction, overwrite, or the sweeper
//! reclaims it.
//!
//! Overwriting an existing key repositions it at the list front under FIFO
//! as well as LRU: an overwrite counts as a fresh insertion for ordering.
//!
//! ## Concurrency Model
//!
//! Every public operation on [`Cache`] takes the one mutex for its whole
//! critical section, so operations are linearizable; ordering between
//! threads is whatever order the lock is granted. The clock cell is read
//! outside the lock on purpose: worst case is a one-second skew in an
//! expiration decision, never corruption.
//!
//! ## Thread Safety
//!
//! - `CacheCore`: **NOT thread-safe**, single-threaded use only
//! - `Cache`: thread-safe via `parking_lot::Mutex`

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::clock::Clock;
use crate::ds::{EntryHandle, NodePool, OrderList};
use crate::error::ConfigError;
use crate::metrics::{EngineCounters, MetricsSnapshot};
use crate::policy::EvictionPolicy;
use crate::sweeper;

/// Callback invoked by the expiration sweeper with each reclaimed batch.
///
/// Runs on the sweeper thread *after* the engine lock has been released, so
/// slow user code never extends the cache's critical section.
pub type ExpireCallback<K, V> = Arc<dyn Fn(&[(K, V)]) + Send + Sync>;

/// Default cap on entries handed to the expiration callback per sweep.
pub const DEFAULT_EXPIRE_BATCH: usize = 10;

/// Engine lifecycle.
///
/// `Created → Initializing → Running → Stopped`, with `Initializing →
/// Failed` on pool allocation failure. No transition leaves `Stopped` or
/// `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Built but not started; configuration is still accepted.
    Created,
    /// Allocating the node pool.
    Initializing,
    /// Serving `put`/`get`.
    Running,
    /// Shut down; the pool has been released.
    Stopped,
    /// Pool allocation failed at start.
    Failed,
}

#[derive(Debug, Clone, Copy)]
struct ExpireConfig {
    ttl_secs: u64,
    batch_size: usize,
}

// ============================================================================
// CacheCore
// ============================================================================

/// Single-threaded cache engine core.
///
/// Owns the node pool, the key index, the ordered list, and the counters.
/// [`Cache`] wraps it in a mutex for concurrent use; embed the core directly
/// only when a single thread owns the cache.
pub struct CacheCore<K, V> {
    status: RunStatus,
    policy: EvictionPolicy,
    capacity: usize,
    track_hits: bool,
    expire: Option<ExpireConfig>,
    clock: Clock,
    pool: NodePool<K, V>,
    index: FxHashMap<K, EntryHandle>,
    list: OrderList,
    counters: EngineCounters,
}

impl<K, V> CacheCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an unstarted core with the process-wide system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `capacity <= 1`; the retire/install window
    /// of the overwrite path needs at least two usable slots.
    pub fn try_new(capacity: usize, policy: EvictionPolicy) -> Result<Self, ConfigError> {
        Self::try_new_with_clock(capacity, policy, Clock::system())
    }

    /// Creates an unstarted core reading time from `clock`.
    ///
    /// Tests inject [`Clock::manual`] here to drive expiration
    /// deterministically.
    pub fn try_new_with_clock(
        capacity: usize,
        policy: EvictionPolicy,
        clock: Clock,
    ) -> Result<Self, ConfigError> {
        if capacity <= 1 {
            return Err(ConfigError::new(format!(
                "cache capacity must be > 1, got {capacity}"
            )));
        }
        Ok(Self {
            status: RunStatus::Created,
            policy,
            capacity,
            track_hits: false,
            expire: None,
            clock,
            pool: NodePool::empty(),
            index: FxHashMap::default(),
            list: OrderList::new(),
            counters: EngineCounters::default(),
        })
    }

    /// Enables per-entry hit counting.
    ///
    /// Silently ignored once the engine has left the `Created` state.
    pub fn enable_hit_count(&mut self) {
        if self.status == RunStatus::Created {
            self.track_hits = true;
        }
    }

    /// Enables TTL expiration with the given deadline and sweep batch size.
    ///
    /// Returns `true` if the configuration was applied. Silently ignored
    /// (returns `false`) once started, or when `ttl` rounds to zero
    /// seconds.
    pub fn enable_expiration(&mut self, ttl: Duration, batch_size: usize) -> bool {
        let ttl_secs = ttl.as_secs();
        if self.status != RunStatus::Created || ttl_secs == 0 {
            return false;
        }
        self.expire = Some(ExpireConfig {
            ttl_secs,
            batch_size: if batch_size == 0 {
                DEFAULT_EXPIRE_BATCH
            } else {
                batch_size
            },
        });
        true
    }

    /// Allocates the node pool and transitions to `Running`.
    ///
    /// Valid only from `Created`; any other state returns `false` without
    /// side effects. Allocation failure transitions to `Failed`.
    pub fn start(&mut self) -> bool {
        if self.status != RunStatus::Created {
            return false;
        }
        self.status = RunStatus::Initializing;
        // capacity + 1 slots: one entry can be retired and its replacement
        // installed without the free list ever running dry.
        match NodePool::try_with_slots(self.capacity + 1) {
            Ok(pool) => {
                self.pool = pool;
                self.index =
                    FxHashMap::with_capacity_and_hasher(self.capacity * 2, Default::default());
                self.status = RunStatus::Running;
                tracing::debug!(capacity = self.capacity, policy = ?self.policy, "cache engine started");
                true
            }
            Err(err) => {
                self.status = RunStatus::Failed;
                tracing::error!(error = %err, "cache engine failed to allocate its node pool");
                false
            }
        }
    }

    /// Releases the pool and transitions `Running → Stopped`.
    ///
    /// No-op in any other state; nothing leaves `Stopped` or `Failed`.
    pub fn stop(&mut self) {
        if self.status != RunStatus::Running {
            return;
        }
        self.status = RunStatus::Stopped;
        self.index.clear();
        self.list.clear();
        self.pool.clear();
        tracing::debug!("cache engine stopped");
    }

    /// Inserts or overwrites a value.
    ///
    /// An absent key claims a pool entry and links it at the front; if that
    /// pushes the cache over capacity the tail entry is retired in the same
    /// call, so `len() <= capacity()` holds on return. A present key gets a
    /// replacement entry spliced into its list position, then bumped to the
    /// front under both policies.
    ///
    /// # Panics
    ///
    /// Panics if the engine is not `Running`; calling `put` before `start`
    /// or after `stop` is an illegal-state condition.
    pub fn put(&mut self, key: K, value: V) {
        self.assert_running("put");
        let now = self.clock.now_secs();
        let expires_at = self.entry_deadline(now);

        if let Some(&old) = self.index.get(&key) {
            let replacement = self.pool.acquire(key.clone(), value, expires_at);
            self.list.splice_replace(&mut self.pool, old, replacement);
            self.index.insert(key, replacement);
            self.pool.release(old);
            // An overwrite counts as a fresh insertion for ordering, under
            // FIFO as well as LRU.
            self.list.bump_to_front(&mut self.pool, replacement);
            self.counters.updates += 1;
        } else {
            let handle = self.pool.acquire(key.clone(), value, expires_at);
            self.policy.on_insert(&mut self.list, &mut self.pool, handle);
            self.index.insert(key, handle);
            self.counters.inserts += 1;
            if self.list.len() > self.capacity {
                self.evict_one();
            }
        }

        #[cfg(debug_assertions)]
        self.debug_validate();
    }

    /// Looks up a value.
    ///
    /// Returns `None` both for absent keys (counted as misses) and for
    /// logically expired entries (counted as overtime; the entry stays
    /// resident until eviction, overwrite, or sweep). A live hit under LRU
    /// refreshes the entry's deadline and recency; under FIFO it changes
    /// nothing.
    ///
    /// # Panics
    ///
    /// Panics if the engine is not `Running`.
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.assert_running("get");
        let now = self.clock.now_secs();

        let handle = match self.index.get(key) {
            Some(&handle) => handle,
            None => {
                self.counters.misses += 1;
                return None;
            }
        };

        let expire_enabled = self.expire.is_some();
        let refreshed_deadline = self.entry_deadline(now);
        let track_hits = self.track_hits;
        let refresh = self.policy.refreshes_deadline_on_access() && expire_enabled;

        let entry = self
            .pool
            .get_mut(handle)
            .expect("index references a recycled entry");
        if track_hits {
            entry.hits += 1;
        }
        if expire_enabled && entry.expires_at <= now {
            self.counters.overtime += 1;
            return None;
        }
        if refresh {
            entry.expires_at = refreshed_deadline;
        }
        let value = entry.value.clone();

        self.counters.hits += 1;
        self.policy.on_access(&mut self.list, &mut self.pool, handle);

        #[cfg(debug_assertions)]
        self.debug_validate();

        Some(value)
    }

    /// Reclaims up to `max` expired entries from the list tail, returning
    /// their keys and values.
    ///
    /// Every deadline refresh moves its entry to the list front, so
    /// deadlines are non-increasing from head to tail and the scan can stop
    /// at the first live entry. Returns an empty batch when the engine is
    /// not `Running` or expiration is not configured.
    pub fn reap_expired(&mut self, max: usize) -> Vec<(K, V)> {
        if self.status != RunStatus::Running || self.expire.is_none() {
            return Vec::new();
        }
        let now = self.clock.now_secs();
        let mut reaped = Vec::new();

        while reaped.len() < max {
            let Some(tail) = self.list.tail() else { break };
            let expired = match self.pool.get(tail) {
                Some(entry) => entry.expires_at <= now,
                None => false,
            };
            if !expired {
                break;
            }
            self.list.evict_tail(&mut self.pool);
            if let Some((key, value)) = self.pool.release(tail) {
                self.index.remove(&key);
                reaped.push((key, value));
            }
            self.counters.expired_reaped += 1;
        }

        #[cfg(debug_assertions)]
        self.debug_validate();

        reaped
    }

    /// Current run status.
    #[inline]
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Configured eviction policy.
    #[inline]
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if no entries are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Configured capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if `key` is resident (live or logically expired).
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Per-entry hit count for a resident key, when hit tracking is on.
    pub fn hit_count(&self, key: &K) -> Option<u64> {
        let handle = *self.index.get(key)?;
        self.pool.get(handle).map(|entry| entry.hit_count())
    }

    /// Snapshot of the engine counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.counters.snapshot(self.list.len(), self.capacity)
    }

    /// Total pool slots ever allocated; diagnostic for the reuse bound.
    #[inline]
    pub fn pool_slots(&self) -> usize {
        self.pool.slot_count()
    }

    fn evict_one(&mut self) {
        if let Some(victim) = self.policy.eviction_victim(&self.list) {
            self.list.unlink(&mut self.pool, victim);
            if let Some((victim_key, _)) = self.pool.release(victim) {
                self.index.remove(&victim_key);
            }
            self.counters.evictions += 1;
        }
    }

    fn entry_deadline(&self, now: u64) -> u64 {
        match &self.expire {
            Some(cfg) => now.saturating_add(cfg.ttl_secs),
            None => u64::MAX,
        }
    }

    fn assert_running(&self, op: &str) {
        assert!(
            self.status == RunStatus::Running,
            "{op} called on a cache engine that is not running (status: {:?})",
            self.status
        );
    }

    #[cfg(any(test, debug_assertions))]
    fn debug_validate(&self) {
        self.list.debug_validate_invariants(&self.pool);
        assert_eq!(self.index.len(), self.list.len());
        assert!(self.list.len() <= self.capacity);
        for (key, &handle) in &self.index {
            let entry = self
                .pool
                .get(handle)
                .expect("index references a recycled entry");
            assert!(entry.key() == key);
        }
    }
}

impl<K, V> CacheCore<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
{
    /// Human-readable snapshot of the index and the ordered list, with a
    /// `[drop]` marker on logically expired entries.
    pub fn dump(&self) -> String {
        use fmt::Write;

        let now = self.clock.now_secs();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "status: {:?}  policy: {:?}  len: {}/{}",
            self.status,
            self.policy,
            self.list.len(),
            self.capacity
        );
        let _ = write!(out, "keys:");
        for key in self.index.keys() {
            let _ = write!(out, " {:?}", key);
        }
        let _ = writeln!(out);
        let _ = write!(out, "list:");
        for (_, entry) in self.list.iter(&self.pool) {
            let marker = if self.expire.is_some() && entry.expires_at() <= now {
                "[drop]"
            } else {
                ""
            };
            let _ = write!(out, " {:?}={:?}{}", entry.key(), entry.value(), marker);
        }
        let _ = writeln!(out);
        out
    }
}

impl<K, V> fmt::Debug for CacheCore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheCore")
            .field("status", &self.status)
            .field("policy", &self.policy)
            .field("len", &self.list.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Cache (thread-safe wrapper)
// ============================================================================

/// Thread-safe cache serializing every operation through one mutex.
///
/// All mutation (caller `put`/`get`, and the sweeper's reap step) runs
/// under the same lock, so operations are linearizable with respect to each
/// other.
///
/// # Example
///
/// ```
/// use slotcache::engine::Cache;
/// use slotcache::policy::EvictionPolicy;
///
/// let cache: Cache<&str, i32> = Cache::new(3, EvictionPolicy::Lru).unwrap();
/// assert!(cache.start());
///
/// cache.put("a", 1);
/// cache.put("b", 2);
/// assert_eq!(cache.get(&"a"), Some(1));
/// assert_eq!(cache.get(&"missing"), None);
/// ```
pub struct Cache<K, V> {
    inner: Arc<Mutex<CacheCore<K, V>>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an unstarted cache with the process-wide system clock.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `capacity <= 1`.
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Result<Self, ConfigError> {
        Self::new_with_clock(capacity, policy, Clock::system())
    }

    /// Creates an unstarted cache reading time from `clock`.
    pub fn new_with_clock(
        capacity: usize,
        policy: EvictionPolicy,
        clock: Clock,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: Arc::new(Mutex::new(CacheCore::try_new_with_clock(
                capacity, policy, clock,
            )?)),
        })
    }

    /// Enables per-entry hit counting; silently ignored after `start`.
    pub fn with_hit_count(&self) -> &Self {
        self.inner.lock().enable_hit_count();
        self
    }

    /// Enables TTL expiration; silently ignored after `start` or for a zero
    /// TTL.
    ///
    /// If `callback` is supplied, a background sweeper thread is spawned.
    /// Once per second, while the engine is `Running`, it reclaims up to
    /// `batch_size` expired entries under the engine lock, then invokes the
    /// callback with the batch *after* releasing the lock. The thread exits
    /// when the engine stops or the cache is dropped. Pass `0` for
    /// `batch_size` to use [`DEFAULT_EXPIRE_BATCH`].
    pub fn with_expire_time(
        &self,
        ttl: Duration,
        callback: Option<ExpireCallback<K, V>>,
        batch_size: usize,
    ) -> &Self
    where
        K: Send + 'static,
        V: Send + 'static,
    {
        let (applied, batch) = {
            let mut core = self.inner.lock();
            let applied = core.enable_expiration(ttl, batch_size);
            let batch = core
                .expire
                .map(|cfg| cfg.batch_size)
                .unwrap_or(DEFAULT_EXPIRE_BATCH);
            (applied, batch)
        };
        if applied {
            if let Some(callback) = callback {
                sweeper::spawn(Arc::downgrade(&self.inner), callback, batch);
            }
        }
        self
    }

    /// Starts the engine; see [`CacheCore::start`].
    pub fn start(&self) -> bool {
        self.inner.lock().start()
    }

    /// Stops the engine and releases the pool; see [`CacheCore::stop`].
    pub fn stop(&self) {
        self.inner.lock().stop()
    }

    /// Inserts or overwrites a value under the engine lock.
    ///
    /// # Panics
    ///
    /// Panics if the engine is not `Running`.
    pub fn put(&self, key: K, value: V) {
        self.inner.lock().put(key, value)
    }

    /// Looks up a value under the engine lock.
    ///
    /// # Panics
    ///
    /// Panics if the engine is not `Running`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key)
    }

    /// Manually reclaims up to `max` expired entries.
    pub fn reap_expired(&self, max: usize) -> Vec<(K, V)> {
        self.inner.lock().reap_expired(max)
    }

    /// Current run status.
    pub fn status(&self) -> RunStatus {
        self.inner.lock().status()
    }

    /// Configured eviction policy.
    pub fn policy(&self) -> EvictionPolicy {
        self.inner.lock().policy()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns `true` if no entries are live.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    /// Returns `true` if `key` is resident (live or logically expired).
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    /// Per-entry hit count for a resident key, when hit tracking is on.
    pub fn hit_count(&self, key: &K) -> Option<u64> {
        self.inner.lock().hit_count(key)
    }

    /// Snapshot of the engine counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.lock().metrics()
    }

    /// Total pool slots ever allocated; diagnostic for the reuse bound.
    pub fn pool_slots(&self) -> usize {
        self.inner.lock().pool_slots()
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug,
    V: Clone + fmt::Debug,
{
    /// Human-readable snapshot; see [`CacheCore::dump`].
    pub fn dump(&self) -> String {
        self.inner.lock().dump()
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.lock();
        f.debug_struct("Cache")
            .field("status", &core.status)
            .field("policy", &core.policy)
            .field("len", &core.list.len())
            .field("capacity", &core.capacity)
            .finish_non_exhaustive()
    }
}
