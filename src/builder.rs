//! Fluent construction for [`Cache`] instances.
//!
//! Collects capacity, policy, clock, and instrumentation options, validates
//! them once, and hands back a configured cache still in the `Created`
//! state; call [`Cache::start`] before the first `put`/`get`.
//!
//! ## Example
//!
//! ```rust
//! use slotcache::builder::CacheBuilder;
//! use slotcache::policy::EvictionPolicy;
//!
//! let cache = CacheBuilder::<u64, String>::new(100)
//!     .policy(EvictionPolicy::Lru)
//!     .hit_counting()
//!     .try_build()
//!     .unwrap();
//! assert!(cache.start());
//! cache.put(1, "hello".to_string());
//! assert_eq!(cache.get(&1), Some("hello".to_string()));
//! ```

use std::hash::Hash;
use std::time::Duration;

use crate::clock::Clock;
use crate::engine::{Cache, ExpireCallback, DEFAULT_EXPIRE_BATCH};
use crate::error::ConfigError;
use crate::policy::EvictionPolicy;

struct ExpireSettings<K, V> {
    ttl: Duration,
    callback: Option<ExpireCallback<K, V>>,
    batch_size: usize,
}

/// Builder for [`Cache`] instances.
pub struct CacheBuilder<K, V> {
    capacity: usize,
    policy: EvictionPolicy,
    clock: Option<Clock>,
    hit_counting: bool,
    expire: Option<ExpireSettings<K, V>>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Creates a builder for a cache of at most `capacity` entries.
    ///
    /// The policy defaults to LRU.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            policy: EvictionPolicy::Lru,
            clock: None,
            hit_counting: false,
            expire: None,
        }
    }

    /// Selects the eviction discipline.
    pub fn policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reads time from `clock` instead of the process-wide ticker.
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Enables per-entry hit counting.
    pub fn hit_counting(mut self) -> Self {
        self.hit_counting = true;
        self
    }

    /// Enables TTL expiration with the default sweep batch size.
    pub fn expire_after(mut self, ttl: Duration) -> Self {
        let settings = self.expire.get_or_insert(ExpireSettings {
            ttl,
            callback: None,
            batch_size: DEFAULT_EXPIRE_BATCH,
        });
        settings.ttl = ttl;
        self
    }

    /// Registers a reclamation callback; spawns the sweeper at build time.
    ///
    /// Only meaningful together with [`CacheBuilder::expire_after`].
    pub fn expire_callback(mut self, callback: impl Fn(&[(K, V)]) + Send + Sync + 'static) -> Self {
        let settings = self.expire.get_or_insert(ExpireSettings {
            ttl: Duration::ZERO,
            callback: None,
            batch_size: DEFAULT_EXPIRE_BATCH,
        });
        settings.callback = Some(std::sync::Arc::new(callback));
        self
    }

    /// Caps the entries handed to the callback per sweep.
    pub fn expire_batch_size(mut self, batch_size: usize) -> Self {
        if let Some(settings) = self.expire.as_mut() {
            settings.batch_size = batch_size;
        }
        self
    }

    /// Validates the configuration and builds an unstarted [`Cache`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the capacity is not greater than 1, or if
    /// a TTL was configured that rounds down to zero seconds.
    pub fn try_build(self) -> Result<Cache<K, V>, ConfigError> {
        let clock = self.clock.unwrap_or_default();
        let cache = Cache::new_with_clock(self.capacity, self.policy, clock)?;
        if self.hit_counting {
            cache.with_hit_count();
        }
        if let Some(settings) = self.expire {
            if settings.ttl.as_secs() == 0 {
                return Err(ConfigError::new(
                    "expiration TTL must be at least one second",
                ));
            }
            cache.with_expire_time(settings.ttl, settings.callback, settings.batch_size);
        }
        Ok(cache)
    }
}
