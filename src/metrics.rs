//! Engine counters and their read-only snapshot.
//!
//! All counters are plain integers mutated under the engine lock; a snapshot
//! copies them out so callers can inspect hit/miss/overtime behavior without
//! holding the lock.

/// Mutable counters owned by the engine core.
#[derive(Debug, Default, Clone)]
pub(crate) struct EngineCounters {
    pub(crate) hits: u64,
    pub(crate) misses: u64,
    pub(crate) overtime: u64,
    pub(crate) inserts: u64,
    pub(crate) updates: u64,
    pub(crate) evictions: u64,
    pub(crate) expired_reaped: u64,
}

impl EngineCounters {
    pub(crate) fn snapshot(&self, len: usize, capacity: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits,
            misses: self.misses,
            overtime: self.overtime,
            inserts: self.inserts,
            updates: self.updates,
            evictions: self.evictions,
            expired_reaped: self.expired_reaped,
            len,
            capacity,
        }
    }
}

/// Point-in-time copy of the engine counters.
///
/// `misses` and `overtime` are disjoint: a lookup of an absent key counts as
/// a miss, a lookup that finds a logically expired entry counts as overtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Lookups that returned a live value.
    pub hits: u64,
    /// Lookups of keys not present at all.
    pub misses: u64,
    /// Lookups that found an entry past its expiration deadline.
    pub overtime: u64,
    /// New-key insertions.
    pub inserts: u64,
    /// Duplicate-key overwrites.
    pub updates: u64,
    /// Entries retired by capacity pressure.
    pub evictions: u64,
    /// Entries reclaimed by the expiration sweeper.
    pub expired_reaped: u64,
    /// Live entries at snapshot time.
    pub len: usize,
    /// Configured capacity.
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_copies_every_counter() {
        let mut counters = EngineCounters::default();
        counters.hits = 3;
        counters.misses = 2;
        counters.overtime = 1;
        counters.inserts = 7;
        counters.updates = 4;
        counters.evictions = 5;
        counters.expired_reaped = 6;

        let snap = counters.snapshot(9, 16);
        assert_eq!(snap.hits, 3);
        assert_eq!(snap.misses, 2);
        assert_eq!(snap.overtime, 1);
        assert_eq!(snap.inserts, 7);
        assert_eq!(snap.updates, 4);
        assert_eq!(snap.evictions, 5);
        assert_eq!(snap.expired_reaped, 6);
        assert_eq!(snap.len, 9);
        assert_eq!(snap.capacity, 16);
    }
}
