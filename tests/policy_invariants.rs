// ==============================================
// POLICY INVARIANT TESTS (integration)
// ==============================================
//
// End-to-end checks of the cache's observable contract: capacity bound,
// LRU/FIFO eviction order, logical expiration vs. miss accounting, pool
// reuse, and the duplicate-key overwrite behavior.

use std::time::Duration;

use slotcache::builder::CacheBuilder;
use slotcache::clock::Clock;
use slotcache::engine::Cache;
use slotcache::policy::EvictionPolicy;

fn started(capacity: usize, policy: EvictionPolicy) -> Cache<u64, u64> {
    let cache = Cache::new(capacity, policy).expect("config");
    assert!(cache.start());
    cache
}

// ==============================================
// Capacity bound
// ==============================================

mod capacity_bound {
    use super::*;

    #[test]
    fn size_never_exceeds_capacity_under_distinct_puts() {
        for policy in [EvictionPolicy::Lru, EvictionPolicy::Fifo] {
            let capacity = 8;
            let cache = started(capacity, policy);

            for key in 0..100u64 {
                cache.put(key, key * 10);
                assert!(cache.len() <= capacity);

                // index size and list length move together
                let snap = cache.metrics();
                assert_eq!(snap.len, cache.len());
                assert_eq!(snap.inserts - snap.evictions, cache.len() as u64);
            }
            assert_eq!(cache.len(), capacity);
        }
    }
}

// ==============================================
// Eviction order
// ==============================================

mod eviction_order {
    use super::*;

    #[test]
    fn lru_evicts_least_recently_used() {
        let cache = started(3, EvictionPolicy::Lru);
        cache.put(1, 1); // a
        cache.put(2, 2); // b
        cache.put(3, 3); // c
        assert_eq!(cache.get(&1), Some(1)); // touch a
        cache.put(4, 4); // d evicts b

        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some(1));
        assert_eq!(cache.get(&3), Some(3));
        assert_eq!(cache.get(&4), Some(4));

        let snap = cache.metrics();
        assert_eq!(snap.evictions, 1);
        assert_eq!(snap.misses, 1);
    }

    #[test]
    fn fifo_evicts_oldest_insert_regardless_of_access() {
        let cache = started(3, EvictionPolicy::Fifo);
        cache.put(1, 1);
        cache.put(2, 2);
        cache.put(3, 3);
        assert_eq!(cache.get(&1), Some(1)); // does not reorder
        cache.put(4, 4); // evicts key 1, the oldest insert

        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(2));
        assert_eq!(cache.get(&3), Some(3));
        assert_eq!(cache.get(&4), Some(4));
    }
}

// ==============================================
// Expiration vs. miss
// ==============================================

mod expiration {
    use super::*;

    #[test]
    fn expired_entry_counts_overtime_and_stays_resident() {
        let clock = Clock::manual(1_000);
        let cache = CacheBuilder::<u64, u64>::new(4)
            .clock(clock.clone())
            .expire_after(Duration::from_secs(1))
            .try_build()
            .expect("config");
        assert!(cache.start());

        cache.put(7, 70);
        clock.advance(2);

        assert_eq!(cache.get(&7), None);
        let snap = cache.metrics();
        assert_eq!(snap.overtime, 1);
        assert_eq!(snap.misses, 0);

        // logically expired, physically resident
        assert!(cache.contains(&7));
        assert_eq!(cache.len(), 1);

        // overwrite reclaims the expired entry in place
        cache.put(7, 71);
        assert_eq!(cache.get(&7), Some(71));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn manual_reap_removes_expired_entries() {
        let clock = Clock::manual(1_000);
        let cache = CacheBuilder::<u64, u64>::new(8)
            .policy(EvictionPolicy::Fifo)
            .clock(clock.clone())
            .expire_after(Duration::from_secs(1))
            .try_build()
            .expect("config");
        assert!(cache.start());

        for key in 0..4 {
            cache.put(key, key);
        }
        clock.advance(3);

        let reaped = cache.reap_expired(10);
        assert_eq!(reaped.len(), 4);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.metrics().expired_reaped, 4);
    }
}

// ==============================================
// Pool reuse
// ==============================================

mod pool_reuse {
    use super::*;

    #[test]
    fn slot_allocation_is_bounded_by_capacity_plus_one() {
        for policy in [EvictionPolicy::Lru, EvictionPolicy::Fifo] {
            let capacity = 16;
            let cache = started(capacity, policy);

            // capacity-many evictions plus overwrite churn
            for key in 0..200u64 {
                cache.put(key, key);
                cache.put(key, key + 1);
            }

            assert_eq!(cache.len(), capacity);
            assert_eq!(cache.pool_slots(), capacity + 1);
        }
    }
}

// ==============================================
// Duplicate-key overwrite
// ==============================================

mod overwrite {
    use super::*;

    #[test]
    fn overwrite_keeps_size_and_returns_new_value() {
        for policy in [EvictionPolicy::Lru, EvictionPolicy::Fifo] {
            let cache = started(4, policy);
            cache.put(1, 1);
            cache.put(1, 2);
            assert_eq!(cache.len(), 1);
            assert_eq!(cache.get(&1), Some(2));
            let snap = cache.metrics();
            assert_eq!(snap.inserts, 1);
            assert_eq!(snap.updates, 1);
        }
    }

    #[test]
    fn overwrite_moves_the_key_to_the_front_under_both_policies() {
        for policy in [EvictionPolicy::Lru, EvictionPolicy::Fifo] {
            let cache = started(3, policy);
            cache.put(1, 1);
            cache.put(2, 2);
            cache.put(3, 3);
            cache.put(1, 11); // overwrite repositions key 1 at the head
            cache.put(4, 4); // so key 2 is now the tail and gets evicted

            assert_eq!(cache.get(&2), None, "policy {policy:?}");
            assert_eq!(cache.get(&1), Some(11), "policy {policy:?}");
            assert_eq!(cache.get(&3), Some(3), "policy {policy:?}");
            assert_eq!(cache.get(&4), Some(4), "policy {policy:?}");
        }
    }
}

// ==============================================
// Diagnostic dump
// ==============================================

mod dump {
    use super::*;

    #[test]
    fn dump_lists_keys_and_marks_expired_entries() {
        let clock = Clock::manual(500);
        let cache = CacheBuilder::<u64, u64>::new(4)
            .clock(clock.clone())
            .expire_after(Duration::from_secs(2))
            .try_build()
            .expect("config");
        assert!(cache.start());

        cache.put(1, 10);
        clock.advance(5);
        cache.put(2, 20);

        let dump = cache.dump();
        assert!(dump.contains("keys:"));
        assert!(dump.contains("list:"));
        assert!(dump.contains("1=10[drop]"));
        assert!(dump.contains("2=20"));
        assert!(!dump.contains("2=20[drop]"));
    }
}
