//! Eviction disciplines.
//!
//! Both policies share the engine's put/get orchestration; the variant only
//! decides what happens at the three points where they differ:
//!
//! | Hook                 | LRU                          | FIFO            |
//! |----------------------|------------------------------|-----------------|
//! | on insert            | link at front                | link at front   |
//! | on successful get    | bump to front, refresh TTL   | nothing         |
//! | eviction victim      | tail (least recently used)   | tail (oldest)   |

use crate::ds::{EntryHandle, NodePool, OrderList};

/// Eviction discipline, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Evict the least recently used entry; `get` refreshes recency.
    Lru,
    /// Evict the oldest inserted entry; `get` never reorders.
    Fifo,
}

impl EvictionPolicy {
    /// Links a newly inserted entry. Front of the list under both
    /// disciplines.
    #[inline]
    pub(crate) fn on_insert<K, V>(
        self,
        list: &mut OrderList,
        pool: &mut NodePool<K, V>,
        handle: EntryHandle,
    ) {
        list.push_front(pool, handle);
    }

    /// Reorders after a live hit. Only LRU tracks recency.
    #[inline]
    pub(crate) fn on_access<K, V>(
        self,
        list: &mut OrderList,
        pool: &mut NodePool<K, V>,
        handle: EntryHandle,
    ) {
        if self == EvictionPolicy::Lru {
            list.bump_to_front(pool, handle);
        }
    }

    /// Whether a live hit pushes the entry's expiration deadline out.
    #[inline]
    pub(crate) fn refreshes_deadline_on_access(self) -> bool {
        matches!(self, EvictionPolicy::Lru)
    }

    /// Picks the entry to retire when the cache is over capacity.
    #[inline]
    pub(crate) fn eviction_victim(self, list: &OrderList) -> Option<EntryHandle> {
        list.tail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_lru_reorders_on_access() {
        let mut pool: NodePool<u32, u32> = NodePool::try_with_slots(3).expect("alloc");
        let mut list = OrderList::new();
        let a = pool.acquire(1, 1, 0);
        let b = pool.acquire(2, 2, 0);
        EvictionPolicy::Fifo.on_insert(&mut list, &mut pool, a);
        EvictionPolicy::Fifo.on_insert(&mut list, &mut pool, b);

        EvictionPolicy::Fifo.on_access(&mut list, &mut pool, a);
        assert_eq!(list.head(), Some(b));

        EvictionPolicy::Lru.on_access(&mut list, &mut pool, a);
        assert_eq!(list.head(), Some(a));
    }

    #[test]
    fn victim_is_the_tail_for_both() {
        let mut pool: NodePool<u32, u32> = NodePool::try_with_slots(3).expect("alloc");
        let mut list = OrderList::new();
        let a = pool.acquire(1, 1, 0);
        let b = pool.acquire(2, 2, 0);
        list.push_front(&mut pool, a);
        list.push_front(&mut pool, b);

        assert_eq!(EvictionPolicy::Lru.eviction_victim(&list), Some(a));
        assert_eq!(EvictionPolicy::Fifo.eviction_victim(&list), Some(a));
    }

    #[test]
    fn deadline_refresh_is_lru_only() {
        assert!(EvictionPolicy::Lru.refreshes_deadline_on_access());
        assert!(!EvictionPolicy::Fifo.refreshes_deadline_on_access());
    }
}
