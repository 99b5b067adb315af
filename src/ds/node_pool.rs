//! Preallocated entry storage with a threaded free list.
//!
//! The pool owns every cache entry for its whole lifetime; the hash index and
//! the ordered list only hold [`EntryHandle`]s. A handle is a slot index plus
//! a generation tag: releasing a slot bumps its generation, so a stale handle
//! held across a recycle dereferences to `None` instead of another key's
//! entry.
//!
//! ```text
//!   slots (Vec<Slot>)                       free list (threaded)
//!   ┌─────┬──────────────────────────┐
//!   │  0  │ Occupied { entry }       │      free_head ──► 2 ──► 4 ──► ∅
//!   │  1  │ Occupied { entry }       │
//!   │  2  │ Vacant { next_free: 4 }  │◄─┐
//!   │  3  │ Occupied { entry }       │  │  release(h) pushes h at the
//!   │  4  │ Vacant { next_free: ∅ }  │  │  head; acquire() pops the head.
//!   └─────┴──────────────────────────┘  │
//!                                       └─ O(1) both ways
//! ```
//!
//! Sizing: the engine allocates `capacity + 1` slots at start, so a slot is
//! always free during the window where an old entry is retired and its
//! replacement installed. If the free list is ever empty anyway, `acquire`
//! grows the arena instead of failing and logs the anomaly.

use std::collections::TryReserveError;

/// Stable handle to a pool slot.
///
/// `Copy` and cheap to compare; survives any internal reallocation because it
/// names a slot, not an address. A handle is invalidated by [`NodePool::release`]
/// and will no longer resolve afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle {
    index: u32,
    generation: u32,
}

impl EntryHandle {
    /// Returns the raw slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// A live cache entry: key, value, per-entry counters, and the ordering links
/// used by [`OrderList`](crate::ds::OrderList).
#[derive(Debug)]
pub struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hits: u64,
    pub(crate) expires_at: u64,
    pub(crate) prev: Option<EntryHandle>,
    pub(crate) next: Option<EntryHandle>,
}

impl<K, V> Entry<K, V> {
    /// The cached key.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The cached value.
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Lookups that found this entry since it was installed.
    #[inline]
    pub fn hit_count(&self) -> u64 {
        self.hits
    }

    /// Absolute expiration second; `u64::MAX` when expiration is disabled.
    #[inline]
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }
}

#[derive(Debug)]
enum SlotState<K, V> {
    Vacant { next_free: Option<u32> },
    Occupied(Entry<K, V>),
}

#[derive(Debug)]
struct Slot<K, V> {
    generation: u32,
    state: SlotState<K, V>,
}

/// Arena of entry slots with O(1) acquire/release through a free list
/// threaded across the vacant slots.
#[derive(Debug)]
pub struct NodePool<K, V> {
    slots: Vec<Slot<K, V>>,
    free_head: Option<u32>,
    live: usize,
}

impl<K, V> NodePool<K, V> {
    /// Creates a pool with no storage; every slot arrives via
    /// [`NodePool::try_with_slots`] at engine start.
    pub fn empty() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            live: 0,
        }
    }

    /// Allocates `slot_count` vacant slots up front, free list threaded
    /// through all of them.
    ///
    /// Uses a fallible reservation so an allocation failure surfaces as an
    /// error instead of an abort; the engine maps it to its `Failed` state.
    pub fn try_with_slots(slot_count: usize) -> Result<Self, TryReserveError> {
        let mut slots: Vec<Slot<K, V>> = Vec::new();
        slots.try_reserve_exact(slot_count)?;
        for i in 0..slot_count {
            let next_free = if i + 1 < slot_count {
                Some(i as u32 + 1)
            } else {
                None
            };
            slots.push(Slot {
                generation: 0,
                state: SlotState::Vacant { next_free },
            });
        }
        Ok(Self {
            slots,
            free_head: if slot_count > 0 { Some(0) } else { None },
            live: 0,
        })
    }

    /// Claims a slot and installs a fresh entry in it.
    ///
    /// Pops the free-list head and re-initializes every field (zeroed hit
    /// count, cleared links). Falls back to growing the arena if the free
    /// list is empty, which the `capacity + 1` sizing is meant to prevent.
    pub(crate) fn acquire(&mut self, key: K, value: V, expires_at: u64) -> EntryHandle {
        let index = match self.free_head {
            Some(index) => {
                let next = match &self.slots[index as usize].state {
                    SlotState::Vacant { next_free } => *next_free,
                    SlotState::Occupied(_) => {
                        unreachable!("free list references an occupied slot")
                    }
                };
                self.free_head = next;
                index
            }
            None => {
                tracing::warn!(slots = self.slots.len(), "node pool free list exhausted, growing arena");
                self.slots.push(Slot {
                    generation: 0,
                    state: SlotState::Vacant { next_free: None },
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.state = SlotState::Occupied(Entry {
            key,
            value,
            hits: 0,
            expires_at,
            prev: None,
            next: None,
        });
        self.live += 1;
        EntryHandle {
            index,
            generation: slot.generation,
        }
    }

    /// Returns a slot to the free-list head and hands back the entry's key
    /// and value.
    ///
    /// Bumps the slot generation, so the released handle (and any copy of
    /// it) stops resolving. Returns `None` for a stale or vacant handle.
    pub(crate) fn release(&mut self, handle: EntryHandle) -> Option<(K, V)> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation || !matches!(slot.state, SlotState::Occupied(_)) {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        let state = std::mem::replace(
            &mut slot.state,
            SlotState::Vacant {
                next_free: self.free_head,
            },
        );
        self.free_head = Some(handle.index);
        self.live -= 1;
        match state {
            SlotState::Occupied(entry) => Some((entry.key, entry.value)),
            SlotState::Vacant { .. } => unreachable!(),
        }
    }

    /// Resolves a handle, checking the generation tag.
    #[inline]
    pub fn get(&self, handle: EntryHandle) -> Option<&Entry<K, V>> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        match &slot.state {
            SlotState::Occupied(entry) => Some(entry),
            SlotState::Vacant { .. } => None,
        }
    }

    /// Mutable counterpart of [`NodePool::get`].
    #[inline]
    pub fn get_mut(&mut self, handle: EntryHandle) -> Option<&mut Entry<K, V>> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        match &mut slot.state {
            SlotState::Occupied(entry) => Some(entry),
            SlotState::Vacant { .. } => None,
        }
    }

    /// Returns `true` if `handle` currently resolves to a live entry.
    #[inline]
    pub fn contains(&self, handle: EntryHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live entries.
    #[inline]
    pub fn live_len(&self) -> usize {
        self.live
    }

    /// Total slots ever allocated, live or free.
    ///
    /// Stays at `capacity + 1` under arbitrary churn unless the fallback
    /// growth path ran.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no entries are live.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Drops all slots and entries, returning the pool to its pre-start
    /// shape.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.live = 0;
    }
}
