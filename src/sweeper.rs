//! Background expiration sweeper.
//!
//! Spawned only when an expiration callback is configured. Wakes once per
//! second; while the engine is `Running` it reclaims a bounded batch of
//! expired entries under the engine lock, then invokes the user callback
//! with the batch after the lock has been released, so user code never
//! extends the cache's critical section.
//!
//! The thread holds only a weak reference to the engine and polls its status
//! each tick: it exits when the engine reports `Stopped` or the cache has
//! been dropped.

use std::hash::Hash;
use std::sync::Weak;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::engine::{CacheCore, ExpireCallback, RunStatus};

pub(crate) fn spawn<K, V>(
    core: Weak<Mutex<CacheCore<K, V>>>,
    callback: ExpireCallback<K, V>,
    batch_size: usize,
) where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name("slotcache-sweeper".into())
        .spawn(move || {
            tracing::debug!(batch_size, "expiration sweeper started");
            loop {
                thread::sleep(Duration::from_secs(1));
                let Some(core) = core.upgrade() else { break };
                let batch = {
                    let mut core = core.lock();
                    match core.status() {
                        RunStatus::Stopped => break,
                        RunStatus::Running => core.reap_expired(batch_size),
                        // Created/Initializing/Failed: nothing to do yet
                        _ => continue,
                    }
                };
                if !batch.is_empty() {
                    tracing::debug!(reaped = batch.len(), "expired entries reclaimed");
                    callback(&batch);
                }
            }
            tracing::debug!("expiration sweeper exiting");
        });
    if let Err(err) = spawned {
        tracing::error!(error = %err, "failed to spawn expiration sweeper");
    }
}
