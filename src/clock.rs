//! Second-resolution clock source for expiration decisions.
//!
//! The cache only needs wall-clock time at one-second granularity, so instead
//! of calling into the OS on every operation, [`Clock::system`] hands out a
//! shared atomic cell that a single process-wide thread refreshes once per
//! second. Readers do a relaxed load; the worst case is a one-second skew in
//! an expiration decision, never corruption, because the cell is a plain
//! scalar.
//!
//! [`Clock::manual`] creates an independent cell that tests drive explicitly
//! with [`Clock::advance`] / [`Clock::set`].
//!
//! ## Example
//!
//! ```
//! use slotcache::clock::Clock;
//!
//! let clock = Clock::manual(1_000);
//! assert_eq!(clock.now_secs(), 1_000);
//! clock.advance(5);
//! assert_eq!(clock.now_secs(), 1_005);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Shared cell refreshed by the process-wide ticker thread.
///
/// Started lazily on the first `Clock::system()` call and runs for the life
/// of the process; every system clock handle reads the same cell.
static SHARED_TICK: Lazy<Arc<AtomicU64>> = Lazy::new(|| {
    let cell = Arc::new(AtomicU64::new(unix_seconds()));
    let tick = Arc::clone(&cell);
    thread::Builder::new()
        .name("slotcache-clock".into())
        .spawn(move || loop {
            tick.store(unix_seconds(), Ordering::Relaxed);
            thread::sleep(Duration::from_secs(1));
        })
        .expect("failed to spawn slotcache clock thread");
    cell
});

/// Handle to a second-resolution time source.
///
/// Cloning a `Clock` yields another handle to the same underlying cell, so a
/// cache engine and its sweeper always agree on the current second.
#[derive(Debug, Clone)]
pub struct Clock {
    cell: Arc<AtomicU64>,
}

impl Clock {
    /// Returns a handle to the process-wide ticking clock.
    ///
    /// The first call starts the background ticker thread; subsequent calls
    /// share it.
    pub fn system() -> Self {
        Self {
            cell: Arc::clone(&SHARED_TICK),
        }
    }

    /// Creates an independent clock fixed at `start_secs` until advanced.
    ///
    /// Intended for tests that need deterministic expiration.
    pub fn manual(start_secs: u64) -> Self {
        Self {
            cell: Arc::new(AtomicU64::new(start_secs)),
        }
    }

    /// Current time in whole seconds since the Unix epoch.
    #[inline]
    pub fn now_secs(&self) -> u64 {
        self.cell.load(Ordering::Relaxed)
    }

    /// Moves a manual clock forward by `secs`.
    ///
    /// On a system clock the ticker overwrites this within a second; only
    /// meaningful on clocks created with [`Clock::manual`].
    pub fn advance(&self, secs: u64) {
        self.cell.fetch_add(secs, Ordering::Relaxed);
    }

    /// Sets a manual clock to an absolute second value.
    pub fn set(&self, secs: u64) {
        self.cell.store(secs, Ordering::Relaxed);
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_explicitly() {
        let clock = Clock::manual(100);
        assert_eq!(clock.now_secs(), 100);
        clock.advance(3);
        assert_eq!(clock.now_secs(), 103);
        clock.set(50);
        assert_eq!(clock.now_secs(), 50);
    }

    #[test]
    fn cloned_handles_share_the_cell() {
        let clock = Clock::manual(7);
        let other = clock.clone();
        clock.advance(1);
        assert_eq!(other.now_secs(), 8);
    }

    #[test]
    fn system_clock_reads_a_plausible_time() {
        let clock = Clock::system();
        // The ticker seeds the cell before the first read returns.
        assert!(clock.now_secs() > 0);
    }
}
