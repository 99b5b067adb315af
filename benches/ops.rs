//! Micro-operation benchmarks for the cache engine.
//!
//! Run with: `cargo bench --bench ops`
//!
//! Measures per-operation latency for get and put across both eviction
//! policies under identical conditions.

use std::hint::black_box;
use std::time::Instant;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use slotcache::clock::Clock;
use slotcache::engine::CacheCore;
use slotcache::policy::EvictionPolicy;

const CAPACITY: usize = 16_384;
const OPS: u64 = 100_000;

fn warm_core(policy: EvictionPolicy) -> CacheCore<u64, u64> {
    let mut core =
        CacheCore::try_new_with_clock(CAPACITY, policy, Clock::manual(0)).expect("config");
    assert!(core.start());
    for i in 0..CAPACITY as u64 {
        core.put(i, i);
    }
    core
}

// ============================================================================
// Get Hit Latency (ns/op)
// ============================================================================

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hit_ns");
    group.throughput(Throughput::Elements(OPS));

    for (name, policy) in [("lru", EvictionPolicy::Lru), ("fifo", EvictionPolicy::Fifo)] {
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let mut core = warm_core(policy);
                let start = Instant::now();
                for _ in 0..iters {
                    for i in 0..OPS {
                        let key = i % (CAPACITY as u64);
                        black_box(core.get(&key));
                    }
                }
                start.elapsed()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Insert With Eviction Latency (ns/op)
// ============================================================================

fn bench_put_evicting(c: &mut Criterion) {
    let mut group = c.benchmark_group("put_evict_ns");
    group.throughput(Throughput::Elements(OPS));

    for (name, policy) in [("lru", EvictionPolicy::Lru), ("fifo", EvictionPolicy::Fifo)] {
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let mut core = warm_core(policy);
                let mut next_key = CAPACITY as u64;
                let start = Instant::now();
                for _ in 0..iters {
                    for _ in 0..OPS {
                        core.put(next_key, next_key);
                        next_key += 1;
                    }
                }
                start.elapsed()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Overwrite Latency (ns/op)
// ============================================================================

fn bench_put_overwrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("put_overwrite_ns");
    group.throughput(Throughput::Elements(OPS));

    for (name, policy) in [("lru", EvictionPolicy::Lru), ("fifo", EvictionPolicy::Fifo)] {
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let mut core = warm_core(policy);
                let start = Instant::now();
                for _ in 0..iters {
                    for i in 0..OPS {
                        let key = i % (CAPACITY as u64);
                        core.put(key, i);
                    }
                }
                start.elapsed()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_get_hit, bench_put_evicting, bench_put_overwrite);
criterion_main!(benches);
