//! # Reference Pool Benchmark
//!
//! Acquire/release throughput, warm and cold, with and without strict check.

#![allow(missing_docs)]
#![allow(dead_code)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kiln_core::{Poolable, ReferencePool};

#[derive(Default)]
struct Bullet {
    position: [f32; 3],
    velocity: [f32; 3],
    ttl: u32,
}

impl Poolable for Bullet {
    fn clear(&mut self) {
        self.position = [0.0; 3];
        self.velocity = [0.0; 3];
        self.ttl = 0;
    }
}

fn bench_warm_cycle(c: &mut Criterion) {
    let pool = ReferencePool::new(false);
    pool.add::<Bullet>(1024);

    c.bench_function("pool_acquire_release_warm", |b| {
        b.iter(|| {
            let bullet = pool.acquire::<Bullet>();
            bullet.write().ttl = 60;
            black_box(pool.release(bullet))
        });
    });
}

fn bench_strict_cycle(c: &mut Criterion) {
    let pool = ReferencePool::new(true);
    pool.add::<Bullet>(1024);

    c.bench_function("pool_acquire_release_strict_1k_free", |b| {
        b.iter(|| {
            let bullet = pool.acquire::<Bullet>();
            black_box(pool.release(bullet))
        });
    });
}

fn bench_batch(c: &mut Criterion) {
    let pool = ReferencePool::new(false);

    c.bench_function("pool_batch_10k", |b| {
        b.iter(|| {
            let batch: Vec<_> = (0..10_000).map(|_| pool.acquire::<Bullet>()).collect();
            for bullet in batch {
                let _ = pool.release(bullet);
            }
            black_box(pool.info::<Bullet>())
        });
    });
}

criterion_group!(benches, bench_warm_cycle, bench_strict_cycle, bench_batch);
criterion_main!(benches);
