//! Integration tests for the reference pool under concurrent use.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use kiln_core::{IdStruct, CoreContext, Poolable, Pooled, ReferencePool};

#[derive(Default)]
struct Packet {
    payload: Vec<u8>,
}

impl Poolable for Packet {
    fn clear(&mut self) {
        self.payload.clear();
    }
}

#[test]
fn test_no_two_live_references_to_one_slot() {
    let pool = ReferencePool::new(true);
    let mut live: Vec<Pooled<Packet>> = Vec::new();

    for round in 0..50 {
        for _ in 0..8 {
            live.push(pool.acquire::<Packet>());
        }
        for (i, a) in live.iter().enumerate() {
            for b in &live[i + 1..] {
                assert!(!Pooled::ptr_eq(a, b), "round {round}: slot handed out twice");
            }
        }
        // Release every other one so the free list is always partly full
        let mut keep = Vec::new();
        for (i, packet) in live.drain(..).enumerate() {
            if i % 2 == 0 {
                pool.release(packet).unwrap();
            } else {
                keep.push(packet);
            }
        }
        live = keep;
    }
}

#[test]
fn test_concurrent_acquire_release() {
    let pool = Arc::new(ReferencePool::new(true));
    pool.add::<Packet>(64);
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..500_u32 {
                    let packet = pool.acquire::<Packet>();
                    packet.write().payload.push((t + i) as u8);
                    pool.release(packet).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let info = pool.info::<Packet>().unwrap();
    assert_eq!(info.acquired, 4000);
    assert_eq!(info.released, 4000);
    assert_eq!(info.using, 0);
    assert_eq!(info.unused, info.added);
}

#[test]
fn test_released_objects_are_cleared() {
    let pool = ReferencePool::default();
    let packet = pool.acquire::<Packet>();
    packet.write().payload.extend_from_slice(b"hello");
    pool.release(packet).unwrap();

    assert!(pool.acquire::<Packet>().read().payload.is_empty());
}

#[test]
fn test_context_ids_unpack_to_configured_process() {
    let ctx = CoreContext::default();
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let id = ctx.ids().generate_id();
        assert!(seen.insert(id));
        assert_eq!(IdStruct::from_long(id).process, ctx.config().process_tag);
    }
}
