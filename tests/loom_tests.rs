//! Loom-based exhaustive interleaving tests for the release-frontier /
//! overrun-check protocol.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! The real protocol lives in shared memory reached through raw pointers, which
//! loom cannot instrument. This models just the two atomics and the frame-length
//! bookkeeping over a heap buffer, in isolation, the same way this corpus already
//! isolates its own SPSC synchronization protocol for loom.

#![cfg(feature = "loom")]

use loom::sync::atomic::{AtomicU64, Ordering};
use loom::sync::Arc;
use loom::thread;
use std::cell::UnsafeCell;

const N: u32 = 4; // 16-byte ring, small enough for loom's state space
const BYTES: u64 = 1 << N;
const MASK: u64 = BYTES - 1;
const PREFIX: u64 = 1; // one-byte length prefix for this model

fn offset(i: u64) -> u64 {
    i & MASK
}

fn distance_to_wrap(i: u64) -> u64 {
    BYTES - offset(i)
}

/// A minimal model of the shared segment: two atomics plus a byte ring, reached
/// through raw pointers the way the real header/ring pair is.
struct LoomQueue {
    write_index: AtomicU64,
    read_index: AtomicU64,
    ring: UnsafeCell<[u8; BYTES as usize]>,
}

unsafe impl Send for LoomQueue {}
unsafe impl Sync for LoomQueue {}

impl LoomQueue {
    fn new() -> Self {
        Self {
            write_index: AtomicU64::new(PREFIX),
            read_index: AtomicU64::new(0),
            ring: UnsafeCell::new([0; BYTES as usize]),
        }
    }
}

/// One producer call: frame a single 1-byte message, publish it via the shared
/// read index (the release frontier), and grow the write index enough to cover
/// the next frame's prefix slot, wrapping with a skip marker if needed.
fn produce_one(q: &LoomQueue, allocated_index: &mut u64, value: u8) {
    let need = 1 + PREFIX;
    let cached_write_index = q.write_index.load(Ordering::Relaxed);

    if cached_write_index - *allocated_index < need {
        let mut new_cached = cached_write_index + 4 + PREFIX;
        let off_allocated = offset(*allocated_index - PREFIX);
        let off_next = offset(*allocated_index + need);
        if off_next < off_allocated {
            unsafe {
                (*q.ring.get())[off_allocated as usize] = 0;
            }
            let wrap = distance_to_wrap(*allocated_index) + PREFIX;
            *allocated_index += wrap;
            new_cached += wrap;
        }
        q.write_index.store(new_cached, Ordering::Release);
    }

    let off = offset(*allocated_index) as usize;
    unsafe {
        (*q.ring.get())[off - PREFIX as usize] = 1; // size prefix: one byte follows
        (*q.ring.get())[off] = value;
    }
    *allocated_index += need;

    q.read_index.store(*allocated_index - PREFIX, Ordering::Release);
}

/// One consumer call: returns `Some(byte)` if a message is available, `None`
/// otherwise. Mirrors `Consumer::read`'s refresh-once-then-retry shape.
fn consume_one(q: &LoomQueue, read_index: &mut u64, cached_read_index: &mut u64) -> Option<u8> {
    if *read_index >= *cached_read_index {
        *cached_read_index = q.read_index.load(Ordering::Acquire);
        if *read_index >= *cached_read_index {
            return None;
        }
    }

    let mut off = offset(*read_index) as usize;
    let mut prefix = unsafe { (*q.ring.get())[off] };
    if prefix == 0 {
        *read_index += distance_to_wrap(*read_index);
        off = 0;
        prefix = unsafe { (*q.ring.get())[off] };
    }
    debug_assert_eq!(prefix, 1);
    let value = unsafe { (*q.ring.get())[off + 1] };
    *read_index += 1 + PREFIX;
    Some(value)
}

#[test]
fn single_message_is_observed_exactly_once() {
    loom::model(|| {
        let q = Arc::new(LoomQueue::new());

        let producer_q = Arc::clone(&q);
        let producer = thread::spawn(move || {
            let mut allocated_index = PREFIX;
            produce_one(&producer_q, &mut allocated_index, 42);
        });

        let mut read_index = 0u64;
        let mut cached_read_index = 0u64;
        let mut seen = None;
        for _ in 0..1000 {
            if let Some(v) = consume_one(&q, &mut read_index, &mut cached_read_index) {
                seen = Some(v);
                break;
            }
        }

        producer.join().unwrap();

        if seen.is_none() {
            seen = consume_one(&q, &mut read_index, &mut cached_read_index);
        }

        assert_eq!(seen, Some(42));
        assert_eq!(consume_one(&q, &mut read_index, &mut cached_read_index), None);
    });
}

#[test]
fn release_acquire_orders_payload_before_index() {
    // The payload byte written before the release-store must be visible once the
    // consumer's acquire-load observes the corresponding read index, regardless
    // of interleaving.
    loom::model(|| {
        let q = Arc::new(LoomQueue::new());

        let producer_q = Arc::clone(&q);
        let producer = thread::spawn(move || {
            let mut allocated_index = PREFIX;
            produce_one(&producer_q, &mut allocated_index, 7);
        });

        producer.join().unwrap();

        let mut read_index = 0u64;
        let mut cached_read_index = 0u64;
        assert_eq!(consume_one(&q, &mut read_index, &mut cached_read_index), Some(7));
    });
}
