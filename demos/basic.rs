//! A producer thread and a consumer thread sharing one real POSIX
//! shared-memory segment, demonstrating the full host/attach/allocate/flush/read
//! cycle in a single process.

use arq_spsc::{Consumer, Host, Producer, ProducerConfig, U32Prefix};
use std::thread;
use std::time::Instant;

const N: u8 = 18; // 256 KiB ring
const MESSAGES: u64 = 2_000_000;
const MESSAGE_SIZE: usize = 24;

fn main() {
    let name = format!("basic_demo_{}", std::process::id());
    let _host = Host::<N, U32Prefix>::create(&name).expect("create host segment");

    let producer_name = name.clone();
    let producer_handle = thread::spawn(move || {
        let mut producer = Producer::<N, U32Prefix>::attach(&producer_name, ProducerConfig::new(16384, false))
            .expect("attach producer");
        let payload = vec![0xCDu8; MESSAGE_SIZE];
        for _ in 0..MESSAGES {
            producer.allocate_write(MESSAGE_SIZE).copy_from_slice(&payload);
            producer.flush();
        }
    });

    let mut consumer = Consumer::<N, U32Prefix>::attach(&name).expect("attach consumer");
    let start = Instant::now();
    let mut received = 0u64;
    while received < MESSAGES {
        match consumer.read().expect("consumer overrun") {
            Some(_msg) => received += 1,
            None => thread::yield_now(),
        }
    }
    let elapsed = start.elapsed();

    producer_handle.join().unwrap();

    println!(
        "received {received} messages of {MESSAGE_SIZE} bytes in {elapsed:?} ({:.1} msg/s)",
        received as f64 / elapsed.as_secs_f64()
    );
}
