//! Bounded queue throughput and latency benchmark.
//!
//! Usage:
//!     cargo run --release --bin queue_bench
//!
//! Environment variables:
//!     PRODUCER_CPU=0        Pin producer to CPU 0 (default: 0)
//!     CONSUMER_CPU=2        Pin consumer to CPU 2 (default: 2)
//!     QUEUE_CAPACITY=1024   Queue capacity (default: 1024)
//!     ITERATIONS=1000000    Messages per run (default: 1 << 20)

use std::env;
use std::str::FromStr;
use std::sync::Barrier;
use std::thread;

use minstant::Instant;

use sluice::{BoundedQueue, PopError};

type Payload = u64;

struct BenchConfig {
    producer_cpu: Option<usize>,
    consumer_cpu: Option<usize>,
    capacity: usize,
    iterations: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl BenchConfig {
    fn from_env() -> Self {
        Self {
            producer_cpu: Some(env_or("PRODUCER_CPU", 0)),
            consumer_cpu: Some(env_or("CONSUMER_CPU", 2)),
            capacity: env_or("QUEUE_CAPACITY", 1024),
            iterations: env_or("ITERATIONS", 1 << 20),
        }
    }
}

fn pin_to_cpu(cpu: Option<usize>) {
    if let Some(id) = cpu {
        core_affinity::set_for_current(core_affinity::CoreId { id });
    }
}

fn bench_throughput(config: &BenchConfig) {
    let queue = BoundedQueue::<Payload>::with_label(config.capacity, "throughput").unwrap();
    let ready = Barrier::new(2);

    let elapsed = thread::scope(|s| {
        let consumer = s.spawn(|| {
            pin_to_cpu(config.consumer_cpu);
            ready.wait();

            let mut expected = 0;
            loop {
                match queue.wait_pop() {
                    Ok(value) => {
                        assert_eq!(value, expected, "data corruption");
                        expected += 1;
                    }
                    Err(PopError::Closed) => break,
                    Err(other) => panic!("unexpected pop status: {other}"),
                }
            }
            expected
        });

        pin_to_cpu(config.producer_cpu);
        ready.wait();

        let start = Instant::now();
        for i in 0..config.iterations {
            queue.push(i).unwrap();
        }
        queue.close();

        let received = consumer.join().unwrap();
        assert_eq!(received, config.iterations);
        start.elapsed()
    });

    let ops_per_ms = u128::from(config.iterations) * 1_000_000 / elapsed.as_nanos().max(1);
    println!("{ops_per_ms} ops/ms");
}

fn bench_rtt(config: &BenchConfig) {
    let requests = BoundedQueue::<Payload>::with_label(config.capacity, "rtt-request").unwrap();
    let replies = BoundedQueue::<Payload>::with_label(config.capacity, "rtt-reply").unwrap();
    let ready = Barrier::new(2);

    let elapsed = thread::scope(|s| {
        s.spawn(|| {
            pin_to_cpu(config.consumer_cpu);
            ready.wait();

            while let Ok(value) = requests.wait_pop() {
                replies.push(value).unwrap();
            }
            replies.close();
        });

        pin_to_cpu(config.producer_cpu);
        ready.wait();

        let start = Instant::now();
        for i in 0..config.iterations {
            requests.push(i).unwrap();
            assert_eq!(replies.value_pop().unwrap(), i);
        }
        let elapsed = start.elapsed();

        requests.close();
        elapsed
    });

    let rtt_ns = elapsed.as_nanos() / u128::from(config.iterations.max(1));
    println!("{rtt_ns} ns RTT");
}

fn main() {
    sluice::init_tracing();
    let config = BenchConfig::from_env();

    println!(
        "sluice BoundedQueue (capacity={}, iters={}):",
        config.capacity, config.iterations
    );
    bench_throughput(&config);
    bench_rtt(&config);
}
