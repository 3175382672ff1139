//! Kurir - In-Memory Chat Message Bus
//!
//! PoC binary: micro-benchmark komponen inti.
//! - MessageRing: append + scan latency
//! - AddressRouter: parsing throughput
//! - MessageBus: write→read end-to-end di bawah lock

use std::time::Instant;

use kurir::core::{ConsumerCursor, MessageRing};
use kurir::protocol::address;
use kurir::{ChatBus, ChatRecord, Target, WritePolicy};

fn main() {
    println!("🚀 Kurir Chat Bus - PoC v0.1");
    println!("============================\n");

    benchmark_ring();
    benchmark_router();
    benchmark_bus();

    println!("\n✅ All benchmarks complete!");
    println!("\nTo start server: cargo run --release --bin kurir_server");
}

fn benchmark_ring() {
    println!("📊 Message Ring Benchmark (append + scan)");
    println!("-----------------------------------------");

    const ITERATIONS: usize = 1_000_000;
    let mut ring: MessageRing<65536> = MessageRing::new();
    let record = ChatRecord::new(1, Target::Broadcast, b"benchmark message payload");

    // Warm up
    for _ in 0..1000 {
        ring.append(record, 0, WritePolicy::Overwrite).ok();
    }

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        ring.append(record, 0, WritePolicy::Overwrite).ok();
    }
    let append_duration = start.elapsed();

    let mut cursor = ConsumerCursor {
        pid: 2,
        head: ring.tail() - 65536,
    };
    let start = Instant::now();
    let mut delivered = 0usize;
    while ring.pending_for(cursor.head) > 0 {
        if ring.scan_for(&mut cursor).is_some() {
            delivered += 1;
        }
    }
    let scan_duration = start.elapsed();

    let append_ns = append_duration.as_nanos() as f64 / ITERATIONS as f64;
    let scan_ns = scan_duration.as_nanos() as f64 / delivered.max(1) as f64;

    println!("  Operations: {}", ITERATIONS);
    println!("  Append latency: {:.2} ns/op", append_ns);
    println!("  Scan latency:   {:.2} ns/op ({} delivered)", scan_ns, delivered);
    println!(
        "  Append throughput: {:.2} M ops/sec\n",
        ITERATIONS as f64 / append_duration.as_secs_f64() / 1_000_000.0
    );
}

fn benchmark_router() {
    println!("📊 Address Router Benchmark (payload parsing)");
    println!("---------------------------------------------");

    const ITERATIONS: usize = 1_000_000;

    let broadcast = b"everyone: meeting at three".as_slice();
    let private = b"@4281 the usual place".as_slice();

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        address::parse(std::hint::black_box(broadcast)).ok();
    }
    let broadcast_duration = start.elapsed();

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        address::parse(std::hint::black_box(private)).ok();
    }
    let private_duration = start.elapsed();

    println!("  Operations: {} per case", ITERATIONS);
    println!(
        "  Broadcast parse: {:.2} ns/op",
        broadcast_duration.as_nanos() as f64 / ITERATIONS as f64
    );
    println!(
        "  Private parse:   {:.2} ns/op\n",
        private_duration.as_nanos() as f64 / ITERATIONS as f64
    );
}

fn benchmark_bus() {
    println!("📊 Message Bus Benchmark (write→read end-to-end)");
    println!("------------------------------------------------");

    const ITERATIONS: usize = 100_000;

    let bus = ChatBus::new();
    bus.register(1).expect("register writer");
    bus.register(2).expect("register reader");

    let mut buf = [0u8; 256];

    // Warm up
    for _ in 0..1000 {
        bus.write(1, b"warm up").unwrap();
        bus.read(2, &mut buf).unwrap();
    }
    while bus.read(2, &mut buf).unwrap().is_some() {}

    let start = Instant::now();
    for _ in 0..ITERATIONS {
        bus.write(1, b"@2 direct message").unwrap();
        bus.read(2, &mut buf).unwrap();
    }
    let duration = start.elapsed();

    let cycle_ns = duration.as_nanos() as f64 / ITERATIONS as f64;

    println!("  Operations: {}", ITERATIONS);
    println!("  Write+read cycle: {:.2} ns/op", cycle_ns);
    println!(
        "  Throughput: {:.2} M msgs/sec",
        ITERATIONS as f64 / duration.as_secs_f64() / 1_000_000.0
    );
}
