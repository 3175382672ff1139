//! Criterion benchmark untuk ring dan address router
//!
//! Run dengan: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use kurir::core::{ConsumerCursor, MessageRing};
use kurir::protocol::address;
use kurir::{ChatRecord, Target, WritePolicy};

fn bench_ring(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_ring");
    group.throughput(Throughput::Elements(1));

    group.bench_function("append_overwrite", |b| {
        let mut ring: MessageRing<65536> = MessageRing::new();
        let record = ChatRecord::new(1, Target::Broadcast, b"bench payload");
        b.iter(|| {
            ring.append(black_box(record), 0, WritePolicy::Overwrite).ok();
        });
    });

    group.bench_function("scan_delivered", |b| {
        let mut ring: MessageRing<65536> = MessageRing::new();
        let record = ChatRecord::new(1, Target::Broadcast, b"bench payload");
        for _ in 0..65536 {
            ring.append(record, 0, WritePolicy::Overwrite).ok();
        }
        let mut cursor = ConsumerCursor { pid: 2, head: 0 };
        b.iter(|| {
            if ring.pending_for(cursor.head) == 0 {
                cursor.head = ring.tail() - 65536;
            }
            black_box(ring.scan_for(&mut cursor));
        });
    });

    group.finish();
}

fn bench_router(c: &mut Criterion) {
    let mut group = c.benchmark_group("address_router");
    group.throughput(Throughput::Elements(1));

    group.bench_function("parse_broadcast", |b| {
        b.iter(|| address::parse(black_box(b"everyone: meeting at three")));
    });

    group.bench_function("parse_private", |b| {
        b.iter(|| address::parse(black_box(b"@4281 the usual place")));
    });

    group.finish();
}

criterion_group!(benches, bench_ring, bench_router);
criterion_main!(benches);
