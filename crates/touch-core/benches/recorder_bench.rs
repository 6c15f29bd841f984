//! Criterion benchmarks for [`DiagnosticsRecorder`] append and read paths.
//!
//! Appends happen on the interception context, so the lock hold time of
//! `record` matters more than anything on the read side.
//!
//! Run with:
//! ```bash
//! cargo bench --package touch-core --bench recorder_bench
//! ```

use std::time::Instant;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use touch_core::{
    diagnostics::THROUGHPUT_WINDOW, DeliveryStatus, DiagnosticsEntry, DiagnosticsRecorder,
    EventKind, Point,
};

fn sample_entry(sequence_id: u64) -> DiagnosticsEntry {
    DiagnosticsEntry {
        recorded_at: Instant::now(),
        sequence_id,
        device_identity: 4_294_968_875,
        kind: EventKind::Drag,
        original_point: Point::new(960.0, 540.0),
        remapped_point: Some(Point::new(3200.0, 360.0)),
        delivery_status: DeliveryStatus::Delivered,
        latency_ms: Some(0.4),
    }
}

/// Appending to a full buffer exercises the evict-then-push path.
fn bench_record_full_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_full_buffer");
    for capacity in [64usize, 500, 5000] {
        let rec = DiagnosticsRecorder::new(capacity);
        for id in 0..capacity as u64 {
            rec.record(sample_entry(id));
        }
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &rec, |b, rec| {
            let mut id = 0u64;
            b.iter(|| {
                id += 1;
                rec.record(black_box(sample_entry(id)));
            })
        });
    }
    group.finish();
}

fn bench_statistics(c: &mut Criterion) {
    let rec = DiagnosticsRecorder::new(500);
    for id in 0..500 {
        rec.record(sample_entry(id));
    }
    c.bench_function("statistics_500", |b| {
        b.iter(|| rec.statistics_at(black_box(Instant::now()), THROUGHPUT_WINDOW))
    });
    c.bench_function("recent_50_of_500", |b| b.iter(|| rec.recent(black_box(50))));
}

criterion_group!(benches, bench_record_full_buffer, bench_statistics);
criterion_main!(benches);
