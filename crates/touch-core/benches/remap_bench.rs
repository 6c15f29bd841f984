//! Criterion benchmarks for the coordinate transform hot path.
//!
//! `remap` and `flip_frame` run inside the interception callback for every
//! touch event, which must finish within low single-digit milliseconds or the
//! host disables the tap.  These benches keep an eye on that budget.
//!
//! Run with:
//! ```bash
//! cargo bench --package touch-core --bench remap_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use touch_core::{flip_frame, remap, to_window_local, Frame, Point};

fn primary() -> Frame {
    Frame::new(0.0, 0.0, 1920.0, 1080.0)
}

fn touch_display() -> Frame {
    Frame::new(1920.0, 0.0, 2560.0, 720.0)
}

fn bench_remap(c: &mut Criterion) {
    let mut group = c.benchmark_group("remap");
    let cases = [
        ("center", Point::new(960.0, 540.0)),
        ("corner", Point::new(0.0, 0.0)),
        ("rejected", Point::new(2000.0, 540.0)),
    ];
    for (name, point) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &point, |b, p| {
            b.iter(|| remap(black_box(*p), black_box(primary()), black_box(touch_display())))
        });
    }
    group.finish();
}

fn bench_frame_conversion(c: &mut Criterion) {
    c.bench_function("flip_frame", |b| {
        b.iter(|| flip_frame(black_box(touch_display()), black_box(1080.0)))
    });
    c.bench_function("to_window_local", |b| {
        b.iter(|| {
            to_window_local(
                black_box(Point::new(3200.0, 360.0)),
                black_box(touch_display()),
                black_box(1080.0),
            )
        })
    });
}

criterion_group!(benches, bench_remap, bench_frame_conversion);
criterion_main!(benches);
