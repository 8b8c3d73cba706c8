// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use criterion::{criterion_group, criterion_main, Criterion};
use kv_primitives::CmSketch;
use std::hint::black_box;

fn bench_sketch(c: &mut Criterion) {
    let mut group = c.benchmark_group("CmSketch");
    for counters in [1 << 10, 1 << 16].iter() {
        let mut sketch = CmSketch::with_seed(*counters, 7).unwrap();

        group.bench_function(format!("Increment (C={})", counters), |bencher| {
            let mut h = 0u64;
            bencher.iter(|| {
                h = h.wrapping_add(0x9e37_79b9_7f4a_7c15);
                sketch.increment(black_box(h));
            })
        });

        group.bench_function(format!("Estimate (C={})", counters), |bencher| {
            let mut h = 0u64;
            bencher.iter(|| {
                h = h.wrapping_add(0x9e37_79b9_7f4a_7c15);
                black_box(sketch.estimate(black_box(h)))
            })
        });

        group.bench_function(format!("Reset (C={})", counters), |bencher| {
            bencher.iter(|| sketch.reset())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sketch);
criterion_main!(benches);
